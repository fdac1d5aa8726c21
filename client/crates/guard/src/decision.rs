//! Guard Decisions
//!
//! What a route guard tells the shell to do. Guards never navigate or render
//! themselves; they return one of these and the shell carries it out.

use auth::models::Role;

/// Outcome of evaluating a guard against the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected content
    Allow,
    /// Keep the content hidden and do what the denial says
    Deny(Denial),
}

impl GuardDecision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// How to handle a denied access
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Silent redirect to the login entry point (unauthenticated access)
    RedirectToLogin,
    /// Silent redirect to a configured fallback (wrong role on a
    /// redirect-only route)
    Redirect(String),
    /// Stay on the page and show an explanation instead
    Notice(AccessNotice),
}

/// In-page explanation for a denied access
///
/// The only guard surface that distinguishes "not logged in" from
/// "logged in with the wrong role" in its user-facing copy; collapsing the
/// two into one redirect is a UX regression, not a simplification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessNotice {
    /// Not logged in at all; offer a way to sign in
    LoginRequired,
    /// Logged in, but the account lacks the required role
    RoleRequired { required: Role },
}

impl AccessNotice {
    pub fn title(&self) -> &'static str {
        match self {
            AccessNotice::LoginRequired => "Sign in required",
            AccessNotice::RoleRequired { .. } => "No access to this page",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AccessNotice::LoginRequired => {
                "You need to sign in to view this page. Please sign in and try again.".to_string()
            }
            AccessNotice::RoleRequired { required } => {
                format!("This page requires a {required} account. Your account does not have access.")
            }
        }
    }

    /// Whether the notice should offer a sign-in call to action
    pub const fn offers_login(&self) -> bool {
        matches!(self, AccessNotice::LoginRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_copy_distinguishes_cases() {
        let login = AccessNotice::LoginRequired;
        assert!(login.offers_login());
        assert!(login.message().contains("sign in"));

        let role = AccessNotice::RoleRequired {
            required: Role::User,
        };
        assert!(!role.offers_login());
        assert!(role.message().contains("user account"));
    }
}

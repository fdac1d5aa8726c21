//! Route Guard
//!
//! One parameterized guard instead of three near-duplicates, so the
//! fail-closed rules cannot drift apart between admin, seller and user
//! routes. The required role and the notice-vs-redirect policy are
//! configuration; the evaluation logic is shared.

use auth::models::{Role, Session};
use auth::{AuthGateway, SessionService};
use platform::storage::CredentialStore;

use crate::decision::{AccessNotice, Denial, GuardDecision};

/// Role-based route guard
#[derive(Debug, Clone)]
pub struct RouteGuard {
    required_role: Option<Role>,
    require_login: bool,
    show_notice: bool,
    fallback_path: String,
}

impl RouteGuard {
    /// Guard for admin-only routes
    ///
    /// Unauthenticated users go to login; authenticated users with any
    /// other role go to the fallback path (default: home).
    pub fn admin() -> Self {
        Self::role(Role::Admin)
    }

    /// Guard requiring one specific role, for seller sections and similar
    pub fn role(required: Role) -> Self {
        Self {
            required_role: Some(required),
            require_login: true,
            show_notice: false,
            fallback_path: "/".to_string(),
        }
    }

    /// Guard for user routes with independent login/role requirements
    ///
    /// `show_notice` chooses a friendly in-page explanation over a hard
    /// redirect when access is denied.
    pub fn user_access(require_login: bool, require_user_role: bool, show_notice: bool) -> Self {
        Self {
            required_role: require_user_role.then_some(Role::User),
            require_login,
            show_notice,
            fallback_path: "/".to_string(),
        }
    }

    /// Override the wrong-role redirect target
    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = path.into();
        self
    }

    /// Whether this guard protects anything at all
    fn is_protective(&self) -> bool {
        self.require_login || self.required_role.is_some()
    }

    /// Pure decision over a session snapshot
    ///
    /// A restored-but-unproven session carries no role, so role-gated
    /// routes deny it (fail closed) until a real login re-establishes the
    /// identity; the entry probe will clear the stale token if the server
    /// no longer accepts it.
    pub fn evaluate(&self, session: Option<&Session>) -> GuardDecision {
        let Some(session) = session else {
            if !self.is_protective() {
                return GuardDecision::Allow;
            }
            return GuardDecision::Deny(if self.show_notice {
                Denial::Notice(AccessNotice::LoginRequired)
            } else {
                Denial::RedirectToLogin
            });
        };

        let Some(required) = self.required_role else {
            return GuardDecision::Allow;
        };

        match session.role() {
            Some(role) if role == required => GuardDecision::Allow,
            role => {
                tracing::debug!(
                    required = %required,
                    actual = role.map(|r| r.code()).unwrap_or("unknown"),
                    "denying route access"
                );
                GuardDecision::Deny(if self.show_notice {
                    Denial::Notice(AccessNotice::RoleRequired { required })
                } else {
                    Denial::Redirect(self.fallback_path.clone())
                })
            }
        }
    }

    /// Evaluate plus the verification-on-mount pattern
    ///
    /// When the static decision allows and a token is present, performs a
    /// lightweight authenticated profile call purely to detect server-side
    /// invalidation (a token revoked out-of-band). Any failure - including
    /// a transport failure, which is indistinguishable from revocation at
    /// this trust level - invalidates the session and denies, the same as
    /// not being logged in. This is the one place a non-401 failure tears
    /// a session down; everywhere else only a 401 does.
    ///
    /// Concurrent probes from rapid navigation are fine: session teardown
    /// is idempotent and this guard never assumes its own probe was the
    /// most recent.
    pub async fn check_on_entry<G, S>(
        &self,
        session: &SessionService<S>,
        gateway: &G,
    ) -> GuardDecision
    where
        G: AuthGateway + Sync,
        S: CredentialStore,
    {
        let decision = self.evaluate(session.current().as_ref());
        if !decision.is_allowed() {
            return decision;
        }

        if self.is_protective() && session.is_authenticated() {
            tracing::debug!("verifying token on protected route entry");
            if let Err(e) = gateway.fetch_profile().await {
                tracing::warn!(error = %e, "route-entry verification failed, invalidating session");
                session.handle_unauthorized();
                return GuardDecision::Deny(Denial::RedirectToLogin);
            }
        }

        GuardDecision::Allow
    }
}

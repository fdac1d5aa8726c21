//! Bearer Token Value Object
//!
//! The opaque credential attached to authorized requests. The client cannot
//! inspect or verify it; expiry is only ever learned by receiving a 401.

use kernel::error::app_error::{AppError, AppResult};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Opaque bearer token issued at successful login or MFA completion
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a token string, rejecting empty or whitespace-only input
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AppError::bad_request("Token cannot be empty"));
        }
        Ok(Self(raw))
    }

    /// The raw token value, for the Authorization header and storage
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

// The token is a credential; Debug must never leak it.
impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(redacted)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_rejects_empty() {
        assert!(BearerToken::new("").is_err());
        assert!(BearerToken::new("   ").is_err());
    }

    #[test]
    fn test_token_reveal() {
        let token = BearerToken::new("jwt-abc.def.ghi").unwrap();
        assert_eq!(token.reveal(), "jwt-abc.def.ghi");
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::new("jwt-abc.def.ghi").unwrap();
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("jwt-abc"));
        assert_eq!(rendered, "BearerToken(redacted)");
    }
}

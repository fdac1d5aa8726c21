//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! The transport layer owns 401 detection; variants here describe what a
//! failure means to the flow that issued the call. A single response can
//! both invalidate the session (via the interceptor) and surface a business
//! error here - the two consumers are independent.

use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Primary login failed (wrong email or password)
    #[error("Invalid credentials")]
    CredentialsRejected,

    /// A 6-digit or backup code failed verification
    #[error("Invalid two-factor authentication code")]
    MfaCodeRejected,

    /// MFA operation attempted before enrollment finished
    #[error("Two-factor authentication not set up")]
    MfaNotSetup,

    /// An authorized call returned 401; the session has been torn down
    #[error("Session is no longer valid")]
    SessionInvalidated,

    /// Locally rejected input (malformed email, unknown role code, ...)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Transport failure or non-401 error status
    ///
    /// Never interpreted as session invalidation.
    #[error("Request failed: {0}")]
    Http(#[from] platform::http::HttpError),

    /// Persisted credential storage failed
    #[error("Credential storage failed: {0}")]
    Storage(#[from] platform::storage::StorageError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::CredentialsRejected
            | AuthError::MfaCodeRejected
            | AuthError::SessionInvalidated => ErrorKind::Unauthorized,
            AuthError::MfaNotSetup => ErrorKind::UnprocessableEntity,
            AuthError::Validation(_) => ErrorKind::BadRequest,
            AuthError::Http(e) => e
                .status()
                .map(ErrorKind::from)
                .unwrap_or(ErrorKind::ServiceUnavailable),
            AuthError::Storage(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Whether this failure means the session itself is dead
    ///
    /// True for an explicit invalidation and for any 401-class transport
    /// error; every other failure leaves session state untouched.
    pub fn is_session_invalidated(&self) -> bool {
        match self {
            AuthError::SessionInvalidated => true,
            AuthError::Http(e) => e.is_unauthorized(),
            _ => false,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        match self {
            AuthError::CredentialsRejected => {
                tracing::warn!("login attempt rejected");
            }
            AuthError::MfaCodeRejected => {
                tracing::warn!("MFA code rejected");
            }
            AuthError::SessionInvalidated => {
                tracing::warn!("session invalidated by server");
            }
            AuthError::Http(e) => {
                tracing::error!(error = %e, "auth request failed");
            }
            AuthError::Storage(e) => {
                tracing::error!(error = %e, "credential storage error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "auth internal error");
            }
            _ => {
                tracing::debug!(error = %self, "auth error");
            }
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest | ErrorKind::UnprocessableEntity => {
                AuthError::Validation(err.message().to_string())
            }
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use platform::http::HttpError;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AuthError::CredentialsRejected.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::MfaCodeRejected.kind(), ErrorKind::Unauthorized);
        assert_eq!(AuthError::MfaNotSetup.kind(), ErrorKind::UnprocessableEntity);
        assert_eq!(
            AuthError::Validation("bad".to_string()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            AuthError::Internal("boom".to_string()).kind(),
            ErrorKind::InternalServerError
        );
    }

    #[test]
    fn test_http_kind_follows_status() {
        let err = AuthError::Http(HttpError::Status {
            status: StatusCode::NOT_FOUND,
            message: None,
        });
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_session_invalidation_detection() {
        assert!(AuthError::SessionInvalidated.is_session_invalidated());
        assert!(
            AuthError::Http(HttpError::Status {
                status: StatusCode::UNAUTHORIZED,
                message: None,
            })
            .is_session_invalidated()
        );
        // A 5xx is a generic failure, never a logout trigger
        assert!(
            !AuthError::Http(HttpError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: None,
            })
            .is_session_invalidated()
        );
        assert!(!AuthError::CredentialsRejected.is_session_invalidated());
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AuthError = AppError::bad_request("bad email").into();
        assert!(matches!(err, AuthError::Validation(_)));

        let err: AuthError = AppError::internal("boom").into();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}

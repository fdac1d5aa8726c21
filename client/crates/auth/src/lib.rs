//! Auth (Authentication) Client Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session and MFA entities, value objects, the gateway trait
//! - `application/` - Session service, sign-in and MFA use cases
//! - `infra/` - REST implementation of the gateway
//!
//! ## Features
//! - Session establishment, teardown and startup restoration
//! - TOTP-based MFA challenge at login time (with backup-code path)
//! - MFA enrollment (setup / verify / enable / disable / status)
//! - Forced logout on any 401 observed by the transport layer
//!
//! ## Security Model
//! - The bearer token is opaque; expiry is only learned from a 401
//! - Role always comes from the backend payload, never inferred locally
//! - Ambiguous authorization state resolves to logged-out (fail closed)
//! - TOTP math lives server-side; the client only collects and forwards codes

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::mfa_challenge::{ChallengeState, MfaChallenge};
pub use application::mfa_setup::MfaSetupUseCase;
pub use application::session::{Navigator, SessionService};
pub use application::sign_in::{SignInInput, SignInOutcome, SignInUseCase};
pub use domain::gateway::{AuthGateway, LoginReply, SessionGrant};
pub use error::{AuthError, AuthResult};
pub use infra::rest::RestAuthGateway;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
}

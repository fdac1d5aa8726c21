//! Gateway Trait
//!
//! Interface to the remote authentication backend. Implementation is in the
//! infrastructure layer; the application layer only sees these operations
//! and the normalized result shapes.

use crate::domain::entity::{Identity, MfaSetup, MfaStatus, Profile};
use crate::domain::value_object::{BearerToken, Email, MfaProof, OtpCode};
use crate::error::AuthResult;

/// Final session payload issued at login or MFA completion
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: BearerToken,
    pub identity: Identity,
}

/// Outcome of primary credential submission
#[derive(Debug, Clone)]
pub enum LoginReply {
    /// The account has no second factor; the session payload is final
    Granted(SessionGrant),
    /// A second factor gates session creation for this account
    MfaRequired { email: Email },
}

/// Remote authentication service
#[trait_variant::make(AuthGateway: Send)]
pub trait LocalAuthGateway {
    /// Submit primary credentials
    async fn login(&self, email: &Email, password: &str) -> AuthResult<LoginReply>;

    /// Start MFA enrollment; returns secret, QR reference and backup codes
    async fn setup_mfa(&self, email: &Email) -> AuthResult<MfaSetup>;

    /// Verify a second-factor proof; `false` means the code was rejected
    async fn verify_mfa(&self, email: &Email, proof: &MfaProof) -> AuthResult<bool>;

    /// Enable MFA after a verified enrollment code
    async fn enable_mfa(&self, email: &Email, code: &OtpCode) -> AuthResult<bool>;

    /// Exchange a verified proof for the final session payload
    async fn complete_mfa_login(&self, email: &Email, proof: &MfaProof)
    -> AuthResult<SessionGrant>;

    /// Disable MFA for the account
    async fn disable_mfa(&self, email: &Email) -> AuthResult<()>;

    /// Fetch the account's MFA status
    async fn mfa_status(&self, email: &Email) -> AuthResult<MfaStatus>;

    /// Authenticated profile fetch, used by guards as a liveness probe
    async fn fetch_profile(&self) -> AuthResult<Profile>;
}

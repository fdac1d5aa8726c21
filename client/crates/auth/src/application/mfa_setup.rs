//! MFA Setup Use Case
//!
//! Enrollment flow, distinct from the login-time challenge: begin setup to
//! receive the shared secret and backup codes, then verify a code from the
//! authenticator app and enable - both must succeed before the account
//! counts as MFA-protected. Disabling is a single unconditional call; the
//! caller's UI warns that it weakens the account but never blocks it.

use std::sync::Arc;

use crate::domain::entity::{MfaSetup, MfaStatus};
use crate::domain::gateway::AuthGateway;
use crate::domain::value_object::{Email, MfaProof, OtpCode};
use crate::error::{AuthError, AuthResult};

/// MFA setup use case
pub struct MfaSetupUseCase<G>
where
    G: AuthGateway,
{
    gateway: Arc<G>,
}

impl<G> MfaSetupUseCase<G>
where
    G: AuthGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Start enrollment - generates a new secret server-side
    ///
    /// The returned material is shown once and scoped to the setup screen.
    /// Abandoning the flow afterwards requires no cleanup call from the
    /// client.
    pub async fn begin(&self, email: &Email) -> AuthResult<MfaSetup> {
        tracing::debug!(email = %email, "starting MFA enrollment");

        let setup = self.gateway.setup_mfa(email).await.inspect_err(|e| e.log())?;

        tracing::debug!(
            email = %email,
            backup_codes = setup.backup_codes.len(),
            "enrollment material received"
        );
        Ok(setup)
    }

    /// Verify an enrollment code and enable MFA
    ///
    /// Verification strictly precedes enablement; a rejected code never
    /// reaches the enable endpoint.
    pub async fn verify_and_enable(&self, email: &Email, raw_code: &str) -> AuthResult<()> {
        let code = OtpCode::parse(raw_code).map_err(|_| AuthError::MfaCodeRejected)?;

        tracing::debug!(email = %email, "verifying enrollment code");
        let verified = self
            .gateway
            .verify_mfa(email, &MfaProof::Totp(code.clone()))
            .await
            .inspect_err(|e| e.log())?;
        if !verified {
            let err = AuthError::MfaCodeRejected;
            err.log();
            return Err(err);
        }

        let enabled = self
            .gateway
            .enable_mfa(email, &code)
            .await
            .inspect_err(|e| e.log())?;
        if !enabled {
            // The code verified moments ago; a refusal here is a backend
            // inconsistency, not a user mistake.
            return Err(AuthError::Internal(
                "backend refused to enable MFA after a verified code".to_string(),
            ));
        }

        tracing::info!(email = %email, "MFA enabled");
        Ok(())
    }

    /// Disable MFA for the account
    ///
    /// Unconditional once the user confirms; the warning lives in the UI
    /// copy, not here.
    pub async fn disable(&self, email: &Email) -> AuthResult<()> {
        tracing::warn!(email = %email, "disabling MFA reduces account security");

        self.gateway
            .disable_mfa(email)
            .await
            .inspect_err(|e| e.log())?;

        tracing::info!(email = %email, "MFA disabled");
        Ok(())
    }

    /// Fetch the account's current MFA status
    ///
    /// Always refetched on demand; never cached across sessions.
    pub async fn status(&self, email: &Email) -> AuthResult<MfaStatus> {
        tracing::debug!(email = %email, "fetching MFA status");
        self.gateway
            .mfa_status(email)
            .await
            .inspect_err(|e| e.log())
    }
}

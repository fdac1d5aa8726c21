//! Sign In Use Case
//!
//! Submits primary credentials and either establishes the session directly
//! or hands control to the MFA challenge. When the backend says a second
//! factor is required, this use case returns without touching the session -
//! no path reaches `SessionService::login` before the challenge succeeds.

use std::sync::Arc;

use platform::storage::CredentialStore;

use crate::application::session::SessionService;
use crate::domain::gateway::{AuthGateway, LoginReply};
use crate::domain::value_object::Email;
use crate::error::{AuthError, AuthResult};

/// Sign in input
#[derive(Debug, Clone)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
#[derive(Debug, Clone, derive_more::Display)]
pub enum SignInOutcome {
    /// Session established; the caller can proceed
    #[display("authenticated")]
    Authenticated,
    /// A second factor gates session creation; start an MFA challenge
    #[display("mfa_required")]
    MfaRequired { email: Email },
}

/// Sign in use case
pub struct SignInUseCase<G, S>
where
    G: AuthGateway,
    S: CredentialStore,
{
    gateway: Arc<G>,
    session: Arc<SessionService<S>>,
}

impl<G, S> SignInUseCase<G, S>
where
    G: AuthGateway,
    S: CredentialStore,
{
    pub fn new(gateway: Arc<G>, session: Arc<SessionService<S>>) -> Self {
        Self { gateway, session }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutcome> {
        // Malformed identifier gets the same answer as a wrong one
        let email = Email::new(&input.email).map_err(|_| AuthError::CredentialsRejected)?;
        if input.password.is_empty() {
            return Err(AuthError::CredentialsRejected);
        }

        tracing::debug!(email = %email, "submitting primary credentials");
        let reply = self.gateway.login(&email, &input.password).await.map_err(|e| {
            e.log();
            e
        })?;

        match reply {
            LoginReply::Granted(grant) => {
                self.session.login(grant.identity, grant.token);
                Ok(SignInOutcome::Authenticated)
            }
            LoginReply::MfaRequired { email } => {
                tracing::debug!(email = %email, "second factor required");
                Ok(SignInOutcome::MfaRequired { email })
            }
        }
    }
}

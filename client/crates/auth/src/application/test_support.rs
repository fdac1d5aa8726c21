//! Hand-rolled test doubles shared by the application-layer tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::session::Navigator;
use crate::domain::entity::{Identity, MfaSetup, MfaStatus, Profile};
use crate::domain::gateway::{AuthGateway, LoginReply, SessionGrant};
use crate::domain::value_object::{BearerToken, Email, MfaProof, Nickname, OtpCode, Role};
use crate::error::{AuthError, AuthResult};

/// Navigator that swallows redirects, for tests that don't care.
pub(crate) struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, _path: &str) {}
}

/// One recorded gateway invocation, for call-sequence assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GatewayCall {
    Login,
    SetupMfa,
    VerifyMfa,
    EnableMfa,
    CompleteMfaLogin,
    DisableMfa,
    MfaStatus,
    FetchProfile,
}

enum LoginScript {
    Grant(SessionGrant),
    RequireMfa,
    Reject,
    Unscripted,
}

/// Scriptable, recording implementation of [`AuthGateway`].
///
/// Unscripted operations fail loudly so a test cannot silently exercise a
/// path it did not mean to.
pub(crate) struct FakeGateway {
    calls: Mutex<Vec<GatewayCall>>,
    login: Mutex<LoginScript>,
    verify: Mutex<VecDeque<AuthResult<bool>>>,
    enable: Mutex<VecDeque<AuthResult<bool>>>,
    complete: Mutex<VecDeque<AuthResult<SessionGrant>>>,
    disable: Mutex<VecDeque<AuthResult<()>>>,
    status: Mutex<VecDeque<AuthResult<MfaStatus>>>,
    profile: Mutex<VecDeque<AuthResult<Profile>>>,
    setup: Mutex<VecDeque<AuthResult<MfaSetup>>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            login: Mutex::new(LoginScript::Unscripted),
            verify: Mutex::new(VecDeque::new()),
            enable: Mutex::new(VecDeque::new()),
            complete: Mutex::new(VecDeque::new()),
            disable: Mutex::new(VecDeque::new()),
            status: Mutex::new(VecDeque::new()),
            profile: Mutex::new(VecDeque::new()),
            setup: Mutex::new(VecDeque::new()),
        }
    }
}

impl FakeGateway {
    pub(crate) fn identity(nickname: &str, role: Role) -> Identity {
        Identity {
            nickname: Nickname::new(nickname).unwrap(),
            name: nickname.to_string(),
            email: Email::new(format!("{nickname}@example.com")).unwrap(),
            role,
        }
    }

    pub(crate) fn grant(nickname: &str, role: Role, token: &str) -> SessionGrant {
        SessionGrant {
            token: BearerToken::new(token).unwrap(),
            identity: Self::identity(nickname, role),
        }
    }

    pub(crate) fn grant_login(&self, grant: SessionGrant) {
        *self.login.lock().unwrap() = LoginScript::Grant(grant);
    }

    pub(crate) fn require_mfa(&self) {
        *self.login.lock().unwrap() = LoginScript::RequireMfa;
    }

    pub(crate) fn reject_login(&self) {
        *self.login.lock().unwrap() = LoginScript::Reject;
    }

    pub(crate) fn push_setup(&self, result: AuthResult<MfaSetup>) {
        self.setup.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_verify(&self, result: AuthResult<bool>) {
        self.verify.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_enable(&self, result: AuthResult<bool>) {
        self.enable.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_complete(&self, result: AuthResult<SessionGrant>) {
        self.complete.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_disable(&self, result: AuthResult<()>) {
        self.disable.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_status(&self, result: AuthResult<MfaStatus>) {
        self.status.lock().unwrap().push_back(result);
    }

    pub(crate) fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn pop<T>(queue: &Mutex<VecDeque<AuthResult<T>>>, what: &str) -> AuthResult<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AuthError::Internal(format!("unscripted {what} call"))))
    }
}

impl AuthGateway for FakeGateway {
    async fn login(&self, _email: &Email, _password: &str) -> AuthResult<LoginReply> {
        self.record(GatewayCall::Login);
        let mut script = self.login.lock().unwrap();
        match std::mem::replace(&mut *script, LoginScript::Unscripted) {
            LoginScript::Grant(grant) => Ok(LoginReply::Granted(grant)),
            LoginScript::RequireMfa => {
                *script = LoginScript::RequireMfa;
                Ok(LoginReply::MfaRequired {
                    email: _email.clone(),
                })
            }
            LoginScript::Reject => {
                *script = LoginScript::Reject;
                Err(AuthError::CredentialsRejected)
            }
            LoginScript::Unscripted => Err(AuthError::Internal("unscripted login call".into())),
        }
    }

    async fn setup_mfa(&self, _email: &Email) -> AuthResult<MfaSetup> {
        self.record(GatewayCall::SetupMfa);
        Self::pop(&self.setup, "setup_mfa")
    }

    async fn verify_mfa(&self, _email: &Email, _proof: &MfaProof) -> AuthResult<bool> {
        self.record(GatewayCall::VerifyMfa);
        Self::pop(&self.verify, "verify_mfa")
    }

    async fn enable_mfa(&self, _email: &Email, _code: &OtpCode) -> AuthResult<bool> {
        self.record(GatewayCall::EnableMfa);
        Self::pop(&self.enable, "enable_mfa")
    }

    async fn complete_mfa_login(
        &self,
        _email: &Email,
        _proof: &MfaProof,
    ) -> AuthResult<SessionGrant> {
        self.record(GatewayCall::CompleteMfaLogin);
        Self::pop(&self.complete, "complete_mfa_login")
    }

    async fn disable_mfa(&self, _email: &Email) -> AuthResult<()> {
        self.record(GatewayCall::DisableMfa);
        Self::pop(&self.disable, "disable_mfa")
    }

    async fn mfa_status(&self, _email: &Email) -> AuthResult<MfaStatus> {
        self.record(GatewayCall::MfaStatus);
        Self::pop(&self.status, "mfa_status")
    }

    async fn fetch_profile(&self) -> AuthResult<Profile> {
        self.record(GatewayCall::FetchProfile);
        Self::pop(&self.profile, "fetch_profile")
    }
}

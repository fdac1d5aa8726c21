//! MFA Challenge
//!
//! Login-time second-factor prompt, one instance per authentication attempt.
//! Created when sign-in answers `MfaRequired`; drives the
//! verify → complete → establish-session sequence and owns the cosmetic
//! code-rotation countdown.
//!
//! Ordering invariant: the session is only ever touched after both the
//! verification and the completion call succeed. Dismissing the challenge
//! does not abort an in-flight request, but a result that arrives after
//! `cancel` is discarded without mutating anything.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use platform::storage::CredentialStore;
use tokio::task::JoinHandle;

use crate::application::config::AuthConfig;
use crate::application::session::SessionService;
use crate::domain::gateway::AuthGateway;
use crate::domain::value_object::{BackupCode, Email, MfaProof, OtpCode};
use crate::error::{AuthError, AuthResult};

/// Challenge state, per authentication attempt
///
/// Rejected submissions return to `AwaitingCode`; there is no client-side
/// retry limit (rate limiting, if any, is the server's).
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ChallengeState {
    /// Waiting for a code; the user can retry indefinitely
    #[display("awaiting_code")]
    AwaitingCode,
    /// A submission is in flight
    #[display("verifying")]
    Verifying,
    /// Verification and completion both succeeded; session established
    #[display("authenticated")]
    Authenticated,
    /// Dismissed; any late results are discarded
    #[display("cancelled")]
    Cancelled,
}

/// What the prompt renders: current state plus the last user-visible error
#[derive(Debug, Clone)]
struct ChallengeView {
    state: ChallengeState,
    error: Option<String>,
}

/// Login-time MFA challenge
pub struct MfaChallenge<G, S>
where
    G: AuthGateway,
    S: CredentialStore,
{
    gateway: Arc<G>,
    session: Arc<SessionService<S>>,
    email: Email,
    view: Mutex<ChallengeView>,
    cancelled: AtomicBool,
    countdown: CodeCountdown,
}

impl<G, S> MfaChallenge<G, S>
where
    G: AuthGateway,
    S: CredentialStore,
{
    /// Open a challenge for the account sign-in flagged as MFA-gated
    ///
    /// Spawns the countdown task, so this must run inside a tokio runtime.
    pub fn new(
        gateway: Arc<G>,
        session: Arc<SessionService<S>>,
        email: Email,
        config: &AuthConfig,
    ) -> Self {
        Self {
            gateway,
            session,
            email,
            view: Mutex::new(ChallengeView {
                state: ChallengeState::AwaitingCode,
                error: None,
            }),
            cancelled: AtomicBool::new(false),
            countdown: CodeCountdown::start(config.totp_period),
        }
    }

    /// Submit raw input from the 6-digit code field
    ///
    /// Input is sanitized at this boundary (digits only, truncated to six);
    /// an incomplete code is rejected locally without a network call.
    pub async fn submit(&self, raw: &str) -> AuthResult<ChallengeState> {
        let code = match OtpCode::parse(raw) {
            Ok(code) => code,
            Err(e) => {
                let message = e.message().to_string();
                self.note_error(&message);
                return Err(AuthError::Validation(message));
            }
        };
        self.verify_and_complete(MfaProof::Totp(code)).await
    }

    /// Submit a backup code instead of a TOTP code
    ///
    /// The parallel recovery path: same verification endpoint family,
    /// different payload shape. Available at any point in the challenge.
    pub async fn submit_backup(&self, raw: &str) -> AuthResult<ChallengeState> {
        let code = match BackupCode::new(raw) {
            Ok(code) => code,
            Err(e) => {
                let message = e.message().to_string();
                self.note_error(&message);
                return Err(AuthError::Validation(message));
            }
        };
        self.verify_and_complete(MfaProof::Backup(code)).await
    }

    /// Dismiss the challenge
    ///
    /// In-flight requests are not aborted at the transport level; their
    /// results are ignored when they land.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.countdown.stop();
        let mut view = self.view();
        view.state = ChallengeState::Cancelled;
        view.error = None;
        tracing::debug!(email = %self.email, "MFA challenge dismissed");
    }

    pub fn state(&self) -> ChallengeState {
        self.view().state
    }

    /// Last user-visible error, cleared by the next submission
    pub fn error(&self) -> Option<String> {
        self.view().error.clone()
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Seconds left in the current code-rotation cycle (cosmetic)
    pub fn seconds_until_rotation(&self) -> u64 {
        self.countdown.remaining_secs()
    }

    async fn verify_and_complete(&self, proof: MfaProof) -> AuthResult<ChallengeState> {
        if self.is_cancelled() {
            return Ok(ChallengeState::Cancelled);
        }
        {
            let mut view = self.view();
            // Ignore double submissions while one is in flight
            if view.state != ChallengeState::AwaitingCode {
                return Ok(view.state);
            }
            view.state = ChallengeState::Verifying;
            view.error = None;
        }

        tracing::debug!(
            email = %self.email,
            backup = proof.is_backup(),
            "verifying second factor"
        );
        let verified = self.gateway.verify_mfa(&self.email, &proof).await;
        if self.is_cancelled() {
            tracing::debug!("discarding verification result after dismissal");
            return Ok(ChallengeState::Cancelled);
        }

        match verified {
            Err(e) => {
                self.reject("Something went wrong while verifying the code. Please try again.");
                e.log();
                return Err(e);
            }
            Ok(false) => {
                self.reject("That code was not accepted. Check your authenticator app and try again.");
                let err = AuthError::MfaCodeRejected;
                err.log();
                return Err(err);
            }
            Ok(true) => {}
        }

        tracing::debug!(email = %self.email, "second factor accepted, completing login");
        let grant = match self.gateway.complete_mfa_login(&self.email, &proof).await {
            Ok(grant) => grant,
            Err(e) => {
                if self.is_cancelled() {
                    return Ok(ChallengeState::Cancelled);
                }
                self.reject("Could not finish signing in. Please try again.");
                e.log();
                return Err(e);
            }
        };
        if self.is_cancelled() {
            tracing::debug!("discarding completion result after dismissal");
            return Ok(ChallengeState::Cancelled);
        }

        self.session.login(grant.identity, grant.token);
        self.countdown.stop();
        let mut view = self.view();
        view.state = ChallengeState::Authenticated;
        view.error = None;
        Ok(ChallengeState::Authenticated)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Record a user-visible error without leaving the current state
    fn note_error(&self, message: &str) {
        self.view().error = Some(message.to_string());
    }

    /// Return to `AwaitingCode` with a user-visible error; retry is allowed
    fn reject(&self, message: &str) {
        let mut view = self.view();
        view.state = ChallengeState::AwaitingCode;
        view.error = Some(message.to_string());
    }

    fn view(&self) -> MutexGuard<'_, ChallengeView> {
        self.view.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Cosmetic countdown communicating TOTP code rotation
///
/// Fixed cycle, client-local, not synchronized to the server clock. It
/// never blocks submission - a stale code is simply rejected server-side.
/// The ticking task is torn down on `stop` or drop so repeated open/close
/// cycles do not leak timers.
pub struct CodeCountdown {
    remaining: Arc<AtomicU64>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CodeCountdown {
    /// Spawn the ticking task; requires a tokio runtime
    pub fn start(period: Duration) -> Self {
        let period_secs = period.as_secs().max(1);
        let remaining = Arc::new(AtomicU64::new(period_secs));
        let ticker = remaining.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately; consume it so a full
            // cycle elapses before the first decrement.
            interval.tick().await;
            loop {
                interval.tick().await;
                let next = match ticker.load(Ordering::Relaxed) {
                    0 | 1 => period_secs,
                    n => n - 1,
                };
                ticker.store(next, Ordering::Relaxed);
            }
        });

        Self {
            remaining,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Tear the timer down; safe to call more than once
    pub fn stop(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = handle.take() {
            handle.abort();
        }
    }
}

impl Drop for CodeCountdown {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeGateway, GatewayCall, NoopNavigator};
    use crate::domain::entity::{MfaStatus, Profile};
    use crate::domain::gateway::{LoginReply, SessionGrant};
    use crate::domain::value_object::Role;
    use platform::storage::MemoryCredentialStore;
    use tokio::sync::Notify;

    fn session() -> Arc<SessionService<MemoryCredentialStore>> {
        Arc::new(SessionService::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(NoopNavigator),
            Arc::new(AuthConfig::default()),
        ))
    }

    fn challenge(
        gateway: Arc<FakeGateway>,
        session: Arc<SessionService<MemoryCredentialStore>>,
    ) -> MfaChallenge<FakeGateway, MemoryCredentialStore> {
        MfaChallenge::new(
            gateway,
            session,
            Email::new("alice@example.com").unwrap(),
            &AuthConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_wrong_code_then_correct_code() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.push_verify(Ok(false));
        gateway.push_verify(Ok(true));
        gateway.push_complete(Ok(FakeGateway::grant("alice", Role::Admin, "tok-mfa")));
        let session = session();
        let challenge = challenge(gateway.clone(), session.clone());

        // Wrong code: rejected, session untouched, retry allowed
        let err = challenge.submit("000000").await.unwrap_err();
        assert!(matches!(err, AuthError::MfaCodeRejected));
        assert_eq!(challenge.state(), ChallengeState::AwaitingCode);
        assert!(challenge.error().is_some());
        assert!(!session.is_authenticated());

        // Correct code: verify, then complete, then session establishment
        let state = challenge.submit("123456").await.unwrap();
        assert_eq!(state, ChallengeState::Authenticated);
        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Admin));
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::VerifyMfa,
                GatewayCall::VerifyMfa,
                GatewayCall::CompleteMfaLogin,
            ]
        );
    }

    #[tokio::test]
    async fn test_session_untouched_until_complete_succeeds() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.push_verify(Ok(true));
        gateway.push_complete(Err(AuthError::Internal("backend hiccup".into())));
        let session = session();
        let challenge = challenge(gateway, session.clone());

        let err = challenge.submit("123456").await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
        // Verification succeeded but completion failed: still no session
        assert!(!session.is_authenticated());
        assert_eq!(challenge.state(), ChallengeState::AwaitingCode);
    }

    #[tokio::test]
    async fn test_incomplete_code_rejected_locally() {
        let gateway = Arc::new(FakeGateway::default());
        let session = session();
        let challenge = challenge(gateway.clone(), session);

        let err = challenge.submit("12a45").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(challenge.state(), ChallengeState::AwaitingCode);
        assert!(challenge.error().is_some());
        // Never reached the network
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backup_code_path() {
        let gateway = Arc::new(FakeGateway::default());
        gateway.push_verify(Ok(true));
        gateway.push_complete(Ok(FakeGateway::grant("alice", Role::User, "tok-backup")));
        let session = session();
        let challenge = challenge(gateway, session.clone());

        let state = challenge.submit_backup("AAAA-1111").await.unwrap();
        assert_eq!(state, ChallengeState::Authenticated);
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_submit_after_cancel_is_ignored() {
        let gateway = Arc::new(FakeGateway::default());
        let session = session();
        let challenge = challenge(gateway.clone(), session.clone());

        challenge.cancel();
        let state = challenge.submit("123456").await.unwrap();
        assert_eq!(state, ChallengeState::Cancelled);
        assert!(gateway.calls().is_empty());
        assert!(!session.is_authenticated());
    }

    /// Gateway whose verification blocks until released, for interleaving
    /// cancellation with an in-flight request.
    struct BlockingGateway {
        release: Notify,
    }

    impl AuthGateway for BlockingGateway {
        async fn login(&self, _: &Email, _: &str) -> AuthResult<LoginReply> {
            unreachable!("not used")
        }
        async fn setup_mfa(&self, _: &Email) -> AuthResult<crate::domain::entity::MfaSetup> {
            unreachable!("not used")
        }
        async fn verify_mfa(&self, _: &Email, _: &MfaProof) -> AuthResult<bool> {
            self.release.notified().await;
            Ok(true)
        }
        async fn enable_mfa(&self, _: &Email, _: &OtpCode) -> AuthResult<bool> {
            unreachable!("not used")
        }
        async fn complete_mfa_login(&self, _: &Email, _: &MfaProof) -> AuthResult<SessionGrant> {
            unreachable!("completion must not run after cancel")
        }
        async fn disable_mfa(&self, _: &Email) -> AuthResult<()> {
            unreachable!("not used")
        }
        async fn mfa_status(&self, _: &Email) -> AuthResult<MfaStatus> {
            unreachable!("not used")
        }
        async fn fetch_profile(&self) -> AuthResult<Profile> {
            unreachable!("not used")
        }
    }

    #[tokio::test]
    async fn test_stale_verification_after_cancel_mutates_nothing() {
        let gateway = Arc::new(BlockingGateway {
            release: Notify::new(),
        });
        let session = session();
        let challenge = Arc::new(MfaChallenge::new(
            gateway.clone(),
            session.clone(),
            Email::new("alice@example.com").unwrap(),
            &AuthConfig::default(),
        ));

        let submitting = {
            let challenge = challenge.clone();
            tokio::spawn(async move { challenge.submit("123456").await })
        };
        // Let the submission reach the blocked verification call
        tokio::task::yield_now().await;

        challenge.cancel();
        gateway.release.notify_one();

        let state = submitting.await.unwrap().unwrap();
        assert_eq!(state, ChallengeState::Cancelled);
        assert_eq!(challenge.state(), ChallengeState::Cancelled);
        // The verified=true result arrived after dismissal: no session
        assert!(!session.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks_and_wraps() {
        let countdown = CodeCountdown::start(Duration::from_secs(30));
        assert_eq!(countdown.remaining_secs(), 30);

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(countdown.remaining_secs(), 27);

        // The cycle resets instead of reaching zero
        tokio::time::sleep(Duration::from_secs(27)).await;
        tokio::task::yield_now().await;
        assert_eq!(countdown.remaining_secs(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_stop_tears_down_timer() {
        let countdown = CodeCountdown::start(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        countdown.stop();

        let frozen = countdown.remaining_secs();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(countdown.remaining_secs(), frozen);

        // Stopping again is a no-op
        countdown.stop();
    }
}

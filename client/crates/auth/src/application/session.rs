//! Session Service
//!
//! Single source of truth for "who is logged in, with what role, using what
//! token", and the only component permitted to mutate the credential store.
//! All operations are synchronous state transitions; network calls belong to
//! the use cases that obtain tokens, never to this service.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use platform::http::UnauthorizedObserver;
use platform::storage::CredentialStore;

use crate::application::config::AuthConfig;
use crate::domain::entity::{Identity, Session};
use crate::domain::value_object::{BearerToken, Nickname, Role};

/// Sink for forced navigation (the login redirect on invalidation)
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Session service
///
/// Holds the one mutable session instance for the running application.
/// Consumers read snapshots; mutation goes through `login`, `logout` and
/// `handle_unauthorized`, each of which keeps the in-memory state and the
/// persisted keys in step so no observer can see identity without token or
/// vice versa.
pub struct SessionService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    navigator: Arc<dyn Navigator>,
    config: Arc<AuthConfig>,
    state: RwLock<Option<Session>>,
}

impl<S> SessionService<S>
where
    S: CredentialStore,
{
    pub fn new(store: Arc<S>, navigator: Arc<dyn Navigator>, config: Arc<AuthConfig>) -> Self {
        Self {
            store,
            navigator,
            config,
            state: RwLock::new(None),
        }
    }

    /// Reconcile persisted credentials at application start
    ///
    /// Both keys present: restore a minimal identity optimistically (the
    /// role and email are not persisted and stay unknown until the next
    /// login). Exactly one key present: the state is inconsistent, so both
    /// are cleared - never half-authenticated.
    pub fn restore(&self) {
        let token = self.store.token();
        let nickname = self.store.nickname();

        match (token, nickname) {
            (Some(token), Some(nickname)) => {
                let parsed = BearerToken::new(token)
                    .and_then(|token| Nickname::new(nickname).map(|n| (token, n)));
                match parsed {
                    Ok((token, nickname)) => {
                        let mut state = self.write();
                        *state = Some(Session::restored(nickname, token));
                        tracing::info!("session restored from persisted credentials");
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "persisted credentials are unusable, clearing"
                        );
                        self.clear_store();
                    }
                }
            }
            (None, None) => {}
            _ => {
                tracing::warn!("persisted credentials are inconsistent, clearing both");
                self.clear_store();
            }
        }
    }

    /// Establish a session from a completed login
    ///
    /// Persists the token and nickname and publishes the session in one
    /// locked section, fully overwriting any prior session. A storage
    /// failure leaves the session memory-only rather than failing the
    /// login the user just completed.
    pub fn login(&self, identity: Identity, token: BearerToken) {
        let mut state = self.write();

        if let Err(e) = self
            .store
            .store(token.reveal(), identity.nickname.as_str())
        {
            tracing::warn!(error = %e, "failed to persist credentials; session will not survive a restart");
        }

        tracing::info!(
            nickname = %identity.nickname,
            role = %identity.role,
            "session established"
        );
        *state = Some(Session::established(identity, token));
    }

    /// Tear down the session on explicit user action
    ///
    /// Idempotent: calling it while logged out is a no-op.
    pub fn logout(&self) {
        let mut state = self.write();
        if state.take().is_none() {
            return;
        }
        drop(state);

        self.clear_store();
        tracing::info!("session cleared");
    }

    /// Tear down the session because the server rejected its token
    ///
    /// Same transition as `logout`, plus a redirect to the login entry
    /// point. Safe under concurrent invocation: several in-flight requests
    /// can all observe a 401 at once, and only the first caller performs
    /// the teardown and navigation - the rest see an empty session and do
    /// nothing.
    pub fn handle_unauthorized(&self) {
        let had_session = self.write().take().is_some();
        if !had_session {
            return;
        }

        self.clear_store();
        tracing::warn!("session invalidated, redirecting to login");
        self.navigator.navigate(&self.config.login_path);
    }

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    /// Role of the current session, when one is established
    pub fn role(&self) -> Option<Role> {
        self.read().as_ref().and_then(Session::role)
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted credentials");
        }
    }

    // A poisoned lock means a panic elsewhere; the session data itself is
    // still coherent, so recover the guard instead of propagating.
    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl<S> UnauthorizedObserver for SessionService<S>
where
    S: CredentialStore,
{
    fn on_unauthorized(&self) {
        self.handle_unauthorized();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::Email;
    use platform::storage::MemoryCredentialStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNavigator {
        visits: Mutex<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, path: &str) {
            self.visits.lock().unwrap().push(path.to_string());
        }
    }

    impl RecordingNavigator {
        fn visits(&self) -> Vec<String> {
            self.visits.lock().unwrap().clone()
        }
    }

    fn identity(role: Role) -> Identity {
        Identity {
            nickname: Nickname::new("alice").unwrap(),
            name: "Alice".to_string(),
            email: Email::new("alice@example.com").unwrap(),
            role,
        }
    }

    fn service() -> (
        Arc<SessionService<MemoryCredentialStore>>,
        Arc<MemoryCredentialStore>,
        Arc<RecordingNavigator>,
    ) {
        let store = Arc::new(MemoryCredentialStore::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let service = Arc::new(SessionService::new(
            store.clone(),
            navigator.clone(),
            Arc::new(AuthConfig::default()),
        ));
        (service, store, navigator)
    }

    #[test]
    fn test_login_then_logout_round_trips_to_empty() {
        let (service, store, _) = service();

        service.login(identity(Role::User), BearerToken::new("tok-1").unwrap());
        assert!(service.is_authenticated());
        assert_eq!(store.token(), Some("tok-1".to_string()));
        assert_eq!(store.nickname(), Some("alice".to_string()));

        service.logout();
        assert!(!service.is_authenticated());
        assert!(service.current().is_none());
        assert_eq!(store.token(), None);
        assert_eq!(store.nickname(), None);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (service, _, _) = service();
        service.logout();
        service.logout();
        assert!(!service.is_authenticated());
    }

    #[test]
    fn test_handle_unauthorized_twice_equals_once() {
        let (service, store, navigator) = service();
        service.login(identity(Role::Admin), BearerToken::new("tok-1").unwrap());

        service.handle_unauthorized();
        service.handle_unauthorized();

        assert!(!service.is_authenticated());
        assert_eq!(store.token(), None);
        // Only the first call navigates
        assert_eq!(navigator.visits(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_handle_unauthorized_while_logged_out_is_noop() {
        let (service, _, navigator) = service();
        service.handle_unauthorized();
        assert!(navigator.visits().is_empty());
    }

    #[test]
    fn test_login_overwrites_prior_session() {
        let (service, store, _) = service();
        service.login(identity(Role::User), BearerToken::new("tok-1").unwrap());

        let mut second = identity(Role::Seller);
        second.nickname = Nickname::new("bob").unwrap();
        service.login(second, BearerToken::new("tok-2").unwrap());

        let session = service.current().unwrap();
        assert_eq!(session.nickname().as_str(), "bob");
        assert_eq!(session.role(), Some(Role::Seller));
        assert_eq!(store.token(), Some("tok-2".to_string()));
    }

    #[test]
    fn test_restore_with_both_keys() {
        let (service, store, _) = service();
        store.seed(Some("tok-1"), Some("alice"));

        service.restore();

        let session = service.current().unwrap();
        assert_eq!(session.nickname().as_str(), "alice");
        // Role and email are not restorable from storage
        assert_eq!(session.role(), None);
        assert!(!session.identity.is_established());
    }

    #[test]
    fn test_restore_with_token_only_fails_closed() {
        let (service, store, _) = service();
        store.seed(Some("tok-1"), None);

        service.restore();

        assert!(!service.is_authenticated());
        assert_eq!(store.token(), None);
        assert_eq!(store.nickname(), None);
    }

    #[test]
    fn test_restore_with_nickname_only_fails_closed() {
        let (service, store, _) = service();
        store.seed(None, Some("alice"));

        service.restore();

        assert!(!service.is_authenticated());
        assert_eq!(store.token(), None);
        assert_eq!(store.nickname(), None);
    }

    #[test]
    fn test_restore_with_empty_store_stays_logged_out() {
        let (service, store, _) = service();
        service.restore();
        assert!(!service.is_authenticated());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_observer_routes_to_handle_unauthorized() {
        let (service, _, navigator) = service();
        service.login(identity(Role::User), BearerToken::new("tok-1").unwrap());

        UnauthorizedObserver::on_unauthorized(service.as_ref());

        assert!(!service.is_authenticated());
        assert_eq!(navigator.visits(), vec!["/login".to_string()]);
    }

    #[test]
    fn test_concurrent_unauthorized_bursts() {
        let (service, _, navigator) = service();
        service.login(identity(Role::User), BearerToken::new("tok-1").unwrap());

        let service_for_threads = service.clone();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service_for_threads.clone();
                std::thread::spawn(move || service.handle_unauthorized())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!service.is_authenticated());
        // Exactly one thread performed the teardown and navigation
        assert_eq!(navigator.visits().len(), 1);
    }
}

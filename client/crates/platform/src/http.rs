//! HTTP Client with Interceptors
//!
//! Single outbound gateway for all API calls. Every request picks up the
//! current bearer token from a [`TokenSource`] (absent token means the call
//! goes out unauthenticated; some endpoints are public). Every failing
//! response is classified, and a 401 additionally notifies the
//! [`UnauthorizedObserver`] exactly once before the error is returned to the
//! caller - killing the session and telling the calling screen are
//! independent concerns and both must fire.
//!
//! No retries, no request queueing, no deduplication.

use http::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::HttpConfig;
use crate::storage::CredentialStore;

/// Read-only view of the current bearer token
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Every credential store is readable as a token source
impl<S: CredentialStore> TokenSource for S {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }
}

/// Observer notified when the backend rejects the current credentials
///
/// Implementations must tolerate being invoked repeatedly and concurrently:
/// a burst of in-flight requests can each receive a 401.
pub trait UnauthorizedObserver: Send + Sync {
    fn on_unauthorized(&self);
}

/// Error raised by the transport layer
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Connection, DNS, TLS or timeout failure - the request never completed
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("backend returned {status}: {}", .message.as_deref().unwrap_or("no detail"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// The response body did not match the expected shape
    #[error("response decode failed: {0}")]
    Decode(#[source] reqwest::Error),

    /// The client itself could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

impl HttpError {
    /// Status code of the response, when one was received
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this is the 401 class that forces logout
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether the request timed out in transit
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Transport(e) if e.is_timeout())
    }

    /// Backend-supplied error detail, when the body carried one
    pub fn message(&self) -> Option<&str> {
        match self {
            HttpError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// HTTP client wrapping `reqwest` with the two interceptors
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    observer: Arc<dyn UnauthorizedObserver>,
}

impl HttpClient {
    /// Build a client from config, token source and 401 observer
    pub fn new(
        config: &HttpConfig,
        tokens: Arc<dyn TokenSource>,
        observer: Arc<dyn UnauthorizedObserver>,
    ) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            inner,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            observer,
        })
    }

    /// GET a JSON payload
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, HttpError> {
        let response = self.execute(self.inner.get(self.url(path))).await?;
        Self::decode(response).await
    }

    /// POST a JSON body and decode a JSON payload
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(self.inner.post(self.url(path)).json(body))
            .await?;
        Self::decode(response).await
    }

    /// DELETE, succeeding on any 2xx
    pub async fn delete(&self, path: &str) -> Result<(), HttpError> {
        self.execute(self.inner.delete(self.url(path))).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request through both interceptors
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, HttpError> {
        // Request interceptor: attach the bearer token when one exists.
        // Reads the source on every call so a new login is picked up
        // without rebuilding the client.
        let request = match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(HttpError::Transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = Self::read_message(response).await;
        Err(self.fail(status, message))
    }

    /// Response interceptor: classify a failed response
    ///
    /// A 401 notifies the observer exactly once for this response and is
    /// still returned as an error so the calling screen sees the failure.
    fn fail(&self, status: StatusCode, message: Option<String>) -> HttpError {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend rejected the current credentials");
            self.observer.on_unauthorized();
        }
        HttpError::Status { status, message }
    }

    async fn read_message(response: reqwest::Response) -> Option<String> {
        let bytes = response.bytes().await.ok()?;
        extract_message(&bytes)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, HttpError> {
        response.json().await.map_err(HttpError::Decode)
    }
}

/// Pull a human-readable `message` field out of an error body, if any
fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedToken(Option<String>);

    impl TokenSource for FixedToken {
        fn bearer_token(&self) -> Option<String> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        hits: AtomicUsize,
    }

    impl UnauthorizedObserver for CountingObserver {
        fn on_unauthorized(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn client(observer: Arc<CountingObserver>) -> HttpClient {
        HttpClient::new(
            &HttpConfig::default(),
            Arc::new(FixedToken(None)),
            observer,
        )
        .unwrap()
    }

    #[test]
    fn test_unauthorized_notifies_observer_once_and_returns_error() {
        let observer = Arc::new(CountingObserver::default());
        let client = client(observer.clone());

        let err = client.fail(StatusCode::UNAUTHORIZED, Some("expired".to_string()));
        assert!(err.is_unauthorized());
        assert_eq!(err.message(), Some("expired"));
        assert_eq!(observer.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_unauthorized_failure_notifies_nobody() {
        let observer = Arc::new(CountingObserver::default());
        let client = client(observer.clone());

        let err = client.fail(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(observer.hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_each_failing_response_notifies_independently() {
        let observer = Arc::new(CountingObserver::default());
        let client = client(observer.clone());

        // A burst of simultaneous 401s: one notification per response,
        // never deduplicated at this layer.
        for _ in 0..3 {
            let _ = client.fail(StatusCode::UNAUTHORIZED, None);
        }
        assert_eq!(observer.hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_url_joining() {
        let observer = Arc::new(CountingObserver::default());
        let client = HttpClient::new(
            &HttpConfig::with_base_url("http://localhost:8080/"),
            Arc::new(FixedToken(None)),
            observer,
        )
        .unwrap();

        assert_eq!(client.url("/auth/login"), "http://localhost:8080/auth/login");
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(br#"{"message":"bad code"}"#),
            Some("bad code".to_string())
        );
        assert_eq!(extract_message(br#"{"error":"x"}"#), None);
        assert_eq!(extract_message(b"not json"), None);
    }
}

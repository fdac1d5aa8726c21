//! Transport Configuration
//!
//! Configuration for the HTTP client.

use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL all request paths are joined onto
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(5),
            user_agent: concat!("storefront-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Create a config pointed at the given base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_with_base_url() {
        let config = HttpConfig::with_base_url("https://api.example.com");
        assert_eq!(config.base_url, "https://api.example.com");
    }
}

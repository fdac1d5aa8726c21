//! Application Configuration
//!
//! Configuration for the auth application layer.

use std::time::Duration;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Where `handle_unauthorized` sends the user
    pub login_path: String,
    /// Default fallback for wrong-role redirects
    pub home_path: String,
    /// TOTP rotation period shown by the challenge countdown (cosmetic)
    pub totp_period: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
            totp_period: Duration::from_secs(30),
        }
    }
}

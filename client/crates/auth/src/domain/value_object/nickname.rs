//! Nickname Value Object
//!
//! Display name shown in the header and persisted next to the token. The
//! backend owns registration policy (uniqueness, reserved words); the client
//! only normalizes and bounds what it is going to display and store.
//!
//! NFKC normalization first, then validation, so visually-identical inputs
//! (full-width forms, compatibility characters) collapse to one canonical
//! form before any check runs.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Maximum nickname length (in characters, after normalization)
pub const NICKNAME_MAX_LENGTH: usize = 30;

/// Display nickname value object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nickname(String);

impl Nickname {
    /// Create a nickname, normalizing and validating the input
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let normalized: String = raw.as_ref().nfkc().collect();
        let trimmed = normalized.trim();

        if trimmed.is_empty() {
            return Err(AppError::bad_request("Nickname cannot be empty"));
        }

        if trimmed.chars().count() > NICKNAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Nickname must be at most {} characters",
                NICKNAME_MAX_LENGTH
            )));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(AppError::bad_request(
                "Nickname cannot contain control characters",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! MFA Proof Value Objects
//!
//! The two ways a user proves the second factor: a 6-digit TOTP code from an
//! authenticator app, or a single-use backup code issued at enrollment.
//! Both travel to the same verification endpoint family with different
//! payload shapes.
//!
//! Non-digit input to the code field is discarded at this boundary, not
//! merely rejected after submission - `sanitize` mirrors what the input
//! field does on every keystroke.

use kernel::error::app_error::{AppError, AppResult};
use std::fmt;

/// Fixed TOTP code length
pub const OTP_CODE_LENGTH: usize = 6;

/// A sanitized 6-digit TOTP code
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    /// Filter raw input down to what the code field accepts
    ///
    /// Keeps ASCII digits only and truncates to six characters, so
    /// `"12a3456!"` becomes `"123456"`.
    pub fn sanitize(raw: &str) -> String {
        raw.chars()
            .filter(char::is_ascii_digit)
            .take(OTP_CODE_LENGTH)
            .collect()
    }

    /// Parse raw input into a complete code
    ///
    /// Sanitizes first; anything short of six digits is rejected.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let code = Self::sanitize(raw);
        if code.len() != OTP_CODE_LENGTH {
            return Err(AppError::bad_request(format!(
                "Enter the {}-digit verification code",
                OTP_CODE_LENGTH
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// One-time codes are short-lived secrets; keep them out of logs.
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(redacted)")
    }
}

/// A single-use recovery code issued at MFA enrollment
#[derive(Clone, PartialEq, Eq)]
pub struct BackupCode(String);

impl BackupCode {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let code = raw.as_ref().trim();
        if code.is_empty() {
            return Err(AppError::bad_request("Enter a backup code"));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BackupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BackupCode(redacted)")
    }
}

/// Second-factor proof submitted for verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MfaProof {
    Totp(OtpCode),
    Backup(BackupCode),
}

impl MfaProof {
    /// The raw value forwarded to the backend
    pub fn value(&self) -> &str {
        match self {
            MfaProof::Totp(code) => code.as_str(),
            MfaProof::Backup(code) => code.as_str(),
        }
    }

    pub const fn is_backup(&self) -> bool {
        matches!(self, MfaProof::Backup(_))
    }
}

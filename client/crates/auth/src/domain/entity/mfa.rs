//! MFA Entities
//!
//! Enrollment material and account MFA status as reported by the backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::value_object::Role;

/// Ephemeral MFA enrollment material
///
/// Returned by the setup call and shown exactly once. Scoped to the active
/// setup screen: dropped (and wiped) when the user enables MFA or cancels,
/// never persisted client-side. Abandoning setup mid-flow performs no
/// cleanup call; whatever the backend already persisted is its business.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MfaSetup {
    /// Shared secret for manual authenticator entry
    pub secret: String,
    /// Scannable provisioning URI / QR image reference
    pub qr_url: String,
    /// Ordered single-use recovery codes
    pub backup_codes: Vec<String>,
}

// Secret and recovery codes must not reach logs; show shape only.
impl fmt::Debug for MfaSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MfaSetup")
            .field("secret", &"redacted")
            .field("qr_url", &self.qr_url)
            .field("backup_codes", &self.backup_codes.len())
            .finish()
    }
}

/// Account MFA status
///
/// Read-mostly; refetched on demand (settings navigation) and never cached
/// across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaStatus {
    pub enabled: bool,
    pub setup_required: bool,
    pub email: String,
    pub has_backup_codes: bool,
    pub mfa_type: String,
}

/// Minimal profile payload from the authenticated probe endpoint
///
/// Route guards only care that the call succeeds; the fields exist so a
/// screen reusing the probe can show something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub nickname: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mfa_setup_debug_redacts_material() {
        let setup = MfaSetup {
            secret: "JBSWY3DPEHPK3PXP".to_string(),
            qr_url: "otpauth://totp/shop:a@b.com".to_string(),
            backup_codes: vec!["AAAA-1111".to_string(), "BBBB-2222".to_string()],
        };
        let rendered = format!("{:?}", setup);
        assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));
        assert!(!rendered.contains("AAAA-1111"));
        assert!(rendered.contains("otpauth://"));
    }

    #[test]
    fn test_mfa_status_wire_shape() {
        let json = r#"{
            "enabled": true,
            "setupRequired": false,
            "email": "a@b.com",
            "hasBackupCodes": true,
            "mfaType": "TOTP"
        }"#;
        let status: MfaStatus = serde_json::from_str(json).unwrap();
        assert!(status.enabled);
        assert!(!status.setup_required);
        assert!(status.has_backup_codes);
        assert_eq!(status.mfa_type, "TOTP");
    }
}

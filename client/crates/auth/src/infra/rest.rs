//! REST Gateway
//!
//! Implements [`AuthGateway`] against the backend's REST surface. The
//! backend is inconsistent about response shapes - some endpoints wrap the
//! payload in a `{ success, message, data }` envelope, others return it
//! bare - so each adapter here normalizes its endpoint's quirk and internal
//! code only ever sees the domain types.

use std::sync::Arc;

use http::StatusCode;
use platform::http::{HttpClient, HttpError};
use serde::Deserialize;

use crate::domain::entity::{Identity, MfaSetup, MfaStatus, Profile};
use crate::domain::gateway::{AuthGateway, LoginReply, SessionGrant};
use crate::domain::value_object::{BearerToken, Email, MfaProof, Nickname, OtpCode, Role};
use crate::error::{AuthError, AuthResult};

const LOGIN_PATH: &str = "/auth/login";
const MFA_SETUP_PATH: &str = "/mfa/setup";
const MFA_VERIFY_PATH: &str = "/mfa/verify";
const MFA_ENABLE_PATH: &str = "/mfa/enable";
const MFA_COMPLETE_PATH: &str = "/mfa/complete";
const MFA_DISABLE_PATH: &str = "/mfa/disable";
const MFA_STATUS_PATH: &str = "/mfa/status";
const PROFILE_PATH: &str = "/users/me/profile";

// ============================================================================
// Wire shapes
// ============================================================================

/// Envelope used by the wrapped endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, surfacing the backend's message on failure
    fn into_data(self, what: &str) -> AuthResult<T> {
        if !self.success {
            let message = self
                .message
                .unwrap_or_else(|| format!("{what} request failed"));
            return Err(AuthError::Internal(message));
        }
        self.data
            .ok_or_else(|| AuthError::Internal(format!("{what} response carried no data")))
    }
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    mfa_required: bool,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct MfaSetupRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MfaSetupPayload {
    qr_url: String,
    secret: String,
    backup_codes: Vec<String>,
}

/// Shared by verify / enable / complete; the proof field differs by path
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct MfaProofRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup_code: Option<&'a str>,
}

impl<'a> MfaProofRequest<'a> {
    fn new(email: &'a Email, proof: &'a MfaProof) -> Self {
        match proof {
            MfaProof::Totp(code) => Self {
                email: email.as_str(),
                token: Some(code.as_str()),
                backup_code: None,
            },
            MfaProof::Backup(code) => Self {
                email: email.as_str(),
                token: None,
                backup_code: Some(code.as_str()),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload {
    token: String,
    nickname: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    role: String,
}

// ============================================================================
// Gateway
// ============================================================================

/// REST implementation of the auth gateway
pub struct RestAuthGateway {
    http: Arc<HttpClient>,
}

impl RestAuthGateway {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Build a grant from a final session payload
    ///
    /// `fallback_email` covers backends that omit the email from the
    /// payload; the flow already knows which account it authenticated.
    fn grant_from(payload: SessionPayload, fallback_email: &Email) -> AuthResult<SessionGrant> {
        let token = BearerToken::new(payload.token)?;
        let nickname = Nickname::new(&payload.nickname)?;
        let role = Role::from_code(&payload.role).ok_or_else(|| {
            AuthError::Validation(format!("unknown role in session payload: {}", payload.role))
        })?;
        let email = match payload.email {
            Some(raw) => Email::new(raw)?,
            None => fallback_email.clone(),
        };
        let name = payload.name.unwrap_or_else(|| payload.nickname.clone());

        Ok(SessionGrant {
            token,
            identity: Identity {
                nickname,
                name,
                email,
                role,
            },
        })
    }
}

impl AuthGateway for RestAuthGateway {
    async fn login(&self, email: &Email, password: &str) -> AuthResult<LoginReply> {
        tracing::debug!("requesting {LOGIN_PATH}");
        let response: LoginResponse = self
            .http
            .post_json(
                LOGIN_PATH,
                &LoginRequest {
                    email: email.as_str(),
                    password,
                },
            )
            .await
            .map_err(|e| {
                // On the login endpoint a 401 means rejected credentials,
                // not an invalidated session; there is no session yet.
                if e.status() == Some(StatusCode::UNAUTHORIZED) {
                    AuthError::CredentialsRejected
                } else {
                    e.into()
                }
            })?;
        tracing::debug!(mfa_required = response.mfa_required, "login response received");

        if response.mfa_required {
            return Ok(LoginReply::MfaRequired {
                email: email.clone(),
            });
        }

        let payload = SessionPayload {
            token: response
                .token
                .ok_or_else(|| AuthError::Validation("login response missing token".into()))?,
            nickname: response
                .nickname
                .ok_or_else(|| AuthError::Validation("login response missing nickname".into()))?,
            name: response.name,
            email: response.email,
            role: response
                .role
                .ok_or_else(|| AuthError::Validation("login response missing role".into()))?,
        };
        Ok(LoginReply::Granted(Self::grant_from(payload, email)?))
    }

    async fn setup_mfa(&self, email: &Email) -> AuthResult<MfaSetup> {
        tracing::debug!("requesting {MFA_SETUP_PATH}");
        let envelope: Envelope<MfaSetupPayload> = self
            .http
            .post_json(
                MFA_SETUP_PATH,
                &MfaSetupRequest {
                    email: email.as_str(),
                },
            )
            .await?;
        let payload = envelope.into_data("MFA setup")?;
        tracing::debug!("MFA setup response received");

        Ok(MfaSetup {
            secret: payload.secret,
            qr_url: payload.qr_url,
            backup_codes: payload.backup_codes,
        })
    }

    async fn verify_mfa(&self, email: &Email, proof: &MfaProof) -> AuthResult<bool> {
        tracing::debug!("requesting {MFA_VERIFY_PATH}");
        // Bare boolean body, no envelope
        let verified: bool = self
            .http
            .post_json(MFA_VERIFY_PATH, &MfaProofRequest::new(email, proof))
            .await?;
        tracing::debug!(verified, "MFA verify response received");
        Ok(verified)
    }

    async fn enable_mfa(&self, email: &Email, code: &OtpCode) -> AuthResult<bool> {
        tracing::debug!("requesting {MFA_ENABLE_PATH}");
        let proof = MfaProof::Totp(code.clone());
        let enabled: bool = self
            .http
            .post_json(MFA_ENABLE_PATH, &MfaProofRequest::new(email, &proof))
            .await?;
        tracing::debug!(enabled, "MFA enable response received");
        Ok(enabled)
    }

    async fn complete_mfa_login(
        &self,
        email: &Email,
        proof: &MfaProof,
    ) -> AuthResult<SessionGrant> {
        tracing::debug!("requesting {MFA_COMPLETE_PATH}");
        let envelope: Envelope<SessionPayload> = self
            .http
            .post_json(MFA_COMPLETE_PATH, &MfaProofRequest::new(email, proof))
            .await?;
        let payload = envelope.into_data("MFA completion")?;
        tracing::debug!("MFA completion response received");

        Self::grant_from(payload, email)
    }

    async fn disable_mfa(&self, email: &Email) -> AuthResult<()> {
        tracing::debug!("requesting {MFA_DISABLE_PATH}");
        self.http
            .delete(&format!("{}/{}", MFA_DISABLE_PATH, email.as_str()))
            .await?;
        tracing::debug!("MFA disable response received");
        Ok(())
    }

    async fn mfa_status(&self, email: &Email) -> AuthResult<MfaStatus> {
        tracing::debug!("requesting {MFA_STATUS_PATH}");
        let envelope: Envelope<MfaStatus> = self
            .http
            .get_json(&format!("{}/{}", MFA_STATUS_PATH, email.as_str()))
            .await?;
        let status = envelope.into_data("MFA status")?;
        tracing::debug!(enabled = status.enabled, "MFA status response received");
        Ok(status)
    }

    async fn fetch_profile(&self) -> AuthResult<Profile> {
        tracing::debug!("requesting {PROFILE_PATH}");
        let profile: Profile = self.http.get_json(PROFILE_PATH).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_mfa_indicator() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"mfaRequired":true,"email":"a@b.com"}"#).unwrap();
        assert!(response.mfa_required);
        assert!(response.token.is_none());
    }

    #[test]
    fn test_login_response_direct_grant() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"token":"tok-1","nickname":"alice","name":"Alice","email":"a@b.com","role":"seller"}"#,
        )
        .unwrap();
        assert!(!response.mfa_required);
        assert_eq!(response.token.as_deref(), Some("tok-1"));
        assert_eq!(response.role.as_deref(), Some("seller"));
    }

    #[test]
    fn test_envelope_unwraps_data() {
        let envelope: Envelope<MfaSetupPayload> = serde_json::from_str(
            r#"{
                "success": true,
                "message": "ok",
                "data": {
                    "qrUrl": "otpauth://totp/x",
                    "secret": "JBSWY3DP",
                    "backupCodes": ["AAAA-1111"]
                },
                "timestamp": "2025-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        let payload = envelope.into_data("MFA setup").unwrap();
        assert_eq!(payload.secret, "JBSWY3DP");
        assert_eq!(payload.backup_codes.len(), 1);
    }

    #[test]
    fn test_envelope_failure_surfaces_message() {
        let envelope: Envelope<MfaSetupPayload> =
            serde_json::from_str(r#"{"success":false,"message":"account not found"}"#).unwrap();
        let err = envelope.into_data("MFA setup").unwrap_err();
        assert!(matches!(err, AuthError::Internal(m) if m == "account not found"));
    }

    #[test]
    fn test_envelope_success_without_data_is_error() {
        let envelope: Envelope<MfaSetupPayload> =
            serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(envelope.into_data("MFA setup").is_err());
    }

    #[test]
    fn test_grant_mapping() {
        let payload = SessionPayload {
            token: "tok-1".to_string(),
            nickname: "alice".to_string(),
            name: None,
            email: None,
            role: "admin".to_string(),
        };
        let fallback = Email::new("alice@example.com").unwrap();

        let grant = RestAuthGateway::grant_from(payload, &fallback).unwrap();
        assert_eq!(grant.token.reveal(), "tok-1");
        assert_eq!(grant.identity.role, Role::Admin);
        // Omitted name falls back to the nickname, omitted email to the
        // account the flow authenticated
        assert_eq!(grant.identity.name, "alice");
        assert_eq!(grant.identity.email, fallback);
    }

    #[test]
    fn test_grant_mapping_rejects_unknown_role() {
        let payload = SessionPayload {
            token: "tok-1".to_string(),
            nickname: "alice".to_string(),
            name: None,
            email: None,
            role: "superuser".to_string(),
        };
        let fallback = Email::new("alice@example.com").unwrap();

        let err = RestAuthGateway::grant_from(payload, &fallback).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn test_proof_request_payload_shapes() {
        let email = Email::new("a@b.com").unwrap();

        let totp = MfaProof::Totp(OtpCode::parse("123456").unwrap());
        let body = serde_json::to_value(MfaProofRequest::new(&email, &totp)).unwrap();
        assert_eq!(body["token"], "123456");
        assert!(body.get("backupCode").is_none());

        let backup = MfaProof::Backup(
            crate::domain::value_object::BackupCode::new("AAAA-1111").unwrap(),
        );
        let body = serde_json::to_value(MfaProofRequest::new(&email, &backup)).unwrap();
        assert_eq!(body["backupCode"], "AAAA-1111");
        assert!(body.get("token").is_none());
    }
}

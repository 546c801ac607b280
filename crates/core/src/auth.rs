//! Authentication models: user identity, request bodies and the CSRF token
//!
//! This module contains zero I/O and is fully testable with fixture data.

use serde::{Deserialize, Deserializer, Serialize};

/// Role string the backend assigns to administrators.
pub const ADMIN_ROLE: &str = "ROLE_ADMIN";

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

/// The logged-in user as returned by `/auth/login`, `/auth/register` and
/// `/auth/user`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }
}

/// Full profile from `/auth/user`; a superset of [`UserIdentity`]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UserProfile {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<UserProfile> for UserIdentity {
    fn from(profile: UserProfile) -> Self {
        UserIdentity {
            id: profile.id,
            username: profile.username,
            email: profile.email,
            avatar: profile.avatar,
            role: profile.role,
        }
    }
}

/// Response of `GET /auth/csrf-token`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CsrfTokenResponse {
    #[serde(rename = "tokenValue")]
    pub token_value: String,
}

/// The backend sends numeric ids; older endpoints send strings.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

// ============================================================================
// Request Bodies (Output to API)
// ============================================================================

#[derive(Debug, Serialize, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub email_verification_code: String,
    pub password: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct VerificationCodeRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct AvatarChangeRequest {
    pub avatar: String,
}

/// Body of `POST /auth/new/admin`
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewAdminRequest {
    pub email: String,
    pub is_root: bool,
    pub password: String,
    pub phone: String,
    pub username: String,
}

impl NewAdminRequest {
    /// Username, email and password must be non-blank.
    pub fn validate(&self) -> Result<(), String> {
        let missing: Vec<&str> = [
            ("username", &self.username),
            ("email", &self.email),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(format!("Missing required field(s): {}", missing.join(", ")))
        }
    }
}

//! Wire types exchanged with the management API
//!
//! Byte fields travel as standard base64 strings.

use serde::{Deserialize, Serialize};

// ============================================================================
// ACCESS KEY STRUCTURES
// ============================================================================

/// Request body for `POST /access_keys`.
///
/// Carries only public material: the exported public key and a detached
/// signature over it made with the matching private key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccessKeyRequest {
    /// Human-readable API key name
    pub name: String,
    /// Exported public key bytes
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    /// Signature over `public_key`
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

/// Access key record returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    /// Backend-assigned identifier
    #[serde(default)]
    pub id: String,
    /// Name echoed back by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation timestamp as reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ============================================================================
// AUTHENTICATION STRUCTURES
// ============================================================================

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Account email
    pub email: &'a str,
    /// Account password
    pub password: &'a str,
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    #[serde(default)]
    pub access_token: String,
}

/// Error body returned by the API on non-success statuses.
///
/// ```json
/// { "code": 40100, "message": "Access token expired" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Service-specific error code
    #[serde(default)]
    pub code: Option<u32>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

mod base64_bytes {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

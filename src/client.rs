//! Management API Client
//!
//! HTTP client for the management service. Provides login and access key
//! creation, and classifies failures so callers know which ones a token
//! refresh can fix.

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::CliConfig;
use crate::models::{AccessKey, ApiErrorBody, CreateAccessKeyRequest, LoginRequest, LoginResponse};

// ============================================================================
// ERRORS
// ============================================================================

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The access token was rejected (401). Recoverable by logging in again.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Message reported by the server
        message: String,
    },

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message reported by the server
        message: String,
    },

    /// Connection, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether a fresh access token may make the request succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Account credentials used to obtain an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

// ============================================================================
// API CLIENT
// ============================================================================

/// HTTP client for the management API.
///
/// Uses blocking HTTP requests (reqwest blocking client).
pub struct ApiClient {
    /// Base URL of the management API (e.g., "https://api.example.com/v1")
    base_url: String,
    /// HTTP client instance
    client: reqwest::blocking::Client,
}

impl ApiClient {
    /// Create a client for `base_url` with the given request timeout.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the management API
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(ApiClient)` - New client instance
    /// * `Err(ApiError)` - The HTTP client could not be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;

        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a client from loaded settings.
    pub fn from_config(config: &CliConfig) -> Result<Self, ApiError> {
        Self::new(
            config.service.api_url.clone(),
            Duration::from_secs(config.service.timeout_secs),
        )
    }

    /// Exchange credentials for an access token.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Access token (may be empty if the server sent none)
    /// * `Err(ApiError)` - Login rejected or request failed
    pub fn login(&self, credentials: &Credentials) -> Result<String, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()?;

        let body = check_status(response)?;
        let parsed: LoginResponse = serde_json::from_str(&body)
            .map_err(|e| ApiError::Decode(format!("POST /auth/login: {}", e)))?;
        Ok(parsed.access_token)
    }

    /// Register a new access key.
    ///
    /// # Arguments
    ///
    /// * `token` - Access token sent as a bearer credential
    /// * `request` - Name, public key and signature to register
    ///
    /// # Returns
    ///
    /// * `Ok(Some(AccessKey))` - Key registered
    /// * `Ok(None)` - Success status with an empty or `null` body
    /// * `Err(ApiError)` - Request rejected or failed
    pub fn create_access_key(
        &self,
        token: &str,
        request: &CreateAccessKeyRequest,
    ) -> Result<Option<AccessKey>, ApiError> {
        let url = format!("{}/access_keys", self.base_url);
        debug!("POST {} (name: {})", url, request.name);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()?;

        let body = check_status(response)?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<AccessKey>>(&body)
            .map_err(|e| ApiError::Decode(format!("POST /access_keys: {}", e)))
    }
}

/// Turns non-success statuses into [`ApiError`] and returns the body text otherwise.
fn check_status(response: reqwest::blocking::Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text()?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| match (b.code, b.message) {
            (Some(code), Some(message)) => Some(format!("{} (code {})", message, code)),
            (None, Some(message)) => Some(message),
            (Some(code), None) => Some(format!("code {}", code)),
            (None, None) => None,
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized { message });
    }

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

//! Access token resolution and the token-refresh retry hook
//!
//! A [`Session`] ties together the API client, the local store and a source of
//! account credentials. Requests go through [`Session::send_with_retry`], which
//! logs in again when the server rejects the token and gives up after the
//! configured number of attempts.

use std::io::{BufRead, Write};
use tracing::{debug, info, warn};

use crate::client::{ApiClient, ApiError, Credentials};
use crate::error::{KeyCliError, Result};
use crate::retry::RetryPolicy;
use crate::store::ConfigStore;

/// Environment variable supplying the account email.
pub const EMAIL_ENV: &str = "APIKEY_CLI_EMAIL";
/// Environment variable supplying the account password.
pub const PASSWORD_ENV: &str = "APIKEY_CLI_PASSWORD";

// ============================================================================
// CREDENTIAL SOURCES
// ============================================================================

/// Supplies account credentials when a login is required.
pub trait CredentialsSource {
    /// Obtain credentials, prompting the operator if needed.
    fn credentials(&self) -> Result<Credentials>;
}

impl CredentialsSource for Credentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

/// Reads credentials from the environment, falling back to a terminal prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptCredentials;

impl CredentialsSource for PromptCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let env_email = std::env::var(EMAIL_ENV).ok().filter(|v| !v.is_empty());
        let env_password = std::env::var(PASSWORD_ENV).ok().filter(|v| !v.is_empty());

        let email = match env_email {
            Some(email) => email,
            None => prompt_line("Email: ")?,
        };
        let password = match env_password {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")
                .map_err(|e| KeyCliError::Auth(format!("Failed to read password: {}", e)))?,
        };

        if email.is_empty() || password.is_empty() {
            return Err(KeyCliError::Auth(
                "Email and password are required to log in".to_string(),
            ));
        }

        Ok(Credentials { email, password })
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{}", prompt)
        .and_then(|_| stderr.flush())
        .map_err(|e| KeyCliError::Auth(format!("Failed to write prompt: {}", e)))?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| KeyCliError::Auth(format!("Failed to read input: {}", e)))?;
    Ok(line.trim().to_string())
}

// ============================================================================
// SESSION
// ============================================================================

/// Authenticated access to the management API.
pub struct Session<C> {
    client: ApiClient,
    store: ConfigStore,
    credentials: C,
}

impl<C: CredentialsSource> Session<C> {
    /// Create a session.
    pub fn new(client: ApiClient, store: ConfigStore, credentials: C) -> Self {
        Self {
            client,
            store,
            credentials,
        }
    }

    /// Local session store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Cached access token, or a fresh one from an interactive login.
    pub fn access_token_or_login(&self) -> Result<String> {
        if let Some(token) = self.store.load_access_token()? {
            debug!("Using cached access token");
            return Ok(token);
        }
        self.login()
    }

    /// Log in and cache the resulting access token.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - New access token
    /// * `Err(KeyCliError::Auth)` - Credentials unavailable, rejected, or no token returned
    pub fn login(&self) -> Result<String> {
        let credentials = self.credentials.credentials()?;
        info!("Logging in as {}", credentials.email);

        let token = self.client.login(&credentials).map_err(|e| match e {
            ApiError::Unauthorized { message } => {
                KeyCliError::Auth(format!("Login rejected: {}", message))
            }
            other => KeyCliError::Auth(format!("Login failed: {}", other)),
        })?;

        if token.is_empty() {
            return Err(KeyCliError::Auth(
                "Login succeeded but no access token was returned".to_string(),
            ));
        }

        self.store.save_access_token(&token)?;
        Ok(token)
    }

    /// Drop the cached access token. Returns whether one was present.
    pub fn logout(&self) -> Result<bool> {
        self.store.clear_access_token()
    }

    /// Retry hook: a fresh token for recoverable errors, the error otherwise.
    pub fn check_retry(&self, err: ApiError) -> Result<String> {
        if !err.is_recoverable() {
            return Err(err.into());
        }

        warn!("Access token rejected ({}), logging in again", err);
        self.store.clear_access_token()?;
        self.login()
    }

    /// Run `send` with an access token, refreshing the token on recoverable
    /// failures until it succeeds or `policy.max_attempts` is reached.
    ///
    /// # Arguments
    ///
    /// * `policy` - Attempt cap and backoff between attempts
    /// * `send` - Performs one request with the given token
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - Result of the first successful attempt
    /// * `Err(KeyCliError::RetriesExhausted)` - Every attempt was unauthorized
    /// * `Err(KeyCliError)` - Terminal request error, or token refresh failed
    pub fn send_with_retry<T, F>(&self, policy: &RetryPolicy, mut send: F) -> Result<T>
    where
        F: FnMut(&ApiClient, &str) -> std::result::Result<T, ApiError>,
    {
        let mut token = self.access_token_or_login()?;
        let mut attempt = 1;

        loop {
            let err = match send(&self.client, &token) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.is_recoverable() && attempt >= policy.max_attempts {
                warn!("Giving up after {} unauthorized attempts", attempt);
                return Err(KeyCliError::RetriesExhausted { attempts: attempt });
            }

            token = self.check_retry(err)?;
            std::thread::sleep(policy.backoff(attempt));
            attempt += 1;
        }
    }
}

//! `create` command: generate a keypair and register it as an API key
//!
//! The private key is returned to the caller once and never persisted. Only
//! the public key and a signature over it are sent to the backend.

use base64::{engine::general_purpose, Engine as _};
use clap::Args;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::auth::{CredentialsSource, Session};
use crate::crypto::KeyProvider;
use crate::error::{KeyCliError, Result};
use crate::models::CreateAccessKeyRequest;
use crate::retry::RetryPolicy;
use crate::store::ConfigStore;

// ============================================================================
// ARGUMENTS
// ============================================================================

/// Arguments of the `create` command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateArgs {
    /// API key name (used when --name is not given)
    #[arg(value_name = "NAME")]
    pub positional_name: Option<String>,

    /// API key name
    #[arg(long)]
    pub name: Option<String>,

    /// Application ID; saved for later invocations
    #[arg(long = "app_id")]
    pub app_id: Option<String>,
}

impl CreateArgs {
    /// Key name from `--name`, else the positional argument.
    pub fn resolve_name(&self) -> Result<String> {
        non_empty(self.name.as_deref())
            .or_else(|| non_empty(self.positional_name.as_deref()))
            .map(str::to_string)
            .ok_or_else(|| {
                KeyCliError::InvalidArguments(
                    "Invalid number of arguments. Please, specify api-key name".to_string(),
                )
            })
    }

    /// Application ID from `--app_id` (persisting it), else from the store.
    pub fn resolve_app_id(&self, store: &ConfigStore) -> Result<String> {
        if let Some(app_id) = non_empty(self.app_id.as_deref()) {
            store.save_app_id(app_id)?;
            debug!("Saved app_id {}", app_id);
            return Ok(app_id.to_string());
        }

        store.load_app_id()?.ok_or_else(|| {
            KeyCliError::MissingConfiguration(
                "Please, specify app_id (flag --app_id)".to_string(),
            )
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ============================================================================
// RESULT
// ============================================================================

/// Newly registered API key.
#[derive(Clone)]
pub struct CreatedApiKey {
    /// Backend-assigned identifier
    pub id: String,
    /// Application the key was created under
    pub app_id: String,
    /// Exported private key; the only copy the caller gets
    pub private_key: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for CreatedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedApiKey")
            .field("id", &self.id)
            .field("app_id", &self.app_id)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// The two lines shown to the operator: `API_KEY:` then `API_KEY_ID:`.
impl std::fmt::Display for CreatedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "API_KEY: {}", self.encoded_private_key())?;
        write!(f, "API_KEY_ID: {}", self.id)
    }
}

impl CreatedApiKey {
    /// Private key in standard base64, as printed to the operator.
    pub fn encoded_private_key(&self) -> String {
        general_purpose::STANDARD.encode(self.private_key.as_slice())
    }
}

// ============================================================================
// OPERATION
// ============================================================================

/// Resolve inputs and create an API key.
///
/// Arguments are resolved before any key generation or network traffic.
pub fn run<P, C>(
    args: &CreateArgs,
    provider: &P,
    session: &Session<C>,
    policy: &RetryPolicy,
) -> Result<CreatedApiKey>
where
    P: KeyProvider,
    C: CredentialsSource,
{
    let name = args.resolve_name()?;
    let app_id = args.resolve_app_id(session.store())?;

    let (id, private_key) = create_api_key(&name, provider, session, policy)?;
    info!("Created API key {} ({}) for app {}", id, name, app_id);

    Ok(CreatedApiKey {
        id,
        app_id,
        private_key,
    })
}

/// Generate a keypair, register its public half under `name`, and return the
/// backend-assigned ID with the exported private key.
///
/// # Returns
///
/// * `Ok((id, private_key))` - Key registered
/// * `Err(KeyCliError::Crypto)` - Key generation, export or signing failed
/// * `Err(KeyCliError::Auth)` - No access token could be obtained
/// * `Err(KeyCliError::Protocol)` - Backend returned no identifier
/// * `Err(KeyCliError)` - Request failed or retries ran out
pub fn create_api_key<P, C>(
    name: &str,
    provider: &P,
    session: &Session<C>,
    policy: &RetryPolicy,
) -> Result<(String, Zeroizing<Vec<u8>>)>
where
    P: KeyProvider,
    C: CredentialsSource,
{
    let key_pair = provider.generate_keypair()?;
    let private_key = provider.export_private_key(&key_pair.private_key)?;
    let public_key = provider.export_public_key(&key_pair.public_key)?;
    let signature = provider.sign(&public_key, &key_pair.private_key)?;

    let request = CreateAccessKeyRequest {
        name: name.to_string(),
        public_key,
        signature,
    };

    let response =
        session.send_with_retry(policy, |client, token| client.create_access_key(token, &request))?;

    let access_key = response
        .filter(|key| !key.id.is_empty())
        .ok_or_else(|| KeyCliError::Protocol("empty response".to_string()))?;

    Ok((access_key.id, private_key))
}

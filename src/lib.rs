//! API key management library
//!
//! Provides key generation, the management API client, local session storage
//! and the commands exposed by the `apikey` binary.

pub mod auth;
pub mod client;
pub mod command;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod retry;
pub mod store;

// Re-export public types for convenience
pub use auth::{CredentialsSource, PromptCredentials, Session};
pub use client::{ApiClient, ApiError, Credentials};
pub use command::{CreateArgs, CreatedApiKey};
pub use config::CliConfig;
pub use crypto::{Ed25519Provider, KeyPair, KeyProvider};
pub use error::{KeyCliError, Result};
pub use models::{AccessKey, CreateAccessKeyRequest};
pub use retry::RetryPolicy;
pub use store::ConfigStore;

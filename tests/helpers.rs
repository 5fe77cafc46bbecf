//! Shared test helpers for apikey-cli integration tests
//!
//! Wraps a wiremock server, the tokio runtime that drives it and a temporary
//! session directory. Blocking client calls are made outside the runtime.

#![allow(dead_code)]

use apikey_cli::{ApiClient, ConfigStore, Credentials, Session};
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Dummy account email
pub const DUMMY_EMAIL: &str = "operator@example.com";

/// Dummy account password
pub const DUMMY_PASSWORD: &str = "correct horse battery staple";

/// Dummy application ID
pub const DUMMY_APP_ID: &str = "app-123";

/// Access token cached before the test starts
pub const STALE_TOKEN: &str = "stale-token";

/// Access token returned by the mocked login endpoint
pub const FRESH_TOKEN: &str = "fresh-token";

/// Authorization header carrying STALE_TOKEN
pub const STALE_AUTH: &str = "Bearer stale-token";

/// Authorization header carrying FRESH_TOKEN
pub const FRESH_AUTH: &str = "Bearer fresh-token";

// ============================================================================
// TEST ENVIRONMENT
// ============================================================================

/// Mock management API plus an isolated session store.
pub struct TestEnv {
    pub server: MockServer,
    pub rt: Runtime,
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        let dir = tempfile::tempdir().unwrap();
        Self { server, rt, dir }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::new(self.dir.path())
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.server.uri(), Duration::from_secs(5)).unwrap()
    }

    pub fn session(&self) -> Session<Credentials> {
        Session::new(self.client(), self.store(), dummy_credentials())
    }

    /// Requests received on `path`, in arrival order.
    pub fn requests_to(&self, path: &str) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }
}

pub fn dummy_credentials() -> Credentials {
    Credentials {
        email: DUMMY_EMAIL.to_string(),
        password: DUMMY_PASSWORD.to_string(),
    }
}

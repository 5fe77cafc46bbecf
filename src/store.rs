//! Local session storage
//!
//! Persists the application ID and the cached access token between
//! invocations in a single `session.toml` file under the CLI home directory.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{KeyCliError, Result};

/// Environment variable overriding the CLI home directory.
pub const HOME_ENV: &str = "APIKEY_CLI_HOME";

const SESSION_FILE: &str = "session.toml";
const SESSION_TMP_FILE: &str = "session.toml.tmp";

/// On-disk session contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
}

/// File-backed store for the application ID and access token.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at `$APIKEY_CLI_HOME`, or `~/.apikey-cli`.
    pub fn open_default() -> Result<Self> {
        if let Ok(dir) = std::env::var(HOME_ENV) {
            if !dir.is_empty() {
                return Ok(Self::new(dir));
            }
        }

        let home = dirs::home_dir().ok_or_else(|| {
            KeyCliError::Storage(format!(
                "Cannot determine home directory; set {} to choose a location",
                HOME_ENV
            ))
        })?;
        Ok(Self::new(home.join(".apikey-cli")))
    }

    /// Directory holding the session and settings files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Stored application ID, `None` if never saved.
    ///
    /// A session file that exists but cannot be read or parsed is an error,
    /// not an absent value.
    pub fn load_app_id(&self) -> Result<Option<String>> {
        Ok(self.read()?.app_id.filter(|id| !id.is_empty()))
    }

    /// Persist the application ID, keeping the cached token.
    pub fn save_app_id(&self, app_id: &str) -> Result<()> {
        let mut session = self.read_for_update()?;
        session.app_id = Some(app_id.to_string());
        self.write(&session)
    }

    /// Cached access token, `None` if not logged in.
    pub fn load_access_token(&self) -> Result<Option<String>> {
        Ok(self.read()?.access_token.filter(|t| !t.is_empty()))
    }

    /// Cache an access token, keeping the application ID.
    pub fn save_access_token(&self, token: &str) -> Result<()> {
        let mut session = self.read_for_update()?;
        session.access_token = Some(token.to_string());
        self.write(&session)
    }

    /// Drop the cached access token. Returns whether one was present.
    pub fn clear_access_token(&self) -> Result<bool> {
        let mut session = self.read_for_update()?;
        let had_token = session.access_token.take().is_some();
        if had_token {
            self.write(&session)?;
        }
        Ok(had_token)
    }

    fn read(&self) -> Result<StoredSession> {
        let path = self.session_path();
        match self.read_raw()? {
            Some(content) => toml::from_str(&content).map_err(|e| {
                KeyCliError::storage(&format!("Failed to parse {}", path.display()), e)
            }),
            None => Ok(StoredSession::default()),
        }
    }

    /// Current contents for a read-modify-write. An unparsable file is
    /// replaced rather than blocking every later save.
    fn read_for_update(&self) -> Result<StoredSession> {
        let path = self.session_path();
        let Some(content) = self.read_raw()? else {
            return Ok(StoredSession::default());
        };

        match toml::from_str(&content) {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("Replacing unreadable session file {}: {}", path.display(), e);
                Ok(StoredSession::default())
            }
        }
    }

    fn read_raw(&self) -> Result<Option<String>> {
        let path = self.session_path();
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KeyCliError::storage(
                &format!("Failed to read {}", path.display()),
                e,
            )),
        }
    }

    /// Writes `session` to a temporary file and renames it into place, so an
    /// interrupted write never leaves a partial session file behind.
    fn write(&self, session: &StoredSession) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            KeyCliError::storage(&format!("Failed to create {}", self.dir.display()), e)
        })?;

        let path = self.session_path();
        let tmp_path = self.dir.join(SESSION_TMP_FILE);
        let content = toml::to_string(session)
            .map_err(|e| KeyCliError::storage("Failed to encode session", e))?;

        let mut file = open_private(&tmp_path).map_err(|e| {
            KeyCliError::storage(&format!("Failed to open {}", tmp_path.display()), e)
        })?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                KeyCliError::storage(&format!("Failed to write {}", tmp_path.display()), e)
            })?;
        drop(file);

        std::fs::rename(&tmp_path, &path).map_err(|e| {
            KeyCliError::storage(&format!("Failed to replace {}", path.display()), e)
        })?;

        debug!("Session saved to {}", path.display());
        Ok(())
    }
}

// The session file holds a bearer token; keep it owner-only.
// `mode` only applies on creation, so a leftover temp file is tightened too.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

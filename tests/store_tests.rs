//! Unit tests for the local session store

mod helpers;

use apikey_cli::command::session;
use apikey_cli::{ConfigStore, KeyCliError};
use helpers::{TestEnv, FRESH_TOKEN};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Truncated write left behind by an interrupted process
const CORRUPT_SESSION: &str = "access_token = \"tok";

/// What is tested: an empty directory has no app_id or token
/// Why: First run must read as "not configured", not as an error
#[test]
fn test_missing_session_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path().join("not-created-yet"));

    assert_eq!(store.load_app_id().unwrap(), None);
    assert_eq!(store.load_access_token().unwrap(), None);
}

/// What is tested: app_id and token are stored independently in one file
/// Why: Saving one value must not drop the other
#[test]
fn test_app_id_and_token_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());

    store.save_app_id("app-123").unwrap();
    store.save_access_token("token-1").unwrap();
    store.save_app_id("app-456").unwrap();

    let reopened = ConfigStore::new(dir.path());
    assert_eq!(reopened.load_app_id().unwrap().as_deref(), Some("app-456"));
    assert_eq!(reopened.load_access_token().unwrap().as_deref(), Some("token-1"));
}

/// What is tested: clear_access_token removes only the token
/// Why: Logging out must keep the remembered application
#[test]
fn test_clear_access_token_keeps_app_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());
    store.save_app_id("app-123").unwrap();
    store.save_access_token("token-1").unwrap();

    assert!(store.clear_access_token().unwrap());
    assert!(!store.clear_access_token().unwrap());
    assert_eq!(store.load_access_token().unwrap(), None);
    assert_eq!(store.load_app_id().unwrap().as_deref(), Some("app-123"));
}

/// What is tested: a corrupt session file is a storage error
/// Why: Storage failures must be distinguishable from a missing app_id
#[test]
fn test_corrupt_session_file_is_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.toml"), "app_id = [unterminated").unwrap();
    let store = ConfigStore::new(dir.path());

    assert!(matches!(store.load_app_id(), Err(KeyCliError::Storage(_))));
}

/// What is tested: session file is readable by its owner only
/// Why: It holds a bearer token
#[cfg(unix)]
#[test]
fn test_session_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::new(dir.path());
    store.save_access_token("token-1").unwrap();

    let mode = std::fs::metadata(dir.path().join("session.toml"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

/// What is tested: an existing world-readable session file is tightened on save
/// Why: Creation-time modes do not apply to files that already exist
#[cfg(unix)]
#[test]
fn test_existing_loose_session_file_becomes_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("session.toml");
    std::fs::write(&session_path, "app_id = \"app-123\"\n").unwrap();
    std::fs::set_permissions(&session_path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let store = ConfigStore::new(dir.path());
    store.save_access_token("token-1").unwrap();

    let mode = std::fs::metadata(&session_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    assert_eq!(store.load_app_id().unwrap().as_deref(), Some("app-123"));
}

// ============================================================================
// CORRUPT SESSION RECOVERY TESTS
// ============================================================================

/// What is tested: saving an app_id replaces a corrupt session file
/// Why: `create --app_id` must not be blocked by a truncated earlier write
#[test]
fn test_save_app_id_recovers_corrupt_session_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.toml"), CORRUPT_SESSION).unwrap();
    let store = ConfigStore::new(dir.path());

    store.save_app_id("app-123").unwrap();

    assert_eq!(store.load_app_id().unwrap().as_deref(), Some("app-123"));
    assert_eq!(store.load_access_token().unwrap(), None);
    assert!(!dir.path().join("session.toml.tmp").exists());
}

/// What is tested: clearing the token over a corrupt file does not fail
/// Why: Logout is the first thing an operator tries on a broken session
#[test]
fn test_clear_access_token_tolerates_corrupt_session_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("session.toml"), CORRUPT_SESSION).unwrap();
    let store = ConfigStore::new(dir.path());

    assert!(!store.clear_access_token().unwrap());
}

/// What is tested: login succeeds over a corrupt session file and rewrites it
/// Why: Explicit login is how operators recover from a bad session
#[test]
fn test_login_recovers_corrupt_session_file() {
    let env = TestEnv::new();
    std::fs::write(env.dir.path().join("session.toml"), CORRUPT_SESSION).unwrap();
    assert!(matches!(env.store().load_access_token(), Err(KeyCliError::Storage(_))));
    env.mount(
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": FRESH_TOKEN })),
            ),
    );

    session::login(&env.session()).unwrap();

    assert_eq!(env.store().load_access_token().unwrap().as_deref(), Some(FRESH_TOKEN));
}

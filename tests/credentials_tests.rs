//! Tests for reading login credentials from the environment
//!
//! These tests mutate process-wide environment variables and run serially.

mod helpers;

use apikey_cli::auth::{EMAIL_ENV, PASSWORD_ENV};
use apikey_cli::command::session;
use apikey_cli::{CredentialsSource, PromptCredentials, Session};
use helpers::{TestEnv, DUMMY_EMAIL, DUMMY_PASSWORD, FRESH_TOKEN};
use serde_json::json;
use serial_test::serial;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

/// Sets both credential variables and removes them again on drop.
struct EnvCredentials;

impl EnvCredentials {
    fn set(email: &str, password: &str) -> Self {
        std::env::set_var(EMAIL_ENV, email);
        std::env::set_var(PASSWORD_ENV, password);
        EnvCredentials
    }
}

impl Drop for EnvCredentials {
    fn drop(&mut self) {
        std::env::remove_var(EMAIL_ENV);
        std::env::remove_var(PASSWORD_ENV);
    }
}

/// What is tested: both credentials are taken from the environment
/// Why: Non-interactive use (CI) must log in without a terminal prompt
#[test]
#[serial]
fn test_credentials_from_environment() {
    let _env = EnvCredentials::set(DUMMY_EMAIL, DUMMY_PASSWORD);

    let credentials = PromptCredentials.credentials().unwrap();

    assert_eq!(credentials.email, DUMMY_EMAIL);
    assert_eq!(credentials.password, DUMMY_PASSWORD);
}

/// What is tested: login with environment credentials posts them to the server
/// Why: The variables must reach the login request unchanged
#[test]
#[serial]
fn test_login_with_environment_credentials() {
    let _env = EnvCredentials::set(DUMMY_EMAIL, DUMMY_PASSWORD);
    let env = TestEnv::new();
    env.mount(
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({
                "email": DUMMY_EMAIL,
                "password": DUMMY_PASSWORD
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": FRESH_TOKEN })),
            ),
    );
    let session = Session::new(env.client(), env.store(), PromptCredentials);

    session::login(&session).unwrap();

    assert_eq!(env.requests_to("/auth/login").len(), 1);
    assert_eq!(env.store().load_access_token().unwrap().as_deref(), Some(FRESH_TOKEN));
}

//! `login` and `logout` commands

use tracing::info;

use crate::auth::{CredentialsSource, Session};
use crate::error::Result;

/// Log in unconditionally and cache the new access token.
pub fn login<C: CredentialsSource>(session: &Session<C>) -> Result<()> {
    session.login()?;
    info!("Access token cached in {}", session.store().dir().display());
    Ok(())
}

/// Forget the cached access token. Returns whether one was cached.
pub fn logout<C: CredentialsSource>(session: &Session<C>) -> Result<bool> {
    session.logout()
}

//! CLI commands
//!
//! Each command returns its outcome; printing is left to the binary.

pub mod create;
pub mod session;

pub use create::{CreateArgs, CreatedApiKey};

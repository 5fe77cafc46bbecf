//! Cryptographic operations for API key creation
//!
//! This module provides the key provider abstraction and its Ed25519
//! implementation.

pub mod provider;

// Re-export for convenience
pub use provider::{Ed25519Provider, KeyPair, KeyProvider};

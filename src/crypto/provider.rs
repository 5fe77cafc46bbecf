//! Key provider abstraction and Ed25519 implementation
//!
//! The create operation receives a [`KeyProvider`] instead of reaching for a
//! process-wide crypto instance, so tests can substitute their own provider.

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{KeyCliError, Result};

// ============================================================================
// KEY PROVIDER TRAIT
// ============================================================================

/// A freshly generated public/private key pair.
#[derive(Debug, Clone)]
pub struct KeyPair<Sk, Pk> {
    /// Private half, never leaves the process except through export
    pub private_key: Sk,
    /// Public half, registered with the backend
    pub public_key: Pk,
}

/// Asymmetric key operations needed to register an API key.
///
/// Exported private keys are returned in zeroizing buffers.
pub trait KeyProvider {
    /// Provider-native private key
    type PrivateKey;
    /// Provider-native public key
    type PublicKey;

    /// Generate a new key pair.
    fn generate_keypair(&self) -> Result<KeyPair<Self::PrivateKey, Self::PublicKey>>;

    /// Export a private key to bytes without a passphrase.
    fn export_private_key(&self, key: &Self::PrivateKey) -> Result<Zeroizing<Vec<u8>>>;

    /// Export a public key to bytes.
    fn export_public_key(&self, key: &Self::PublicKey) -> Result<Vec<u8>>;

    /// Produce a detached signature over `payload`.
    fn sign(&self, payload: &[u8], key: &Self::PrivateKey) -> Result<Vec<u8>>;

    /// Import a private key previously produced by [`KeyProvider::export_private_key`].
    fn import_private_key(&self, bytes: &[u8]) -> Result<Self::PrivateKey>;

    /// Import a public key previously produced by [`KeyProvider::export_public_key`].
    fn import_public_key(&self, bytes: &[u8]) -> Result<Self::PublicKey>;

    /// Derive the public key belonging to a private key.
    fn public_key_of(&self, key: &Self::PrivateKey) -> Self::PublicKey;

    /// Check a detached signature. Malformed signatures verify as `false`.
    fn verify(&self, payload: &[u8], signature: &[u8], key: &Self::PublicKey) -> bool;
}

// ============================================================================
// ED25519 PROVIDER
// ============================================================================

/// Ed25519 keys exported as PKCS#8 (private) and SubjectPublicKeyInfo (public) DER.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Provider;

impl Ed25519Provider {
    /// Create a new provider.
    pub fn new() -> Self {
        Self
    }
}

impl KeyProvider for Ed25519Provider {
    type PrivateKey = SigningKey;
    type PublicKey = VerifyingKey;

    fn generate_keypair(&self) -> Result<KeyPair<SigningKey, VerifyingKey>> {
        let mut rng = rand::rngs::OsRng;
        let mut secret_key_bytes = Zeroizing::new([0u8; 32]);
        rng.try_fill_bytes(&mut secret_key_bytes[..])
            .map_err(|e| KeyCliError::crypto("Failed to gather randomness", e))?;

        let private_key = SigningKey::from_bytes(&secret_key_bytes);
        let public_key = private_key.verifying_key();
        Ok(KeyPair {
            private_key,
            public_key,
        })
    }

    fn export_private_key(&self, key: &SigningKey) -> Result<Zeroizing<Vec<u8>>> {
        let document = key
            .to_pkcs8_der()
            .map_err(|e| KeyCliError::crypto("Failed to export private key", e))?;
        Ok(Zeroizing::new(document.as_bytes().to_vec()))
    }

    fn export_public_key(&self, key: &VerifyingKey) -> Result<Vec<u8>> {
        let document = key
            .to_public_key_der()
            .map_err(|e| KeyCliError::crypto("Failed to export public key", e))?;
        Ok(document.as_bytes().to_vec())
    }

    fn sign(&self, payload: &[u8], key: &SigningKey) -> Result<Vec<u8>> {
        let signature = key
            .try_sign(payload)
            .map_err(|e| KeyCliError::crypto("Failed to sign payload", e))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn import_private_key(&self, bytes: &[u8]) -> Result<SigningKey> {
        SigningKey::from_pkcs8_der(bytes)
            .map_err(|e| KeyCliError::crypto("Failed to import private key", e))
    }

    fn import_public_key(&self, bytes: &[u8]) -> Result<VerifyingKey> {
        VerifyingKey::from_public_key_der(bytes)
            .map_err(|e| KeyCliError::crypto("Failed to import public key", e))
    }

    fn public_key_of(&self, key: &SigningKey) -> VerifyingKey {
        key.verifying_key()
    }

    fn verify(&self, payload: &[u8], signature: &[u8], key: &VerifyingKey) -> bool {
        match Signature::from_slice(signature) {
            Ok(signature) => key.verify_strict(payload, &signature).is_ok(),
            Err(_) => false,
        }
    }
}

use std::sync::Arc;

use thiserror::Error;

/// Errors produced by crypter (encryption backend) implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrypterError {
    /// Key material could not initialize the cipher.
    #[error("cipher setup failed: {reason}")]
    CipherSetup { reason: String },
    /// The random source could not produce a nonce.
    #[error("nonce generation failed: {reason}")]
    NonceGeneration { reason: String },
    /// Envelope is too short to contain its nonce.
    #[error("malformed envelope: {len} bytes, need at least {expected}")]
    MalformedEnvelope { len: usize, expected: usize },
    /// Tag did not verify: wrong key or tampered ciphertext.
    #[error("authentication failed: wrong key or corrupted data")]
    Authentication,
    /// Any other backend-specific failure.
    #[error("crypter failure: {reason}")]
    Backend { reason: String },
}

/// Stateless transformation between plaintext and a stored envelope, keyed by a
/// caller-supplied passphrase.
pub trait Crypter: Send + Sync {
    fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CrypterError>;

    fn decrypt(&self, key: &str, envelope: &[u8]) -> Result<Vec<u8>, CrypterError>;
}

impl<T: Crypter + ?Sized> Crypter for Box<T> {
    fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CrypterError> {
        (**self).encrypt(key, plaintext)
    }

    fn decrypt(&self, key: &str, envelope: &[u8]) -> Result<Vec<u8>, CrypterError> {
        (**self).decrypt(key, envelope)
    }
}

impl<T: Crypter + ?Sized> Crypter for Arc<T> {
    fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CrypterError> {
        (**self).encrypt(key, plaintext)
    }

    fn decrypt(&self, key: &str, envelope: &[u8]) -> Result<Vec<u8>, CrypterError> {
        (**self).decrypt(key, envelope)
    }
}

/// Identity crypter for exercising a `Manager` in isolation.
/// It does not encrypt anything; never use it for real secrets.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCrypter;

impl Crypter for PassthroughCrypter {
    fn encrypt(&self, _key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CrypterError> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, _key: &str, envelope: &[u8]) -> Result<Vec<u8>, CrypterError> {
        Ok(envelope.to_vec())
    }
}

//! Encryption backends for Sekrat.
//! AES-256-GCM keyed by a passphrase, with the nonce carried in front of the ciphertext.

pub mod gcm;
pub mod key;

pub use gcm::{AesGcmCrypter, GcmCrypter, StandardNonceAesGcmCrypter};
pub use key::NormalizedKey;

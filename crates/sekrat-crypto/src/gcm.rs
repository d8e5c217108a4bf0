use std::{fmt, marker::PhantomData};

use aes_gcm::{
    aead::{
        consts::{U12, U16},
        generic_array::{ArrayLength, GenericArray},
        Aead, KeyInit,
    },
    aes::Aes256,
    AesGcm,
};
use rand::{rngs::OsRng, RngCore};
use sekrat_core::{Crypter, CrypterError};
use tracing::trace;

use crate::key::NormalizedKey;

/// Length of the GCM authentication tag appended to every sealed payload.
pub const TAG_LEN: usize = 16;

/// AES-256-GCM crypter whose envelope is `nonce || ciphertext || tag`, with a
/// nonce of `N` bytes drawn fresh from the OS RNG on every call.
///
/// There is no version byte or algorithm tag in the envelope, so envelopes from
/// different `N` (or a different crypter altogether) are not interchangeable.
pub struct GcmCrypter<N> {
    nonce: PhantomData<fn() -> N>,
}

/// Default crypter: 16-byte nonce.
pub type AesGcmCrypter = GcmCrypter<U16>;

/// Conventional 96-bit nonce variant. Produces the layout older stores wrote, so
/// use it to read those back.
pub type StandardNonceAesGcmCrypter = GcmCrypter<U12>;

impl<N: ArrayLength<u8>> GcmCrypter<N> {
    pub const NONCE_LEN: usize = N::USIZE;

    pub fn new() -> Self {
        Self { nonce: PhantomData }
    }

    /// Bytes added to a plaintext by `encrypt`.
    pub fn overhead(&self) -> usize {
        Self::NONCE_LEN + TAG_LEN
    }

    fn cipher(key: &str) -> Result<AesGcm<Aes256, N>, CrypterError> {
        let key = NormalizedKey::from_passphrase(key);
        AesGcm::<Aes256, N>::new_from_slice(key.as_bytes()).map_err(|err| {
            CrypterError::CipherSetup {
                reason: err.to_string(),
            }
        })
    }
}

impl<N: ArrayLength<u8>> Default for GcmCrypter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for GcmCrypter<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for GcmCrypter<N> {}

impl<N: ArrayLength<u8>> fmt::Debug for GcmCrypter<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcmCrypter")
            .field("nonce_len", &Self::NONCE_LEN)
            .finish()
    }
}

impl<N: ArrayLength<u8>> Crypter for GcmCrypter<N> {
    fn encrypt(&self, key: &str, plaintext: &[u8]) -> Result<Vec<u8>, CrypterError> {
        let cipher = Self::cipher(key)?;

        let mut envelope: Vec<u8> = Vec::with_capacity(plaintext.len() + self.overhead());
        envelope.resize(Self::NONCE_LEN, 0);
        OsRng
            .try_fill_bytes(&mut envelope)
            .map_err(|err| CrypterError::NonceGeneration {
                reason: err.to_string(),
            })?;

        let sealed = cipher
            .encrypt(GenericArray::from_slice(&envelope), plaintext)
            .map_err(|err| CrypterError::Backend {
                reason: format!("seal failed: {err}"),
            })?;
        trace!(
            plaintext_len = plaintext.len(),
            envelope_len = Self::NONCE_LEN + sealed.len(),
            "sealed envelope"
        );

        envelope.extend_from_slice(&sealed);
        Ok(envelope)
    }

    fn decrypt(&self, key: &str, envelope: &[u8]) -> Result<Vec<u8>, CrypterError> {
        let cipher = Self::cipher(key)?;

        if envelope.len() < Self::NONCE_LEN {
            return Err(CrypterError::MalformedEnvelope {
                len: envelope.len(),
                expected: Self::NONCE_LEN,
            });
        }
        let (nonce, sealed) = envelope.split_at(Self::NONCE_LEN);

        cipher
            .decrypt(GenericArray::from_slice(nonce), sealed)
            .map_err(|_| CrypterError::Authentication)
    }
}

#[cfg(test)]
mod tests {
    use aes_gcm::Aes256Gcm;

    use super::*;

    const KEY: &str = "correct horse battery staple";

    #[test]
    fn round_trip_restores_plaintext() {
        let crypter = AesGcmCrypter::new();
        let cases: [&[u8]; 4] = [b"", b"x", b"i am some data", &[0xAB; 4096]];
        for plaintext in cases {
            let envelope = crypter.encrypt(KEY, plaintext).expect("encrypt");
            let decrypted = crypter.decrypt(KEY, &envelope).expect("decrypt");
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn envelope_is_nonce_then_sealed_payload() {
        let crypter = AesGcmCrypter::new();
        let plaintext = b"hello-sekrat";
        let envelope = crypter.encrypt(KEY, plaintext).expect("encrypt");

        assert_eq!(AesGcmCrypter::NONCE_LEN, 16);
        assert_eq!(envelope.len(), 16 + plaintext.len() + TAG_LEN);
        assert_eq!(crypter.overhead(), 32);
        assert!(
            !envelope
                .windows(plaintext.len())
                .any(|w| w == plaintext.as_slice()),
            "plaintext must not appear in the envelope"
        );
    }

    #[test]
    fn flipping_any_sealed_bit_fails_authentication() {
        let crypter = AesGcmCrypter::new();
        let envelope = crypter.encrypt(KEY, b"tamper").expect("encrypt");

        for byte in AesGcmCrypter::NONCE_LEN..envelope.len() {
            for bit in 0..8 {
                let mut tampered = envelope.clone();
                tampered[byte] ^= 1 << bit;
                let err = crypter
                    .decrypt(KEY, &tampered)
                    .expect_err("tampered envelope must not open");
                assert_eq!(err, CrypterError::Authentication);
            }
        }
    }

    #[test]
    fn tampered_nonce_fails_authentication() {
        let crypter = AesGcmCrypter::new();
        let mut envelope = crypter.encrypt(KEY, b"tamper").expect("encrypt");
        envelope[0] ^= 0x01;

        let err = crypter.decrypt(KEY, &envelope).expect_err("should fail");
        assert_eq!(err, CrypterError::Authentication);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let crypter = AesGcmCrypter::new();
        let envelope = crypter.encrypt("key-one", b"secret").expect("encrypt");

        let err = crypter.decrypt("key-two", &envelope).expect_err("should fail");
        assert_eq!(err, CrypterError::Authentication);
    }

    #[test]
    fn nonces_differ_between_calls() {
        let crypter = AesGcmCrypter::new();
        let first = crypter.encrypt(KEY, b"same").expect("encrypt");
        let second = crypter.encrypt(KEY, b"same").expect("encrypt");

        assert_ne!(
            first[..AesGcmCrypter::NONCE_LEN],
            second[..AesGcmCrypter::NONCE_LEN]
        );
        assert_ne!(first, second);
    }

    #[test]
    fn envelope_shorter_than_nonce_is_malformed() {
        let crypter = AesGcmCrypter::new();
        let err = crypter.decrypt(KEY, &[0u8; 5]).expect_err("should fail");
        assert_eq!(
            err,
            CrypterError::MalformedEnvelope {
                len: 5,
                expected: 16
            }
        );

        let err = crypter.decrypt(KEY, &[]).expect_err("should fail");
        assert!(matches!(err, CrypterError::MalformedEnvelope { len: 0, .. }));
    }

    #[test]
    fn envelope_without_tag_fails_authentication() {
        let crypter = AesGcmCrypter::new();
        let err = crypter.decrypt(KEY, &[0u8; 20]).expect_err("should fail");
        assert_eq!(err, CrypterError::Authentication);
    }

    #[test]
    fn standard_nonce_variant_uses_twelve_bytes() {
        let crypter = StandardNonceAesGcmCrypter::new();
        let envelope = crypter.encrypt(KEY, b"abc").expect("encrypt");

        assert_eq!(envelope.len(), 12 + 3 + TAG_LEN);
        assert_eq!(crypter.decrypt(KEY, &envelope).expect("decrypt"), b"abc");
    }

    #[test]
    fn standard_nonce_variant_reads_plain_aes256gcm_envelopes() {
        let key = NormalizedKey::from_passphrase(KEY);
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes()).expect("cipher");
        let nonce = [7u8; 12];
        let sealed = cipher
            .encrypt(GenericArray::from_slice(&nonce), &b"legacy secret"[..])
            .expect("seal");
        let mut envelope = nonce.to_vec();
        envelope.extend_from_slice(&sealed);

        let crypter = StandardNonceAesGcmCrypter::new();
        assert_eq!(
            crypter.decrypt(KEY, &envelope).expect("decrypt"),
            b"legacy secret"
        );
    }

    #[test]
    fn nonce_variants_do_not_interoperate() {
        let envelope = AesGcmCrypter::new().encrypt(KEY, b"x").expect("encrypt");
        let err = StandardNonceAesGcmCrypter::new()
            .decrypt(KEY, &envelope)
            .expect_err("should fail");
        assert_eq!(err, CrypterError::Authentication);
    }

    #[test]
    fn works_behind_trait_object() {
        let crypter: Box<dyn Crypter> = Box::new(AesGcmCrypter::default());
        let envelope = crypter.encrypt(KEY, b"boxed").expect("encrypt");
        assert_eq!(crypter.decrypt(KEY, &envelope).expect("decrypt"), b"boxed");
    }
}

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

/// Length of a normalized key (AES-256).
pub const KEY_LEN: usize = 32;

/// A passphrase hashed down to a fixed 256-bit key. Wiped on drop.
///
/// This is a plain SHA-256 of the passphrase: no salt, no work factor, the same
/// passphrase always yields the same key. It is only as strong as the passphrase
/// itself and is not suitable for low-entropy passwords. Changing the derivation
/// would make every previously stored envelope unreadable.
pub struct NormalizedKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl NormalizedKey {
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl std::fmt::Debug for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NormalizedKey(..)")
    }
}

//! Passphrase to cipher key normalization
//!
//! The key is the passphrase itself, repeated or truncated to exactly
//! [`KEY_LEN`] bytes. There is no hashing, no salt and no stretching, so the
//! derived key has no cryptographic strength beyond the passphrase text:
//! a short passphrase repeats into a low-entropy, structurally predictable
//! key. This reproduces the behavior of existing `.ssf` files and must not be
//! mistaken for a real KDF.

use crate::passphrase::Passphrase;
use zeroize::Zeroizing;

/// Length of the AES-128 key in bytes
pub const KEY_LEN: usize = 16;

/// Byte substituted for UTF-16 units that have no single-byte ASCII encoding.
const REPLACEMENT_BYTE: u8 = b'?';

/// A 128-bit cipher key, wiped from memory when dropped.
pub struct CipherKey(Zeroizing<[u8; KEY_LEN]>);

impl CipherKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CipherKey(..)")
    }
}

/// Turn a passphrase into a 16-byte key.
///
/// - exactly 16 units: the key is the passphrase bytes
/// - shorter: the passphrase is repeated unmodified until at least 16
///   units are available, then truncated
/// - longer: truncated to the first 16 units
///
/// Length is counted in UTF-16 code units, which is how existing `.ssf`
/// files were keyed. Each unit maps to one byte; any unit outside ASCII
/// becomes `?`, so `"pässword"` and `"p?ssword"` produce the same key and a
/// character outside the Basic Multilingual Plane (a surrogate pair)
/// contributes `??`.
pub fn normalize(passphrase: &Passphrase) -> CipherKey {
    let text = passphrase.expose();
    let unit_count = text.encode_utf16().count();
    if unit_count != KEY_LEN {
        tracing::debug!(
            length = unit_count,
            "passphrase length is not {KEY_LEN}, repeating/truncating"
        );
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    // Passphrase guarantees at least one unit, so cycle() never stalls.
    for (slot, unit) in key.iter_mut().zip(text.encode_utf16().cycle()) {
        *slot = u8::try_from(unit)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or(REPLACEMENT_BYTE);
    }
    CipherKey(key)
}

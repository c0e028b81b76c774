//! Secured container encoding using AES-128-CBC
//!
//! The container format is:
//! - iv: 16 bytes, random per encryption, stored unencrypted
//! - ciphertext: AES-128-CBC over the whole plaintext with PKCS#7 padding
//!
//! There is no magic number, no length field and no integrity tag. A wrong
//! key or a corrupted ciphertext is usually caught by the padding check,
//! but a corruption that happens to leave valid padding decrypts to garbage.

use crate::error::{ErrorCategory, ErrorKind, Result, SecureFileError};
use crate::keys::CipherKey;
use aes::Aes128;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::TryRng;
use rand::rngs::SysRng;
use std::io::{self, Read, Write};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

/// Length of the initialization vector in bytes
pub const IV_LEN: usize = 16;

/// An encrypted container: the IV followed by the CBC ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

impl Container {
    /// Serialized form: iv(16) + ciphertext
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut output = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        output.extend_from_slice(&self.iv);
        output.extend_from_slice(&self.ciphertext);
        output
    }

    /// Write the IV, then the ciphertext, with no separator.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.iv)?;
        writer.write_all(&self.ciphertext)
    }
}

/// Encrypt plaintext under `key` with a fresh random IV.
pub fn encrypt(plaintext: &[u8], key: &CipherKey) -> Result<Container> {
    let mut iv = [0u8; IV_LEN];
    SysRng.try_fill_bytes(&mut iv).map_err(|e| {
        SecureFileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Cipher,
            "failed to generate initialization vector",
            e,
        )
    })?;

    Ok(encrypt_with_iv(plaintext, key, &iv))
}

/// Encrypt plaintext under `key` with the provided IV.
///
/// Reusing an IV with the same key leaks whether two plaintexts share a
/// prefix. Outside of tests, use [`encrypt`].
pub fn encrypt_with_iv(plaintext: &[u8], key: &CipherKey, iv: &[u8; IV_LEN]) -> Container {
    let ciphertext = Aes128CbcEnc::new(key.as_bytes().into(), iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Container {
        iv: *iv,
        ciphertext,
    }
}

/// Decrypt a serialized container held in memory.
pub fn decrypt(container: &[u8], key: &CipherKey) -> Result<Vec<u8>> {
    decrypt_from(container, key)
}

/// Decrypt a container read from `reader`.
///
/// The IV is read first (see [`read_iv`]); everything after it is the
/// ciphertext, buffered fully before decryption.
pub fn decrypt_from<R: Read>(mut reader: R, key: &CipherKey) -> Result<Vec<u8>> {
    let iv = read_iv(&mut reader)?;

    let mut ciphertext = Vec::new();
    reader.read_to_end(&mut ciphertext).map_err(|e| {
        SecureFileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to read ciphertext: {}", e),
            e,
        )
    })?;

    decrypt_ciphertext(&ciphertext, key, &iv)
}

/// Read exactly [`IV_LEN`] bytes, tolerating short reads.
///
/// Readers may return fewer bytes than requested, so this loops until the
/// buffer is full or the reader is exhausted. A reader that runs dry first
/// is a truncated container and yields [`ErrorKind::Format`]; decryption
/// never proceeds with a partial IV.
pub fn read_iv<R: Read>(reader: &mut R) -> Result<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    let mut filled = 0;

    while filled < IV_LEN {
        match reader.read(&mut iv[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(SecureFileError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to read initialization vector: {}", e),
                    e,
                ));
            }
        }
    }

    if filled < IV_LEN {
        return Err(SecureFileError::with_kind(
            ErrorCategory::User,
            ErrorKind::Format,
            format!(
                "container truncated: {} bytes available, initialization vector needs {}",
                filled, IV_LEN
            ),
        ));
    }

    Ok(iv)
}

fn decrypt_ciphertext(ciphertext: &[u8], key: &CipherKey, iv: &[u8; IV_LEN]) -> Result<Vec<u8>> {
    Aes128CbcDec::new(key.as_bytes().into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Decryption,
                "corrupt input, tampered-with data, or bad passphrase",
                e,
            )
        })
}

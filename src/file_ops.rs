//! File encryption/decryption operations
//!
//! This module provides high-level file operations for turning a file into a
//! secured container and back.

use crate::container;
use crate::error::{ErrorCategory, ErrorKind, Result, SecureFileError};
use crate::keys;
use crate::observer::{Event, Observer};
use crate::passphrase::{Passphrase, PassphraseReader};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, encrypts it using a passphrase from
/// `passphrase_reader`, and writes the container to `output_path`, replacing
/// any existing file.
///
/// The output is written to a temporary file next to `output_path` and
/// renamed into place, so a failure never leaves a partial container behind.
/// On Unix systems the file is created with mode 0o600. An `output_path`
/// that names the input file is rejected with [`ErrorKind::InvalidInput`].
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    observer: &dyn Observer,
) -> Result<()> {
    ensure_distinct_paths(input_path, output_path)?;
    observer.on_event(Event::EncryptStarted {
        input: input_path,
        output: output_path,
    });

    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = Passphrase::new(passphrase_reader.read_passphrase()?)?;
    let key = keys::normalize(&passphrase);
    let container =
        container::encrypt(&plaintext, &key).map_err(|e| e.with_context("encryption failed"))?;

    observer.on_event(Event::WritingCiphertext {
        bytes: container.ciphertext.len(),
    });
    write_file_atomic(output_path, |out| container.write_to(out))
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        bytes = plaintext.len(),
        "encrypted file"
    );
    observer.on_event(Event::EncryptFinished {
        output: output_path,
    });
    Ok(())
}

/// Decrypt a file with a passphrase
///
/// Reads a container from `input_path`, decrypts it using a passphrase from
/// `passphrase_reader`, and writes the plaintext to `output_path`, replacing
/// any existing file.
///
/// Nothing is written unless decryption succeeds. On Unix systems the file
/// is created with mode 0o600. As with [`encrypt_file`], the container is
/// never overwritten by its own plaintext.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    observer: &dyn Observer,
) -> Result<()> {
    ensure_distinct_paths(input_path, output_path)?;
    observer.on_event(Event::DecryptStarted {
        input: input_path,
        output: output_path,
    });

    let container_bytes = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = Passphrase::new(passphrase_reader.read_passphrase()?)?;
    let key = keys::normalize(&passphrase);

    observer.on_event(Event::ReadingIv);
    observer.on_event(Event::ReadingCiphertext {
        bytes: container_bytes.len().saturating_sub(container::IV_LEN),
    });
    let plaintext = container::decrypt(&container_bytes, &key)
        .map_err(|e| e.with_context("failed to decrypt"))?;

    observer.on_event(Event::WritingPlaintext {
        bytes: plaintext.len(),
    });
    write_file_atomic(output_path, |out| out.write_all(&plaintext))
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;

    tracing::info!(
        input = %input_path.display(),
        output = %output_path.display(),
        bytes = plaintext.len(),
        "decrypted file"
    );
    observer.on_event(Event::DecryptFinished {
        output: output_path,
    });
    Ok(())
}

/// Write a file atomically (tempfile + fsync + rename) with secure
/// permissions (0o600 on Unix).
fn write_file_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = tempfile::Builder::new()
        .prefix(".securefile-tmp")
        .tempfile_in(dir)
        .map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to create tempfile in {}", dir.display()),
                e,
            )
        })?;

    {
        let mut writer = BufWriter::new(temp_file.as_file_mut());
        write(&mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| {
                SecureFileError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to write to tempfile",
                    e,
                )
            })?;
    }

    // fsync() such that the rename later, if it succeeds, will always point
    // to a complete file.
    temp_file.as_file().sync_all().map_err(|e| {
        SecureFileError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            "failed to sync file prior to rename",
            e,
        )
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| {
                SecureFileError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to get tempfile metadata",
                    e,
                )
            })?
            .permissions();
        perms.set_mode(0o600);
        temp_file.as_file().set_permissions(perms).map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to set tempfile permissions",
                e,
            )
        })?;
    }

    temp_file.persist(path).map_err(|e| {
        SecureFileError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// The atomic rename would silently replace the source, so refuse outright.
/// Paths are compared as given and, when both exist, after canonicalization
/// (catches `./a.ssf` vs `a.ssf` and symlinks).
fn ensure_distinct_paths(input_path: &Path, output_path: &Path) -> Result<()> {
    let same_file = input_path == output_path
        || matches!(
            (fs::canonicalize(input_path), fs::canonicalize(output_path)),
            (Ok(input), Ok(output)) if input == output
        );
    if same_file {
        return Err(SecureFileError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            format!(
                "output {} is the input file; refusing to overwrite it",
                output_path.display()
            ),
        ));
    }
    Ok(())
}

fn read_error(path: &Path, err: io::Error) -> SecureFileError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    SecureFileError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}

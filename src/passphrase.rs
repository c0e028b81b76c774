//! Passphrase reading functionality

use crate::error::{ErrorCategory, ErrorKind, Result, SecureFileError};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// A non-empty, not-only-whitespace passphrase.
///
/// The text is wiped from memory when the value is dropped.
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(text: impl Into<Zeroizing<String>>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SecureFileError::with_kind(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                "passphrase must not be empty",
            ));
        }
        Ok(Self(text))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Passphrase(..)")
    }
}

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase. The raw text is returned unvalidated; callers turn
    /// it into a [`Passphrase`].
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>>;
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<String>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase.into()),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        Ok(self.passphrase.clone())
    }
}

/// Reads passphrase from any io::Read source
///
/// One trailing line ending (`\n` or `\r\n`) is removed so that
/// `echo secret | securefile --passphrase-stdin ...` works as expected.
pub struct ReaderPassphraseReader {
    reader: Box<dyn Read>,
}

impl ReaderPassphraseReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl PassphraseReader for ReaderPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;

        let text = std::str::from_utf8(&data).map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidInput,
                "passphrase is not valid UTF-8",
                e,
            )
        })?;
        let text = text
            .strip_suffix('\n')
            .map(|t| t.strip_suffix('\r').unwrap_or(t))
            .unwrap_or(text);
        Ok(Zeroizing::new(text.to_string()))
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(SecureFileError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        io::stderr()
            .write_all(b"Passphrase (securefile): ")
            .map_err(|e| {
                SecureFileError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;
        io::stderr().flush().map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to flush prompt: {}", e),
                e,
            )
        })?;

        // Read password *without echo*
        let passphrase = rpassword::read_password().map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("failure reading passphrase: {}", e),
                e,
            )
        })?;

        Ok(Zeroizing::new(passphrase))
    }
}

use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee that the error was not caused
    /// by the user; it merely cannot be determined by the code.
    Internal,

    /// The user provided invalid input or asked for something that cannot
    /// be done (missing file, wrong passphrase, malformed container).
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Opening, creating, reading or writing a file (or stdin/stdout) failed.
    Io,
    /// Cipher setup or encryption failed, including failure to obtain a
    /// random IV.
    Cipher,
    /// Padding or length validation failed while decrypting. Usually a wrong
    /// passphrase or a corrupted container.
    Decryption,
    /// The container is too short to hold an IV.
    Format,
    /// Input supplied by the user was rejected before any work was done.
    InvalidInput,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct SecureFileError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Any code consuming errors MUST
    /// handle the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl SecureFileError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// Renders the message followed by every source in the chain,
    /// separated by `": "`.
    pub fn display_chain(&self) -> String {
        let mut out = self.msg.clone();
        let mut current = StdError::source(self);
        while let Some(err) = current {
            out.push_str(": ");
            out.push_str(&err.to_string());
            current = err.source();
        }
        out
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SecureFileError>;

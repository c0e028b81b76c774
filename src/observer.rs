//! Progress events emitted by the file operations
//!
//! Callers that want an audit trail inject an [`Observer`]; everything else
//! uses [`NoopObserver`].

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    EncryptStarted { input: &'a Path, output: &'a Path },
    WritingCiphertext { bytes: usize },
    EncryptFinished { output: &'a Path },
    DecryptStarted { input: &'a Path, output: &'a Path },
    ReadingIv,
    ReadingCiphertext { bytes: usize },
    WritingPlaintext { bytes: usize },
    DecryptFinished { output: &'a Path },
}

pub trait Observer {
    fn on_event(&self, event: Event<'_>);
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: Event<'_>) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: Event<'_>) {
        match event {
            Event::EncryptStarted { input, output } => {
                tracing::debug!(input = %input.display(), output = %output.display(), "starting encryption")
            }
            Event::WritingCiphertext { bytes } => {
                tracing::debug!(bytes, "writing encrypted contents")
            }
            Event::EncryptFinished { output } => {
                tracing::debug!(output = %output.display(), "encryption finished")
            }
            Event::DecryptStarted { input, output } => {
                tracing::debug!(input = %input.display(), output = %output.display(), "starting decryption")
            }
            Event::ReadingIv => tracing::debug!("fetching initialisation vector"),
            Event::ReadingCiphertext { bytes } => {
                tracing::debug!(bytes, "reading encrypted stream")
            }
            Event::WritingPlaintext { bytes } => {
                tracing::debug!(bytes, "writing decrypted contents")
            }
            Event::DecryptFinished { output } => {
                tracing::debug!(output = %output.display(), "decryption finished")
            }
        }
    }
}

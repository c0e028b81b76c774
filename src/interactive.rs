//! Interactive prompt loop
//!
//! Asks for a mode, a file, a passphrase and (when decrypting) an output
//! extension, runs the operation, reports the outcome and starts over.
//! A failed operation is reported and never ends the session; the session
//! ends at end of input or when the user types `quit` or `exit`.

use crate::error::{ErrorCategory, ErrorKind, Result, SecureFileError};
use crate::file_ops;
use crate::naming;
use crate::observer::{NoopObserver, Observer};
use crate::passphrase::{ConstantPassphraseReader, Passphrase, PassphraseReader};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Encrypt a file into a secured container.
    Secure,
    /// Decrypt a secured container.
    Access,
}

impl FromStr for Mode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "secure" | "encrypt" => Ok(Mode::Secure),
            "access" | "decrypt" => Ok(Mode::Access),
            _ => Err(()),
        }
    }
}

/// Counts of completed and failed operations over a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub succeeded: usize,
    pub failed: usize,
}

enum Step<T> {
    Value(T),
    Quit,
}

pub struct Session<R, W> {
    input: R,
    output: W,
    passphrase_reader: Option<Box<dyn PassphraseReader>>,
    observer: Box<dyn Observer>,
    secured_ext: String,
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// A session that reads everything, passphrases included, from `input`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            passphrase_reader: None,
            observer: Box::new(NoopObserver),
            secured_ext: naming::SECURED_EXTENSION.to_string(),
        }
    }

    /// Read passphrases from `reader` instead of the session input.
    pub fn with_passphrase_reader(mut self, reader: Box<dyn PassphraseReader>) -> Self {
        self.passphrase_reader = Some(reader);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_secured_extension(mut self, ext: impl Into<String>) -> Self {
        self.secured_ext = ext.into();
        self
    }

    /// Process files until the input is exhausted or the user quits.
    ///
    /// Only failures of the prompt streams themselves are returned as
    /// errors; failed file operations are counted in the summary.
    pub fn run(&mut self) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        loop {
            let mode = match self.ask_mode()? {
                Step::Value(mode) => mode,
                Step::Quit => break,
            };
            let ok = match mode {
                Mode::Secure => self.secure()?,
                Mode::Access => self.access()?,
            };
            match ok {
                Step::Value(true) => summary.succeeded += 1,
                Step::Value(false) => summary.failed += 1,
                Step::Quit => break,
            }
        }
        tracing::debug!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "interactive session ended"
        );
        Ok(summary)
    }

    fn secure(&mut self) -> Result<Step<bool>> {
        let input_path = match self.ask_path(Mode::Secure)? {
            Step::Value(path) => path,
            Step::Quit => return Ok(Step::Quit),
        };
        let passphrase = match self.ask_passphrase()? {
            Step::Value(passphrase) => passphrase,
            Step::Quit => return Ok(Step::Quit),
        };

        let output_path = naming::secured_path(&input_path, &self.secured_ext);
        let result = passphrase.and_then(|passphrase| {
            let mut reader = ConstantPassphraseReader::new(passphrase.expose());
            file_ops::encrypt_file(
                &input_path,
                &output_path,
                &mut reader,
                self.observer.as_ref(),
            )
        });

        let ok = self.report(result, "Encryption", "encrypted", &output_path)?;
        Ok(Step::Value(ok))
    }

    fn access(&mut self) -> Result<Step<bool>> {
        let input_path = match self.ask_path(Mode::Access)? {
            Step::Value(path) => path,
            Step::Quit => return Ok(Step::Quit),
        };
        let passphrase = match self.ask_passphrase()? {
            Step::Value(passphrase) => passphrase,
            Step::Quit => return Ok(Step::Quit),
        };

        self.say("Please provide the desired decrypted file extension.")?;
        let Some(raw_ext) = self.read_line()? else {
            return Ok(Step::Quit);
        };
        let ext = naming::normalize_extension(&raw_ext);
        let output_path = naming::plaintext_path(&input_path, &ext);

        let result = passphrase.and_then(|passphrase| {
            let mut reader = ConstantPassphraseReader::new(passphrase.expose());
            file_ops::decrypt_file(
                &input_path,
                &output_path,
                &mut reader,
                self.observer.as_ref(),
            )
        });

        let ok = self.report(result, "Decryption", "decrypted", &output_path)?;
        Ok(Step::Value(ok))
    }

    fn ask_mode(&mut self) -> Result<Step<Mode>> {
        self.say(
            "Would you like to secure a file or access a file?\n\
             Type: 'SECURE' (case-insensitive) to secure a file.\n\
             Type: 'ACCESS' (case-insensitive) to access a file.",
        )?;
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(Step::Quit);
            };
            let response = line.trim();
            if response.is_empty() {
                self.say("Nothing is not a valid option.")?;
                continue;
            }
            if response.eq_ignore_ascii_case("quit") || response.eq_ignore_ascii_case("exit") {
                return Ok(Step::Quit);
            }
            match response.parse::<Mode>() {
                Ok(mode) => return Ok(Step::Value(mode)),
                Err(()) => self.say(&format!("'{}' is not a valid option.", response))?,
            }
        }
    }

    fn ask_path(&mut self, mode: Mode) -> Result<Step<PathBuf>> {
        self.say("Please provide the path to the file you are looking to modify.")?;
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(Step::Quit);
            };
            if line.trim().is_empty() {
                self.say("Nothing is not a valid file path.")?;
                continue;
            }

            let path = PathBuf::from(line);
            if !path.is_file() {
                self.say("The path you have provided does not direct to an existing file.")?;
                continue;
            }

            if mode == Mode::Access && !naming::has_secured_extension(&path, &self.secured_ext) {
                self.say("The path you have provided is not valid for the following reason:")?;
                self.say("Invalid path extension")?;
                continue;
            }

            return Ok(Step::Value(path));
        }
    }

    /// Collect a passphrase for the next operation.
    ///
    /// Line input is re-prompted until it is non-empty. An injected reader
    /// does its own prompting and is asked once; if it fails, the failure is
    /// handed to the caller and reported like a failed operation.
    fn ask_passphrase(&mut self) -> Result<Step<Result<Passphrase>>> {
        if let Some(reader) = self.passphrase_reader.as_mut() {
            let passphrase = reader.read_passphrase().and_then(Passphrase::new);
            return Ok(Step::Value(passphrase));
        }

        self.say("Please provide the encryption password:")?;
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(Step::Quit);
            };
            match Passphrase::new(line) {
                Ok(passphrase) => return Ok(Step::Value(Ok(passphrase))),
                Err(_) => self.say("Nothing is not a valid password.")?,
            }
        }
    }

    fn report(
        &mut self,
        result: Result<()>,
        operation: &str,
        past_tense: &str,
        output_path: &Path,
    ) -> Result<bool> {
        match result {
            Ok(()) => {
                let stem = output_path.with_extension("");
                self.say(&format!("{} was successfully {}.", stem.display(), past_tense))?;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e.display_chain(), "{} failed", operation.to_lowercase());
                self.say(&format!("{} failed: {}", operation, e.display_chain()))?;
                Ok(false)
            }
        }
    }

    /// Next line without its line ending, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self.input.read_line(&mut line).map_err(|e| {
            SecureFileError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to read from input",
                e,
            )
        })?;
        if n == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text)
            .and_then(|()| self.output.flush())
            .map_err(|e| {
                SecureFileError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    "failed to write to output",
                    e,
                )
            })
    }
}

//! securefile CLI - Passphrase-based file encryption
//!
//! Command-line interface for turning files into AES-128-CBC secured
//! containers and back, either through subcommands or the interactive
//! prompt loop.

use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;
use tracing::level_filters::LevelFilter;

use securefile::error::{ErrorCategory, ErrorKind, Result, SecureFileError};
use securefile::file_ops;
use securefile::interactive::Session;
use securefile::naming;
use securefile::observer::TracingObserver;
use securefile::passphrase::{PassphraseReader, ReaderPassphraseReader, TerminalPassphraseReader};

#[derive(Parser)]
#[command(name = "securefile")]
#[command(version)]
#[command(about = "Passphrase-based file encryption into secured containers.", long_about = None)]
struct Cli {
    /// Read passphrase from stdin instead of from terminal
    #[arg(long, global = true)]
    passphrase_stdin: bool,

    /// Extension used for secured containers
    #[arg(
        long,
        global = true,
        value_name = "EXT",
        default_value = naming::SECURED_EXTENSION,
        value_parser = parse_secured_ext
    )]
    secured_ext: String,

    /// Log more (-v info, -vv debug, -vvv trace); logs go to stderr
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file into a secured container
    #[command(visible_alias = "secure", alias = "e")]
    Encrypt {
        /// Path to the file whose contents is to be encrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the container to [default: input with its
        /// extension replaced by the secured extension]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decrypt a secured container
    #[command(visible_alias = "access", alias = "d")]
    Decrypt {
        /// Path to the container to be decrypted
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Path to write the decrypted file to [default: input with its
        /// extension replaced by --ext]
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Extension of the decrypted file, with or without the leading dot
        #[arg(long, value_name = "EXT", default_value = "")]
        ext: String,
    },

    /// Prompt for files to secure or access until end of input (default)
    #[command(alias = "i")]
    Interactive,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Encrypt { input, output }) => {
            let output = output.unwrap_or_else(|| naming::secured_path(&input, &cli.secured_ext));
            let mut reader = get_passphrase_reader(cli.passphrase_stdin);
            file_ops::encrypt_file(&input, &output, &mut *reader, &TracingObserver)
        }
        Some(Commands::Decrypt { input, output, ext }) => {
            decrypt_output_path(&input, output, &ext, &cli.secured_ext).and_then(|output| {
                let mut reader = get_passphrase_reader(cli.passphrase_stdin);
                file_ops::decrypt_file(&input, &output, &mut *reader, &TracingObserver)
            })
        }
        Some(Commands::Interactive) | None => {
            run_interactive(cli.passphrase_stdin, cli.secured_ext).map(|_| ())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.display_chain());
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: failed to install logger: {}", e);
    }
}

/// Containers must be recognizable by extension, so an empty one is refused.
fn parse_secured_ext(raw: &str) -> std::result::Result<String, String> {
    let ext = raw.trim().trim_start_matches('.');
    if ext.is_empty() {
        return Err("the secured extension must not be empty".to_string());
    }
    Ok(ext.to_string())
}

/// Without an explicit output path the input must look like a container,
/// since its extension is what gets replaced.
fn decrypt_output_path(
    input: &std::path::Path,
    output: Option<PathBuf>,
    ext: &str,
    secured_ext: &str,
) -> Result<PathBuf> {
    if let Some(output) = output {
        return Ok(output);
    }
    if !naming::has_secured_extension(input, secured_ext) {
        return Err(SecureFileError::with_kind(
            ErrorCategory::User,
            ErrorKind::InvalidInput,
            format!(
                "{} does not have the .{} extension; pass --output explicitly",
                input.display(),
                secured_ext
            ),
        ));
    }
    Ok(naming::plaintext_path(input, ext))
}

fn run_interactive(
    passphrase_stdin: bool,
    secured_ext: String,
) -> Result<securefile::interactive::SessionSummary> {
    let stdin = io::stdin();
    let use_terminal = !passphrase_stdin && stdin.is_terminal();
    let mut session = Session::new(stdin.lock(), io::stdout().lock())
        .with_observer(Box::new(TracingObserver))
        .with_secured_extension(secured_ext);
    if use_terminal {
        session = session.with_passphrase_reader(Box::new(TerminalPassphraseReader::new()));
    }
    session.run()
}

fn get_passphrase_reader(use_stdin: bool) -> Box<dyn PassphraseReader> {
    if use_stdin {
        Box::new(ReaderPassphraseReader::new(Box::new(io::stdin())))
    } else {
        Box::new(TerminalPassphraseReader::new())
    }
}

//! Binary entry point for qa-forge.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use qa_forge::cli::output::{format_error, OutputFormat};
use qa_forge::cli::{execute, Cli};
use qa_forge::error::{CommandError, DispatchError, Error};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::parse(&cli.format);

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                // Handle broken pipe gracefully (e.g., when piped to `head` or `jq`)
                if let Err(e) = write!(io::stdout(), "{output}")
                    && e.kind() != io::ErrorKind::BrokenPipe
                {
                    eprintln!("Error writing to stdout: {e}");
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let error_output = format_error(&e, format);
            match format {
                OutputFormat::Json => {
                    // JSON errors go to stdout for programmatic parsing.
                    println!("{error_output}");
                }
                OutputFormat::Text => {
                    eprintln!("Error: {error_output}");
                }
            }
            exit_code_for(&e)
        }
    }
}

/// Classifies an error into the exit code §6/§7 assign it: configuration
/// errors are 1, runtime/pipeline failures are 2, and a user cancellation
/// is 130.
fn exit_code_for(error: &Error) -> ExitCode {
    match error {
        Error::Command(CommandError::Cancelled) => ExitCode::from(130),
        Error::Config { .. }
        | Error::Command(_)
        | Error::Chunking(_)
        | Error::Dispatch(DispatchError::TooFewWorkers { .. }) => ExitCode::from(1),
        Error::Provider(_)
        | Error::Dispatch(_)
        | Error::Coverage(_)
        | Error::Persist(_)
        | Error::Io(_)
        | Error::InvalidState { .. } => ExitCode::from(2),
    }
}

//! CLI layer for qa-forge.
//!
//! Provides the command-line interface using clap: a `run` subcommand
//! driving the full synthesis pipeline, plus small utility subcommands.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};

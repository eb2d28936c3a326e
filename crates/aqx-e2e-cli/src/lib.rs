//! aqx-e2e CLI library
//!
//! Argument parsing, progress output and logging setup for the `aqx-e2e`
//! binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod logging;
mod output;

pub use commands::{Cli, ColorArg, FormatArg, LIST_TARGET};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{catalogue_lines, summary_lines, OutputFormat, ProgressReporter};

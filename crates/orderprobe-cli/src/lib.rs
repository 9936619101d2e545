//! Orderprobe CLI library
//!
//! Command-line interface for the Orderprobe order page suite: argument
//! parsing, configuration layering on top of [`orderprobe::SuiteConfig`] and
//! output rendering. The `orderprobe` binary wires these together.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod output;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, ConfigFormat, RunArgs, DEFAULT_FEATURES_DIR};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};

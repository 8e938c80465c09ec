//! CLI module for mycelium
//!
//! Provides the command-line interface over a tracked capability:
//! - ls / read / flat: immutable reads
//! - create / write / delete: tracked mutations
//! - log: per-record or per-context changelog
//! - roundtrip: folder to document copy with verification

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, StoreArgs};
pub use commands::{run, run_command};
pub use config::{Config, StoreKind};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::format_size;

//! CLI argument definitions using clap
//!
//! Commands:
//! - mycelium ls [path]
//! - mycelium read <path>
//! - mycelium flat [path]
//! - mycelium create <path> [content...] [--stdin]
//! - mycelium write <path> [content...] [--stdin]
//! - mycelium delete <path>
//! - mycelium log <path>
//! - mycelium roundtrip <folder> <document>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::tracked::CausalityMode;

use super::config::StoreKind;

/// mycelium - records and contexts over pluggable capabilities
#[derive(Parser, Debug)]
#[command(name = "mycelium")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Store selection flags; each overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Capability to bind
    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreKind>,

    /// Root directory for the folder store [default: .]
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// JSON file for the document store [default: mycelium.json]
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Changelog causality: log-first | resource-first [default: resource-first]
    #[arg(long, global = true)]
    pub mode: Option<CausalityMode>,

    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List context contents
    Ls {
        #[arg(default_value = ".")]
        path: String,
    },

    /// Read record content
    Read { path: String },

    /// Flatten a context recursively
    Flat {
        #[arg(default_value = ".")]
        path: String,
    },

    /// Create a record: content makes a file, no content a context
    Create {
        path: String,

        content: Vec<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Overwrite a file record
    Write {
        path: String,

        content: Vec<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Delete a record (contexts recursively) and its changelog
    Delete { path: String },

    /// Show the changelog of a record, or the merged log of a context
    Log { path: String },

    /// Copy a folder tree into a document store and verify the copy
    Roundtrip {
        folder: PathBuf,
        document: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

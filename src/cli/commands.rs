//! CLI command implementations
//!
//! Every store is opened through the tracked decorator, so `create` and
//! `write` from the command line always leave a changelog behind. Record
//! content and listings go to `out`; diagnostics go through the logger.

use std::io::{self, Write};
use std::path::Path;

use crate::capability::{ImmutableCapability, MutableCapability, RecordKind};
use crate::document::DocumentCapability;
use crate::folder::FolderCapability;
use crate::observability::Logger;
use crate::roundtrip;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{content_from, format_size, write_entry, write_keyed_entry};

/// Parse arguments and run against stdout
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_command(cli, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Run the appropriate command based on CLI args
pub fn run_command(cli: Cli, out: &mut dyn Write) -> CliResult<()> {
    let config = Config::resolve(&cli.store)?;
    let cap = config.open();

    match cli.command {
        Command::Ls { path } => {
            let ctx = cap.read_context(&path)?;
            for record in &ctx.records {
                let suffix = if record.is_file() { "" } else { "/" };
                writeln!(
                    out,
                    "{}{}  ({})",
                    record.key,
                    suffix,
                    format_size(record.size, record.kind)
                )?;
            }
        }

        Command::Read { path } => {
            out.write_all(&cap.read_record(&path)?)?;
        }

        Command::Flat { path } => {
            for record in cap.flatten(&path)? {
                writeln!(
                    out,
                    "{}  ({})",
                    record.key,
                    format_size(record.size, RecordKind::File)
                )?;
            }
        }

        Command::Create {
            path,
            content,
            stdin,
        } => {
            let content = content_from(&content, stdin)?;
            cap.create_record(&path, content.as_deref())?;
            let what = if content.is_some() { "file" } else { "context" };
            writeln!(out, "Created {}: {}", what, path)?;
        }

        Command::Write {
            path,
            content,
            stdin,
        } => {
            let content = content_from(&content, stdin)?
                .ok_or_else(|| CliError::usage("Usage: mycelium write <path> <content>"))?;
            cap.write_record(&path, &content)?;
            writeln!(out, "Written: {}", path)?;
        }

        Command::Delete { path } => {
            cap.delete_record(&path)?;
            writeln!(out, "Deleted: {}", path)?;
        }

        Command::Log { path } => {
            if cap.kind(&path)? == Some(RecordKind::Context) {
                for entry in cap.read_context_log(&path)? {
                    write_keyed_entry(out, &entry)?;
                }
            } else {
                for entry in cap.read_log(&path)? {
                    write_entry(out, &entry)?;
                }
            }
        }

        Command::Roundtrip { folder, document } => {
            roundtrip_command(&folder, &document, out)?;
        }
    }

    Ok(())
}

/// Copy a folder into a document store, then flatten both and compare.
///
/// Both sides are bare bindings: the copy is not tracked. One line per
/// mismatch, then one aggregate line.
fn roundtrip_command(folder: &Path, document: &Path, out: &mut dyn Write) -> CliResult<()> {
    let src = FolderCapability::new(folder);
    let dest = DocumentCapability::new(document);

    let copied = roundtrip::copy_tree(&src, &dest, "")?;
    writeln!(out, "Copied {} records from folder to document store.", copied)?;

    let report = roundtrip::verify(&src, &dest, "")?;
    for mismatch in &report.mismatches {
        writeln!(out, "{}", mismatch)?;
    }

    let compared = report.compared;
    match report.into_result() {
        Ok(_) => {
            writeln!(out, "Verified: all {} records match.", compared)?;
            Ok(())
        }
        Err(e) => {
            let folder = folder.display().to_string();
            Logger::error("roundtrip_failed", &[("folder", folder.as_str())]);
            Err(e.into())
        }
    }
}

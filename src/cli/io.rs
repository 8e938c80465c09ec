//! Terminal I/O helpers

use std::io::{self, Read, Write};

use crate::capability::RecordKind;
use crate::tracked::changelog::format_timestamp;
use crate::tracked::ChangelogEntry;

use super::errors::{CliError, CliResult};

/// Human-readable size: item count for contexts, B/KB/MB for files
pub fn format_size(size: u64, kind: RecordKind) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    match kind {
        RecordKind::Context => format!("{} items", size),
        RecordKind::File if size < KB => format!("{} B", size),
        RecordKind::File if size < MB => format!("{:.1} KB", size as f64 / KB as f64),
        RecordKind::File => format!("{:.1} MB", size as f64 / MB as f64),
    }
}

/// Read all of stdin
pub fn read_stdin() -> CliResult<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin().lock().read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Content for create/write: stdin, joined words, or nothing
pub fn content_from(words: &[String], stdin: bool) -> CliResult<Option<Vec<u8>>> {
    if stdin {
        if !words.is_empty() {
            return Err(CliError::usage("Pass content either inline or via --stdin, not both"));
        }
        return read_stdin().map(Some);
    }
    if words.is_empty() {
        return Ok(None);
    }
    Ok(Some(words.join(" ").into_bytes()))
}

/// `timestamp  operation  fingerprint`
pub fn write_entry(out: &mut dyn Write, entry: &ChangelogEntry) -> CliResult<()> {
    writeln!(
        out,
        "{}\t{}\t{}",
        format_timestamp(&entry.timestamp),
        entry.operation,
        entry.fingerprint
    )?;
    Ok(())
}

/// `timestamp  key  operation  fingerprint`
pub fn write_keyed_entry(out: &mut dyn Write, entry: &ChangelogEntry) -> CliResult<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        format_timestamp(&entry.timestamp),
        entry.key,
        entry.operation,
        entry.fingerprint
    )?;
    Ok(())
}

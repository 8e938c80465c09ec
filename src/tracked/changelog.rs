//! Changelog format
//!
//! A changelog is a plain-text companion named `{key}.changelog`, one entry
//! per line, three tab-separated fields:
//!
//! ```text
//! 2026-01-01T00:00:00.000Z\tcreated\t2cf24dba
//! ```
//!
//! No header, no trailer. The owner key is not stored; it is attached when
//! the companion is read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::capability::path as lpath;
use crate::capability::{CapabilityError, CapabilityResult};

/// Companion name suffix
pub const CHANGELOG_SUFFIX: &str = ".changelog";

/// Hex characters kept from the SHA-256 digest
pub const FINGERPRINT_LEN: usize = 8;

/// What happened to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangelogOperation {
    Created,
    Written,
    Deleted,
}

impl ChangelogOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangelogOperation::Created => "created",
            ChangelogOperation::Written => "written",
            ChangelogOperation::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ChangelogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangelogOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ChangelogOperation::Created),
            "written" => Ok(ChangelogOperation::Written),
            "deleted" => Ok(ChangelogOperation::Deleted),
            other => Err(format!("unknown operation '{}'", other)),
        }
    }
}

/// One line of a changelog, tagged with its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: ChangelogOperation,
    pub fingerprint: String,
    /// Owning record name; not part of the serialized line
    pub key: String,
}

impl ChangelogEntry {
    /// Entry for `content` stamped with the current time
    pub fn record(operation: ChangelogOperation, content: &[u8], key: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            fingerprint: fingerprint(content),
            key: key.to_string(),
        }
    }

    /// The persisted line, newline included
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\n",
            format_timestamp(&self.timestamp),
            self.operation,
            self.fingerprint
        )
    }
}

/// First 8 hex characters of SHA-256 over the raw content
pub fn fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest
        .iter()
        .take(FINGERPRINT_LEN / 2)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// RFC 3339, UTC, millisecond precision
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Companion path for the record at `path`
pub fn companion_path(path: &str) -> CapabilityResult<String> {
    if lpath::is_root(path) {
        return Err(CapabilityError::InvalidPath(path.to_string()));
    }
    Ok(format!("{}{}", lpath::normalize(path)?, CHANGELOG_SUFFIX))
}

/// True if `key` names a changelog companion
pub fn is_companion(key: &str) -> bool {
    key.len() > CHANGELOG_SUFFIX.len() && key.ends_with(CHANGELOG_SUFFIX)
}

/// Owner key of a companion key
pub fn owner_key(companion: &str) -> &str {
    companion
        .strip_suffix(CHANGELOG_SUFFIX)
        .unwrap_or(companion)
}

/// Parse changelog text in append order, tagging entries with `key`.
///
/// `source` names the companion in error messages.
pub fn parse_changelog(raw: &str, key: &str, source: &str) -> CapabilityResult<Vec<ChangelogEntry>> {
    let mut entries = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        let corrupt = |reason: String| CapabilityError::CorruptChangelog {
            path: source.to_string(),
            line: index + 1,
            reason,
        };

        let fields: Vec<&str> = line.split('\t').collect();
        let &[timestamp, operation, fp] = fields.as_slice() else {
            return Err(corrupt(format!("expected 3 fields, found {}", fields.len())));
        };

        let timestamp = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|e| corrupt(format!("bad timestamp: {}", e)))?
            .with_timezone(&Utc);
        let operation = operation.parse::<ChangelogOperation>().map_err(corrupt)?;
        if fp.len() != FINGERPRINT_LEN || !fp.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(corrupt(format!("bad fingerprint '{}'", fp)));
        }

        entries.push(ChangelogEntry {
            timestamp,
            operation,
            fingerprint: fp.to_string(),
            key: key.to_string(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_known_values() {
        assert_eq!(fingerprint(b"hello"), "2cf24dba");
        assert_eq!(fingerprint(b"hello world"), "b94d27b9");
        assert_eq!(fingerprint(b""), "e3b0c442");
    }

    #[test]
    fn test_line_shape() {
        let entry = ChangelogEntry {
            timestamp: DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            operation: ChangelogOperation::Written,
            fingerprint: "b94d27b9".into(),
            key: "a.txt".into(),
        };
        assert_eq!(entry.to_line(), "2026-03-01T12:00:00.000Z\twritten\tb94d27b9\n");
    }

    #[test]
    fn test_parse_keeps_file_order_and_tags_key() {
        let raw = "2026-03-01T12:00:02.000Z\tcreated\t2cf24dba\n\
                   \n\
                   2026-03-01T12:00:01.000Z\twritten\tb94d27b9\n";
        let entries = parse_changelog(raw, "a.txt", "a.txt.changelog").unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, ChangelogOperation::Created);
        assert_eq!(entries[1].operation, ChangelogOperation::Written);
        assert!(entries.iter().all(|e| e.key == "a.txt"));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let two_fields = "2026-03-01T12:00:00.000Z\tcreated\n";
        let err = parse_changelog(two_fields, "a", "a.changelog").unwrap_err();
        assert!(matches!(err, CapabilityError::CorruptChangelog { line: 1, .. }));

        let bad_op = "2026-03-01T12:00:00.000Z\tmoved\t2cf24dba\n";
        assert!(parse_changelog(bad_op, "a", "a.changelog").is_err());

        let bad_fp = "2026-03-01T12:00:00.000Z\tcreated\tzz\n";
        assert!(parse_changelog(bad_fp, "a", "a.changelog").is_err());
    }

    #[test]
    fn test_companion_naming() {
        assert_eq!(companion_path("dir//a.txt").unwrap(), "dir/a.txt.changelog");
        assert!(companion_path("").is_err());
        assert!(is_companion("a.txt.changelog"));
        assert!(!is_companion(".changelog"));
        assert!(!is_companion("a.txt"));
        assert_eq!(owner_key("a.txt.changelog"), "a.txt");
    }
}

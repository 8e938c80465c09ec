//! Logical model value types

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a record holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    File,
    Context,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::File => "file",
            RecordKind::Context => "context",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry in a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Name, unique within the parent context
    pub key: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Byte length for files, immediate child count for contexts
    pub size: u64,
}

impl Record {
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            kind: RecordKind::File,
            size,
        }
    }

    pub fn context(key: impl Into<String>, children: u64) -> Self {
        Self {
            key: key.into(),
            kind: RecordKind::Context,
            size: children,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == RecordKind::File
    }
}

/// A container of records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Logical path relative to the backend root
    pub path: String,
    pub records: Vec<Record>,
}

/// A file leaf found by `flatten`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    /// Slash-joined path relative to the flatten root
    pub key: String,
    pub size: u64,
}

/// Sort flatten output into its canonical order (ascending by key)
pub fn sort_flat(records: &mut [FlatRecord]) {
    records.sort_by(|a, b| a.key.cmp(&b.key));
}

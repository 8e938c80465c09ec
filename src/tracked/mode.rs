//! Causality modes
//!
//! A tracked create or write performs two writes: the primary record and its
//! changelog companion. Nothing makes the pair atomic, so the mode fixes
//! which one lands first and therefore which one is authoritative after a
//! crash between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Relative order of a data mutation and its changelog entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CausalityMode {
    /// Append the entry, then mutate the record.
    ///
    /// The log may over-report: an entry can describe an effect that was
    /// never applied. The record is never ahead of its own log.
    LogFirst,

    /// Mutate the record, then append the entry.
    ///
    /// The log may under-report: the newest entry can be missing. No entry
    /// ever describes a state the record has not reached.
    #[default]
    ResourceFirst,
}

impl CausalityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CausalityMode::LogFirst => "log-first",
            CausalityMode::ResourceFirst => "resource-first",
        }
    }
}

impl fmt::Display for CausalityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CausalityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log-first" => Ok(CausalityMode::LogFirst),
            "resource-first" => Ok(CausalityMode::ResourceFirst),
            other => Err(format!(
                "Invalid causality mode: '{}'. Must be 'log-first' or 'resource-first'.",
                other
            )),
        }
    }
}

//! Structural comparison of two flatten results

use std::fmt;

use crate::capability::{CapabilityError, CapabilityResult, FlatRecord, ImmutableCapability};
use crate::observability::Logger;

/// One difference between two flatten results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Different keys at the same position
    Key {
        position: usize,
        left: String,
        right: String,
    },
    /// Same key, different byte length
    Size { key: String, left: u64, right: u64 },
    /// Present only in the left listing
    OnlyLeft { key: String },
    /// Present only in the right listing
    OnlyRight { key: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Key {
                position,
                left,
                right,
            } => write!(f, "Key mismatch at {}: {} vs {}", position, left, right),
            Mismatch::Size { key, left, right } => {
                write!(f, "Size mismatch for {}: {} vs {}", key, left, right)
            }
            Mismatch::OnlyLeft { key } => write!(f, "Missing from destination: {}", key),
            Mismatch::OnlyRight { key } => write!(f, "Missing from source: {}", key),
        }
    }
}

/// Outcome of a verification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Entries compared (length of the longer listing)
    pub compared: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Single pass/fail signal
    pub fn into_result(self) -> CapabilityResult<usize> {
        if self.passed() {
            Ok(self.compared)
        } else {
            Err(CapabilityError::VerificationMismatch(self.mismatches.len()))
        }
    }
}

/// Compare two listings position by position
pub fn compare(left: &[FlatRecord], right: &[FlatRecord]) -> VerifyReport {
    let mut mismatches = Vec::new();
    let compared = left.len().max(right.len());

    for position in 0..compared {
        match (left.get(position), right.get(position)) {
            (Some(l), Some(r)) if l.key != r.key => mismatches.push(Mismatch::Key {
                position,
                left: l.key.clone(),
                right: r.key.clone(),
            }),
            (Some(l), Some(r)) if l.size != r.size => mismatches.push(Mismatch::Size {
                key: l.key.clone(),
                left: l.size,
                right: r.size,
            }),
            (Some(_), Some(_)) => {}
            (Some(l), None) => mismatches.push(Mismatch::OnlyLeft { key: l.key.clone() }),
            (None, Some(r)) => mismatches.push(Mismatch::OnlyRight { key: r.key.clone() }),
            (None, None) => {}
        }
    }

    VerifyReport {
        compared,
        mismatches,
    }
}

/// Flatten both capabilities from `root` and compare (key, size) sequences
pub fn verify<L, R>(left: &L, right: &R, root: &str) -> CapabilityResult<VerifyReport>
where
    L: ImmutableCapability + ?Sized,
    R: ImmutableCapability + ?Sized,
{
    let report = compare(&left.flatten(root)?, &right.flatten(root)?);

    for mismatch in &report.mismatches {
        let detail = mismatch.to_string();
        Logger::warn("verify_mismatch", &[("detail", detail.as_str())]);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(entries: &[(&str, u64)]) -> Vec<FlatRecord> {
        entries
            .iter()
            .map(|(key, size)| FlatRecord {
                key: key.to_string(),
                size: *size,
            })
            .collect()
    }

    #[test]
    fn test_identical_passes() {
        let a = flat(&[("a", 1), ("b/c", 2)]);
        let report = compare(&a, &a.clone());
        assert!(report.passed());
        assert_eq!(report.into_result(), Ok(2));
    }

    #[test]
    fn test_each_mismatch_reported() {
        let left = flat(&[("a", 1), ("b", 2), ("c", 3)]);
        let right = flat(&[("a", 9), ("x", 2)]);

        let report = compare(&left, &right);
        assert_eq!(
            report.mismatches,
            vec![
                Mismatch::Size {
                    key: "a".into(),
                    left: 1,
                    right: 9
                },
                Mismatch::Key {
                    position: 1,
                    left: "b".into(),
                    right: "x".into()
                },
                Mismatch::OnlyLeft { key: "c".into() },
            ]
        );
        assert_eq!(
            report.into_result(),
            Err(CapabilityError::VerificationMismatch(3))
        );
    }

    #[test]
    fn test_display_lines() {
        let m = Mismatch::Size {
            key: "k".into(),
            left: 1,
            right: 2,
        };
        assert_eq!(m.to_string(), "Size mismatch for k: 1 vs 2");
    }
}

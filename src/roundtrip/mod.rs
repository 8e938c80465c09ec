//! # Roundtrip
//!
//! Recursive copy between two capabilities plus a structural check, used as a
//! conformance oracle: copying a tree from one binding to another and
//! flattening both must give identical (key, size) sequences.

mod verify;

pub use verify::{compare, verify, Mismatch, VerifyReport};

use crate::capability::path as lpath;
use crate::capability::{CapabilityResult, ImmutableCapability, RecordKind};
use crate::observability::Logger;

/// Copy every record below `path` from `src` into `dest`.
///
/// Contexts are created empty and recursed into; files are read whole and
/// created. Returns the number of file records copied.
pub fn copy_tree<S, D>(src: &S, dest: &D, path: &str) -> CapabilityResult<usize>
where
    S: ImmutableCapability + ?Sized,
    D: ImmutableCapability + ?Sized,
{
    let ctx = src.read_context(path)?;
    let mut count = 0;

    for record in &ctx.records {
        let record_path = lpath::join(path, &record.key);
        match record.kind {
            RecordKind::File => {
                let content = src.read_record(&record_path)?;
                dest.create_record(&record_path, Some(&content))?;
                count += 1;
            }
            RecordKind::Context => {
                dest.create_record(&record_path, None)?;
                count += copy_tree(src, dest, &record_path)?;
            }
        }
    }

    Ok(count)
}

/// Copy, then verify. Returns the copy count and the verification report.
pub fn roundtrip<S, D>(src: &S, dest: &D, root: &str) -> CapabilityResult<(usize, VerifyReport)>
where
    S: ImmutableCapability + ?Sized,
    D: ImmutableCapability + ?Sized,
{
    let copied = copy_tree(src, dest, root)?;
    let report = verify(src, dest, root)?;

    let copied_str = copied.to_string();
    let mismatches = report.mismatches.len().to_string();
    Logger::info(
        "roundtrip_complete",
        &[
            ("copied", copied_str.as_str()),
            ("mismatches", mismatches.as_str()),
            ("root", root),
        ],
    );

    Ok((copied, report))
}

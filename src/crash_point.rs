//! Crash point injection for testing the write-ordering windows
//!
//! When `MYCELIUM_CRASH_POINT` names a point, the process terminates via
//! `std::process::abort()` when execution reaches it: no cleanup, no
//! unwinding, no catching. This is how the state left behind by a crash
//! between the two writes of a tracked operation is reproduced.
//!
//! # Usage
//!
//! ```ignore
//! use mycelium::crash_point::{maybe_crash, points};
//!
//! maybe_crash(points::TRACKED_WRITE_BETWEEN_WRITES);
//! ```
//!
//! # Testing
//!
//! ```bash
//! MYCELIUM_CRASH_POINT=tracked_write_between_writes mycelium write a.txt hi
//! ```

use std::sync::OnceLock;

/// Environment variable naming the active crash point
pub const CRASH_POINT_ENV: &str = "MYCELIUM_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Check if a specific crash point is enabled
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled
///
/// No-op when `MYCELIUM_CRASH_POINT` is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    // Tracked decorator: after the first of the two writes
    pub const TRACKED_CREATE_BETWEEN_WRITES: &str = "tracked_create_between_writes";
    pub const TRACKED_WRITE_BETWEEN_WRITES: &str = "tracked_write_between_writes";

    // Tracked decorator: primary deleted, companion not yet
    pub const TRACKED_DELETE_BEFORE_CHANGELOG: &str = "tracked_delete_before_changelog";

    // Document capability: temporary file written, not yet renamed
    pub const DOCUMENT_BEFORE_RENAME: &str = "document_before_rename";

    pub fn all() -> &'static [&'static str] {
        &[
            TRACKED_CREATE_BETWEEN_WRITES,
            TRACKED_WRITE_BETWEEN_WRITES,
            TRACKED_DELETE_BEFORE_CHANGELOG,
            DOCUMENT_BEFORE_RENAME,
        ]
    }
}

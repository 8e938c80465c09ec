//! # Tracked Capability
//!
//! Wraps any [`MutableCapability`] and keeps an append-only changelog next
//! to every file record it creates or writes:
//!
//! - `a/b.txt` is tracked by the sibling file record `a/b.txt.changelog`
//! - contexts are never tracked
//! - companions are ordinary file records and are never tracked themselves
//!
//! The two writes of a tracked create/write are ordered by the configured
//! [`CausalityMode`]. A crash between them is not repaired: the mode only
//! decides which side is authoritative afterwards.

pub mod changelog;
mod mode;

pub use changelog::{
    companion_path, fingerprint, is_companion, owner_key, parse_changelog, ChangelogEntry,
    ChangelogOperation, CHANGELOG_SUFFIX,
};
pub use mode::CausalityMode;

use crate::capability::path as lpath;
use crate::capability::{
    CapabilityError, CapabilityResult, Context, FlatRecord, ImmutableCapability,
    MutableCapability, RecordKind,
};
use crate::crash_point::{maybe_crash, points};
use crate::observability::Logger;

/// Changelog-keeping decorator
#[derive(Debug, Clone)]
pub struct TrackedCapability<C> {
    inner: C,
    mode: CausalityMode,
}

impl<C: MutableCapability> TrackedCapability<C> {
    pub fn new(inner: C, mode: CausalityMode) -> Self {
        Self { inner, mode }
    }

    pub fn mode(&self) -> CausalityMode {
        self.mode
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Entries of one record's changelog, in append order.
    ///
    /// An existing record without a companion has an empty history. Fails
    /// NotFound only when neither the record nor a companion exists.
    pub fn read_log(&self, path: &str) -> CapabilityResult<Vec<ChangelogEntry>> {
        let log_path = companion_path(path)?;
        match self.read_log_text(&log_path)? {
            Some(text) => parse_changelog(&text, lpath::key_of(path), &log_path),
            None => match self.inner.kind(path)? {
                Some(_) => Ok(Vec::new()),
                None => Err(CapabilityError::NotFound(path.to_string())),
            },
        }
    }

    /// Every changelog entry of a context's immediate file records, merged
    /// and sorted by timestamp. Ties keep encounter order.
    pub fn read_context_log(&self, path: &str) -> CapabilityResult<Vec<ChangelogEntry>> {
        let ctx = self.inner.read_context(path)?;
        let mut entries = Vec::new();

        for record in ctx
            .records
            .iter()
            .filter(|r| r.is_file() && is_companion(&r.key))
        {
            let record_path = lpath::join(path, &record.key);
            let text = decode_text(self.inner.read_record(&record_path)?, &record_path)?;
            entries.extend(parse_changelog(&text, owner_key(&record.key), &record_path)?);
        }

        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    /// Current companion text, `None` if there is no companion
    fn read_log_text(&self, log_path: &str) -> CapabilityResult<Option<String>> {
        match self.inner.kind(log_path)? {
            Some(RecordKind::File) => {
                let raw = self.inner.read_record(log_path)?;
                decode_text(raw, log_path).map(Some)
            }
            Some(RecordKind::Context) => Err(CapabilityError::NotAFileRecord(log_path.to_string())),
            None => Ok(None),
        }
    }

    /// Companion text with `entry` appended
    fn appended_log(&self, log_path: &str, entry: &ChangelogEntry) -> CapabilityResult<String> {
        let mut text = self.read_log_text(log_path)?.unwrap_or_default();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&entry.to_line());
        Ok(text)
    }

    fn trace(&self, event: &str, path: &str, entry: &ChangelogEntry) {
        Logger::trace(
            event,
            &[
                ("fingerprint", entry.fingerprint.as_str()),
                ("mode", self.mode.as_str()),
                ("operation", entry.operation.as_str()),
                ("path", path),
            ],
        );
    }
}

fn decode_text(raw: Vec<u8>, path: &str) -> CapabilityResult<String> {
    String::from_utf8(raw).map_err(|e| CapabilityError::CorruptChangelog {
        path: path.to_string(),
        line: 0,
        reason: format!("not UTF-8: {}", e),
    })
}

/// Paths whose mutations bypass tracking
fn untracked(path: &str) -> bool {
    lpath::is_root(path) || is_companion(lpath::key_of(path))
}

impl<C: MutableCapability> ImmutableCapability for TrackedCapability<C> {
    fn read_context(&self, path: &str) -> CapabilityResult<Context> {
        self.inner.read_context(path)
    }

    fn read_record(&self, path: &str) -> CapabilityResult<Vec<u8>> {
        self.inner.read_record(path)
    }

    fn flatten(&self, path: &str) -> CapabilityResult<Vec<FlatRecord>> {
        self.inner.flatten(path)
    }

    fn create_record(&self, path: &str, content: Option<&[u8]>) -> CapabilityResult<()> {
        let content = match content {
            Some(bytes) if !untracked(path) => bytes,
            // Contexts and companions
            _ => return self.inner.create_record(path, content),
        };

        let log_path = companion_path(path)?;
        let entry = ChangelogEntry::record(ChangelogOperation::Created, content, lpath::key_of(path));

        match self.mode {
            CausalityMode::LogFirst => {
                // Journal only requests that can succeed
                if self.inner.kind(path)?.is_some() {
                    return Err(CapabilityError::AlreadyExists(path.to_string()));
                }
                let log = self.appended_log(&log_path, &entry)?;
                self.inner.upsert_record(&log_path, log.as_bytes())?;
                maybe_crash(points::TRACKED_CREATE_BETWEEN_WRITES);
                self.inner.create_record(path, Some(content))?;
            }
            CausalityMode::ResourceFirst => {
                self.inner.create_record(path, Some(content))?;
                maybe_crash(points::TRACKED_CREATE_BETWEEN_WRITES);
                let log = self.appended_log(&log_path, &entry)?;
                self.inner.upsert_record(&log_path, log.as_bytes())?;
            }
        }

        self.trace("tracked_create", path, &entry);
        Ok(())
    }

    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>> {
        self.inner.kind(path)
    }
}

impl<C: MutableCapability> MutableCapability for TrackedCapability<C> {
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        if untracked(path) {
            return self.inner.write_record(path, content);
        }

        let log_path = companion_path(path)?;
        let entry = ChangelogEntry::record(ChangelogOperation::Written, content, lpath::key_of(path));
        let log = self.appended_log(&log_path, &entry)?;

        match self.mode {
            CausalityMode::LogFirst => {
                match self.inner.kind(path)? {
                    Some(RecordKind::File) => {}
                    Some(RecordKind::Context) => {
                        return Err(CapabilityError::NotAFileRecord(path.to_string()))
                    }
                    None => return Err(CapabilityError::NotFound(path.to_string())),
                }
                self.inner.upsert_record(&log_path, log.as_bytes())?;
                maybe_crash(points::TRACKED_WRITE_BETWEEN_WRITES);
                self.inner.write_record(path, content)?;
            }
            CausalityMode::ResourceFirst => {
                self.inner.write_record(path, content)?;
                maybe_crash(points::TRACKED_WRITE_BETWEEN_WRITES);
                self.inner.upsert_record(&log_path, log.as_bytes())?;
            }
        }

        self.trace("tracked_write", path, &entry);
        Ok(())
    }

    fn delete_record(&self, path: &str) -> CapabilityResult<()> {
        self.inner.delete_record(path)?;
        if untracked(path) {
            return Ok(());
        }

        maybe_crash(points::TRACKED_DELETE_BEFORE_CHANGELOG);

        let log_path = companion_path(path)?;
        match self.inner.delete_record(&log_path) {
            Ok(()) => Logger::trace("changelog_deleted", &[("path", log_path.as_str())]),
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                let error = e.to_string();
                Logger::warn(
                    "changelog_delete_failed",
                    &[("error", error.as_str()), ("path", log_path.as_str())],
                );
            }
        }
        Ok(())
    }
}

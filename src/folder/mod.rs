//! # Folder Capability
//!
//! Binds the logical model 1:1 onto a real directory tree: a context is a
//! directory, a file record is any other entry. All I/O is direct and
//! synchronous.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::capability::path::{self as lpath, segments};
use crate::capability::{
    sort_flat, CapabilityError, CapabilityResult, Context, FlatRecord, ImmutableCapability,
    MutableCapability, Record, RecordKind,
};

/// Directory-backed capability
#[derive(Debug, Clone)]
pub struct FolderCapability {
    root: PathBuf,
}

impl FolderCapability {
    /// Create a capability rooted at `root`. The directory is created on
    /// first write if missing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> CapabilityResult<PathBuf> {
        let mut full = self.root.clone();
        for segment in segments(path)? {
            full.push(segment);
        }
        Ok(full)
    }

    /// Create every missing directory for `parents`, failing on a file
    fn ensure_parents(&self, parents: &[&str]) -> CapabilityResult<PathBuf> {
        fs::create_dir_all(&self.root)?;

        let mut current = self.root.clone();
        for (i, segment) in parents.iter().enumerate() {
            current.push(segment);
            match probe(&current)? {
                Some(RecordKind::Context) => {}
                Some(RecordKind::File) => {
                    return Err(CapabilityError::PathConflict(parents[..=i].join("/")))
                }
                None => fs::create_dir(&current)?,
            }
        }
        Ok(current)
    }
}

/// Metadata of an entry; a dangling symlink is described by the link itself
fn entry_metadata(full: &Path) -> io::Result<fs::Metadata> {
    match fs::metadata(full) {
        Err(e) if is_missing(&e) => fs::symlink_metadata(full),
        other => other,
    }
}

/// Classify a filesystem entry, `None` if nothing is there
fn probe(full: &Path) -> CapabilityResult<Option<RecordKind>> {
    match entry_metadata(full) {
        Ok(meta) if meta.is_dir() => Ok(Some(RecordKind::Context)),
        Ok(_) => Ok(Some(RecordKind::File)),
        Err(e) if is_missing(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A lookup through a file segment is a miss, not a failure
fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Path of a symlink whose target is gone, if that is what `e` reports
fn dangling_link(e: &walkdir::Error) -> Option<&Path> {
    let missing = e.io_error().map(is_missing).unwrap_or(false);
    let path = e.path()?;
    let is_link = fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);
    (missing && is_link).then_some(path)
}

fn entry_count(dir: &Path) -> CapabilityResult<u64> {
    Ok(fs::read_dir(dir)?.count() as u64)
}

impl ImmutableCapability for FolderCapability {
    fn read_context(&self, path: &str) -> CapabilityResult<Context> {
        let full = self.full_path(path)?;
        if probe(&full)? != Some(RecordKind::Context) {
            return Err(CapabilityError::NotAContext(path.to_string()));
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&full)? {
            let entry = entry?;
            let key = entry.file_name().to_string_lossy().into_owned();
            let meta = entry_metadata(&entry.path())?;

            if meta.is_dir() {
                records.push(Record::context(key, entry_count(&entry.path())?));
            } else {
                records.push(Record::file(key, meta.len()));
            }
        }
        records.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(Context {
            path: path.to_string(),
            records,
        })
    }

    fn read_record(&self, path: &str) -> CapabilityResult<Vec<u8>> {
        let full = self.full_path(path)?;
        if probe(&full)? != Some(RecordKind::File) {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        }
        Ok(fs::read(&full)?)
    }

    fn flatten(&self, path: &str) -> CapabilityResult<Vec<FlatRecord>> {
        let full = self.full_path(path)?;
        if probe(&full)? != Some(RecordKind::Context) {
            return Err(CapabilityError::NotAContext(path.to_string()));
        }

        let mut result = Vec::new();
        for entry in WalkDir::new(&full).min_depth(1).follow_links(true) {
            let (entry_path, size) = match entry {
                Ok(entry) if entry.file_type().is_dir() => continue,
                Ok(entry) => {
                    let size = entry
                        .metadata()
                        .map_err(|e| CapabilityError::Io(e.to_string()))?
                        .len();
                    (entry.into_path(), size)
                }
                Err(e) => match dangling_link(&e) {
                    Some(link) => {
                        let size = fs::symlink_metadata(link)?.len();
                        (link.to_path_buf(), size)
                    }
                    None => return Err(CapabilityError::Io(e.to_string())),
                },
            };

            let relative = entry_path
                .strip_prefix(&full)
                .map_err(|e| CapabilityError::Io(e.to_string()))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            result.push(FlatRecord { key, size });
        }

        sort_flat(&mut result);
        Ok(result)
    }

    fn create_record(&self, path: &str, content: Option<&[u8]>) -> CapabilityResult<()> {
        let parts = segments(path)?;
        let Some((key, parents)) = parts.split_last() else {
            return Err(CapabilityError::AlreadyExists(path.to_string()));
        };

        let mut target = self.ensure_parents(parents)?;
        target.push(key);
        if probe(&target)?.is_some() {
            return Err(CapabilityError::AlreadyExists(path.to_string()));
        }

        match content {
            Some(bytes) => {
                let mut file = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&target)
                    .map_err(|e| match e.kind() {
                        io::ErrorKind::AlreadyExists => {
                            CapabilityError::AlreadyExists(path.to_string())
                        }
                        _ => e.into(),
                    })?;
                file.write_all(bytes)?;
            }
            None => fs::create_dir(&target)?,
        }
        Ok(())
    }

    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>> {
        probe(&self.full_path(path)?)
    }
}

impl MutableCapability for FolderCapability {
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        let full = self.full_path(path)?;
        match probe(&full)? {
            Some(RecordKind::File) => Ok(fs::write(&full, content)?),
            Some(RecordKind::Context) => Err(CapabilityError::NotAFileRecord(path.to_string())),
            None => Err(CapabilityError::NotFound(path.to_string())),
        }
    }

    fn delete_record(&self, path: &str) -> CapabilityResult<()> {
        if lpath::is_root(path) {
            return Err(CapabilityError::InvalidPath(path.to_string()));
        }

        let full = self.full_path(path)?;
        match probe(&full)? {
            Some(RecordKind::File) => Ok(fs::remove_file(&full)?),
            Some(RecordKind::Context) => Ok(fs::remove_dir_all(&full)?),
            None => Err(CapabilityError::NotFound(path.to_string())),
        }
    }

    fn upsert_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        let parts = segments(path)?;
        let Some((key, parents)) = parts.split_last() else {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        };

        let mut target = self.ensure_parents(parents)?;
        target.push(key);
        if probe(&target)? == Some(RecordKind::Context) {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        }

        // Creates or truncates in one open
        Ok(fs::write(&target, content)?)
    }
}

//! Load and save of the backing document
//!
//! Saves are atomic swap-on-save:
//! 1. Serialize the whole tree
//! 2. Write `<file>.tmp` and fsync it
//! 3. Rename over `<file>`
//! 4. fsync the parent directory (unix)
//!
//! A crash before step 3 leaves the previous document intact. There is no
//! lock: two writers on one file race and the last rename wins.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::capability::{CapabilityError, CapabilityResult};
use crate::crash_point::{maybe_crash, points};

use super::node::DocumentTree;

/// The single file holding a document tree
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Load the tree. A missing or blank file is an empty root.
    pub fn load(&self) -> CapabilityResult<DocumentTree> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DocumentTree::default()),
            Err(e) => return Err(e.into()),
        };

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(DocumentTree::default());
        }

        // Encoding errors surface from serde as corruption too
        serde_json::from_slice(&raw).map_err(|e| CapabilityError::CorruptDocument {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace the persisted tree
    pub fn save(&self, tree: &DocumentTree) -> CapabilityResult<()> {
        let json = serde_json::to_string_pretty(tree).map_err(|e| {
            CapabilityError::Io(format!("Failed to serialize document: {}", e))
        })?;

        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        if let Err(e) = write_synced(&temp, json.as_bytes()) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        maybe_crash(points::DOCUMENT_BEFORE_RENAME);

        fs::rename(&temp, &self.path)?;
        self.fsync_parent()
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    #[cfg(unix)]
    fn fsync_parent(&self) -> CapabilityResult<()> {
        let parent = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let dir = fs::OpenOptions::new().read(true).open(parent)?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn fsync_parent(&self) -> CapabilityResult<()> {
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::Node;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_root() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::new(temp.path().join("store.json"));

        assert_eq!(store.load().unwrap(), DocumentTree::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let store = DocumentStore::new(temp.path().join("nested/store.json"));

        let mut tree = DocumentTree::default();
        tree.children.insert("a.txt".into(), Node::file(b"hello"));
        store.save(&tree).unwrap();

        assert_eq!(store.load().unwrap(), tree);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_garbage_is_corruption() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = DocumentStore::new(path);
        assert!(matches!(
            store.load(),
            Err(CapabilityError::CorruptDocument { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_corruption() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(&path, [0xff, 0xfe, b'{']).unwrap();

        let store = DocumentStore::new(path);
        assert!(matches!(
            store.load(),
            Err(CapabilityError::CorruptDocument { .. })
        ));
    }

    #[test]
    fn test_whitespace_file_is_empty_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(&path, " \n\t").unwrap();

        assert_eq!(
            DocumentStore::new(path).load().unwrap(),
            DocumentTree::default()
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_failed_write_removes_temp_file() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let store = DocumentStore::new(temp.path().join("store.json"));
        let mut tree = DocumentTree::default();
        tree.children.insert("a.txt".into(), Node::file(b"hello"));
        store.save(&tree).unwrap();

        // Every write through the temp path now fails with ENOSPC
        std::os::unix::fs::symlink(full, store.temp_path()).unwrap();

        tree.children.insert("b.txt".into(), Node::file(b"lost"));
        assert!(matches!(store.save(&tree), Err(CapabilityError::Io(_))));

        assert!(fs::symlink_metadata(store.temp_path()).is_err());
        assert_eq!(store.load().unwrap().children.len(), 1);
    }
}

//! # Document Capability
//!
//! Holds the whole hierarchy as one persisted JSON tree. Every operation is
//! a full load, mutate, save cycle: nothing is cached between calls and
//! failed operations never save.

mod node;
mod store;

pub use node::{Children, DocumentTree, Node};
pub use store::DocumentStore;

use std::path::{Path, PathBuf};

use crate::capability::path::{self as lpath, segments};
use crate::capability::{
    sort_flat, CapabilityError, CapabilityResult, Context, FlatRecord, ImmutableCapability,
    MutableCapability, Record, RecordKind,
};

use node::{decode_content, Found};

/// Single-document capability
#[derive(Debug, Clone)]
pub struct DocumentCapability {
    store: DocumentStore,
}

impl DocumentCapability {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            store: DocumentStore::new(file),
        }
    }

    /// Backing file
    pub fn file(&self) -> &Path {
        self.store.path()
    }
}

fn flatten_into(
    children: &Children,
    prefix: &str,
    base: &str,
    out: &mut Vec<FlatRecord>,
) -> CapabilityResult<()> {
    for (key, child) in children {
        let full = lpath::join(prefix, key);
        match child {
            Node::File { content } => {
                let size = decode_content(content, &lpath::join(base, &full))?.len() as u64;
                out.push(FlatRecord { key: full, size });
            }
            Node::Context { children } => flatten_into(children, &full, base, out)?,
        }
    }
    Ok(())
}

impl ImmutableCapability for DocumentCapability {
    fn read_context(&self, path: &str) -> CapabilityResult<Context> {
        let tree = self.store.load()?;
        let parts = segments(path)?;
        let Some(Found::Context(children)) = tree.find(&parts) else {
            return Err(CapabilityError::NotAContext(path.to_string()));
        };

        let mut records = Vec::with_capacity(children.len());
        for (key, child) in children {
            match child {
                Node::File { content } => {
                    let size = decode_content(content, &lpath::join(path, key))?.len();
                    records.push(Record::file(key.clone(), size as u64));
                }
                Node::Context { children } => {
                    records.push(Record::context(key.clone(), children.len() as u64));
                }
            }
        }

        Ok(Context {
            path: path.to_string(),
            records,
        })
    }

    fn read_record(&self, path: &str) -> CapabilityResult<Vec<u8>> {
        let tree = self.store.load()?;
        match tree.find(&segments(path)?) {
            Some(Found::File(content)) => decode_content(content, path),
            _ => Err(CapabilityError::NotAFileRecord(path.to_string())),
        }
    }

    fn flatten(&self, path: &str) -> CapabilityResult<Vec<FlatRecord>> {
        let tree = self.store.load()?;
        let Some(Found::Context(children)) = tree.find(&segments(path)?) else {
            return Err(CapabilityError::NotAContext(path.to_string()));
        };

        let mut result = Vec::new();
        flatten_into(children, "", path, &mut result)?;
        sort_flat(&mut result);
        Ok(result)
    }

    fn create_record(&self, path: &str, content: Option<&[u8]>) -> CapabilityResult<()> {
        let parts = segments(path)?;
        let Some((key, parents)) = parts.split_last() else {
            return Err(CapabilityError::AlreadyExists(path.to_string()));
        };

        let mut tree = self.store.load()?;
        let children = tree.ensure_context(parents)?;
        if children.contains_key(*key) {
            return Err(CapabilityError::AlreadyExists(path.to_string()));
        }

        let node = match content {
            Some(bytes) => Node::file(bytes),
            None => Node::empty_context(),
        };
        children.insert((*key).to_string(), node);

        self.store.save(&tree)
    }

    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>> {
        let tree = self.store.load()?;
        Ok(match tree.find(&segments(path)?) {
            Some(Found::File(_)) => Some(RecordKind::File),
            Some(Found::Context(_)) => Some(RecordKind::Context),
            None => None,
        })
    }
}

impl MutableCapability for DocumentCapability {
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        let parts = segments(path)?;
        let Some((key, parents)) = parts.split_last() else {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        };

        let mut tree = self.store.load()?;
        let node = tree
            .context_mut(parents)
            .and_then(|children| children.get_mut(*key))
            .ok_or_else(|| CapabilityError::NotFound(path.to_string()))?;

        if let Node::Context { .. } = node {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        }
        *node = Node::file(content);

        self.store.save(&tree)
    }

    fn delete_record(&self, path: &str) -> CapabilityResult<()> {
        let parts = segments(path)?;
        let Some((key, parents)) = parts.split_last() else {
            return Err(CapabilityError::InvalidPath(path.to_string()));
        };

        let mut tree = self.store.load()?;
        tree.context_mut(parents)
            .and_then(|children| children.remove(*key))
            .ok_or_else(|| CapabilityError::NotFound(path.to_string()))?;

        self.store.save(&tree)
    }

    fn upsert_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        let parts = segments(path)?;
        let Some((key, parents)) = parts.split_last() else {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        };

        let mut tree = self.store.load()?;
        let children = tree.ensure_context(parents)?;
        if let Some(Node::Context { .. }) = children.get(*key) {
            return Err(CapabilityError::NotAFileRecord(path.to_string()));
        }
        children.insert((*key).to_string(), Node::file(content));

        self.store.save(&tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DocumentCapability) {
        let temp = TempDir::new().unwrap();
        let cap = DocumentCapability::new(temp.path().join("mycelium.json"));
        (temp, cap)
    }

    #[test]
    fn test_root_always_exists() {
        let (_temp, cap) = setup();

        let ctx = cap.read_context("").unwrap();
        assert!(ctx.records.is_empty());
        assert_eq!(cap.kind(".").unwrap(), Some(RecordKind::Context));
    }

    #[test]
    fn test_create_read_binary() {
        let (_temp, cap) = setup();

        let bytes = [0u8, 159, 146, 150, 255];
        cap.create_record("bin/blob", Some(&bytes)).unwrap();
        assert_eq!(cap.read_record("bin/blob").unwrap(), bytes);
    }

    #[test]
    fn test_create_persists_across_instances() {
        let (temp, cap) = setup();

        cap.create_record("a.txt", Some(b"hello")).unwrap();

        let reopened = DocumentCapability::new(temp.path().join("mycelium.json"));
        assert_eq!(reopened.read_record("a.txt").unwrap(), b"hello");
    }

    #[test]
    fn test_create_auto_creates_intermediate_contexts() {
        let (_temp, cap) = setup();

        cap.create_record("a/b/c.txt", Some(b"c")).unwrap();
        let ctx = cap.read_context("a").unwrap();
        assert_eq!(ctx.records, vec![Record::context("b", 1)]);
    }

    #[test]
    fn test_create_path_conflict_leaves_document_untouched() {
        let (_temp, cap) = setup();

        cap.create_record("a.txt", Some(b"x")).unwrap();
        let before = std::fs::read_to_string(cap.file()).unwrap();

        assert_eq!(
            cap.create_record("a.txt/b/c", None),
            Err(CapabilityError::PathConflict("a.txt".into()))
        );
        assert_eq!(std::fs::read_to_string(cap.file()).unwrap(), before);
    }

    #[test]
    fn test_create_collision() {
        let (_temp, cap) = setup();

        cap.create_record("d", None).unwrap();
        assert!(matches!(
            cap.create_record("d", Some(b"x")),
            Err(CapabilityError::AlreadyExists(_))
        ));
        assert!(matches!(
            cap.create_record("", None),
            Err(CapabilityError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_type_mismatches() {
        let (_temp, cap) = setup();

        cap.create_record("f.txt", Some(b"x")).unwrap();
        cap.create_record("d", None).unwrap();

        assert!(matches!(
            cap.read_context("f.txt"),
            Err(CapabilityError::NotAContext(_))
        ));
        assert!(matches!(
            cap.read_context("f.txt/deeper"),
            Err(CapabilityError::NotAContext(_))
        ));
        assert!(matches!(
            cap.read_record("d"),
            Err(CapabilityError::NotAFileRecord(_))
        ));
        assert!(matches!(
            cap.flatten("f.txt"),
            Err(CapabilityError::NotAContext(_))
        ));
    }

    #[test]
    fn test_write_and_delete() {
        let (_temp, cap) = setup();

        assert!(matches!(
            cap.write_record("missing", b"x"),
            Err(CapabilityError::NotFound(_))
        ));

        cap.create_record("d/a.txt", Some(b"one")).unwrap();
        cap.write_record("d/a.txt", b"two").unwrap();
        assert_eq!(cap.read_record("d/a.txt").unwrap(), b"two");

        assert!(matches!(
            cap.write_record("d", b"x"),
            Err(CapabilityError::NotAFileRecord(_))
        ));

        cap.delete_record("d").unwrap();
        assert_eq!(cap.kind("d/a.txt").unwrap(), None);
        assert!(matches!(
            cap.delete_record("d"),
            Err(CapabilityError::NotFound(_))
        ));
    }

    #[test]
    fn test_flatten_sorted() {
        let (_temp, cap) = setup();

        cap.create_record("b.txt", Some(b"bb")).unwrap();
        cap.create_record("a/z.txt", Some(b"z")).unwrap();
        cap.create_record("a/m/n.txt", Some(b"nnn")).unwrap();

        let flat = cap.flatten("").unwrap();
        assert_eq!(
            flat,
            vec![
                FlatRecord { key: "a/m/n.txt".into(), size: 3 },
                FlatRecord { key: "a/z.txt".into(), size: 1 },
                FlatRecord { key: "b.txt".into(), size: 2 },
            ]
        );
    }

    #[test]
    fn test_upsert() {
        let (_temp, cap) = setup();

        cap.upsert_record("x/a.changelog", b"1\n").unwrap();
        cap.upsert_record("x/a.changelog", b"1\n2\n").unwrap();
        assert_eq!(cap.read_record("x/a.changelog").unwrap(), b"1\n2\n");
    }
}

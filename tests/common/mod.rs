//! Shared helpers for integration tests

#![allow(dead_code)]

use std::cell::Cell;

use mycelium::capability::{
    CapabilityError, CapabilityResult, Context, FlatRecord, ImmutableCapability,
    MutableCapability, RecordKind,
};
use mycelium::document::DocumentCapability;
use mycelium::folder::FolderCapability;
use tempfile::TempDir;

/// Which side of a tracked mutation to break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultTarget {
    /// Mutations of `*.changelog` companions
    Changelog,
    /// Mutations of anything else
    Primary,
}

/// Wraps a capability and fails mutations once armed.
///
/// Stands in for a crash between the two writes of a tracked operation: the
/// first write lands, the second never does.
#[derive(Debug)]
pub struct FaultyCapability<C> {
    inner: C,
    target: FaultTarget,
    armed: Cell<bool>,
}

impl<C: MutableCapability> FaultyCapability<C> {
    pub fn new(inner: C, target: FaultTarget) -> Self {
        Self {
            inner,
            target,
            armed: Cell::new(false),
        }
    }

    pub fn arm(&self) {
        self.armed.set(true);
    }

    pub fn disarm(&self) {
        self.armed.set(false);
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    fn check(&self, path: &str) -> CapabilityResult<()> {
        if !self.armed.get() {
            return Ok(());
        }
        let is_log = path.ends_with(".changelog");
        let hit = match self.target {
            FaultTarget::Changelog => is_log,
            FaultTarget::Primary => !is_log,
        };
        if hit {
            Err(CapabilityError::Io(format!("injected fault at {}", path)))
        } else {
            Ok(())
        }
    }
}

impl<C: MutableCapability> ImmutableCapability for FaultyCapability<C> {
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
        self.check(path)?;
        self.inner.create_record(path, content)
    }

    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>> {
        self.inner.kind(path)
    }
}

impl<C: MutableCapability> MutableCapability for FaultyCapability<C> {
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        self.check(path)?;
        self.inner.write_record(path, content)
    }

    fn delete_record(&self, path: &str) -> CapabilityResult<()> {
        self.check(path)?;
        self.inner.delete_record(path)
    }

    fn upsert_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        self.check(path)?;
        self.inner.upsert_record(path, content)
    }
}

/// Both bindings, each over its own temp location
pub fn backends() -> Vec<(TempDir, Box<dyn MutableCapability>)> {
    let folder_dir = TempDir::new().expect("Failed to create temp dir");
    let folder = FolderCapability::new(folder_dir.path().join("root"));

    let doc_dir = TempDir::new().expect("Failed to create temp dir");
    let doc = DocumentCapability::new(doc_dir.path().join("mycelium.json"));

    vec![
        (folder_dir, Box::new(folder) as Box<dyn MutableCapability>),
        (doc_dir, Box::new(doc) as Box<dyn MutableCapability>),
    ]
}

/// A small mixed tree: nested contexts, an empty context, binary content
pub fn populate(cap: &dyn MutableCapability) {
    cap.create_record("readme.md", Some(b"# mycelium\n")).unwrap();
    cap.create_record("src/lib.rs", Some(b"pub mod a;\n")).unwrap();
    cap.create_record("src/a/mod.rs", Some(b"")).unwrap();
    cap.create_record("src/a/data.bin", Some(&[0, 1, 2, 254, 255])).unwrap();
    cap.create_record("assets", None).unwrap();
    cap.create_record("assets/empty", None).unwrap();
    cap.create_record("zeta.txt", Some(b"last")).unwrap();
}

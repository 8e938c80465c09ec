//! # Capability Interface
//!
//! A capability binds the logical model to a physical substrate. The model
//! never knows which capability is active.
//!
//! - [`ImmutableCapability`]: operations that cannot destroy information
//! - [`MutableCapability`]: adds overwrite and delete
//!
//! Operations on one instance are strictly sequential: each call runs to
//! completion (or a terminal error) before the next is issued.

pub mod errors;
pub mod path;
pub mod types;

pub use errors::{CapabilityError, CapabilityResult};
pub use types::{sort_flat, Context, FlatRecord, Record, RecordKind};

/// Read and create operations
pub trait ImmutableCapability: std::fmt::Debug {
    /// Immediate records of a context
    fn read_context(&self, path: &str) -> CapabilityResult<Context>;

    /// Raw bytes of a file record
    fn read_record(&self, path: &str) -> CapabilityResult<Vec<u8>>;

    /// Every file leaf below a context, sorted ascending by key
    fn flatten(&self, path: &str) -> CapabilityResult<Vec<FlatRecord>>;

    /// Create a file (`Some(content)`) or a context (`None`).
    ///
    /// Missing intermediate contexts are created along the way.
    fn create_record(&self, path: &str, content: Option<&[u8]>) -> CapabilityResult<()>;

    /// Kind of the record at `path`, `None` if nothing is there
    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>>;
}

/// Operations that change or remove information
pub trait MutableCapability: ImmutableCapability {
    /// Replace the content of an existing file record
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()>;

    /// Delete a record; contexts are deleted recursively
    fn delete_record(&self, path: &str) -> CapabilityResult<()>;

    /// Overwrite a file record, creating it (and missing ancestors) if absent.
    ///
    /// Fails NotAFileRecord if a context occupies the path. Backends that can
    /// do this in one step override the probe-then-act default.
    fn upsert_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        match self.kind(path)? {
            Some(RecordKind::File) => self.write_record(path, content),
            Some(RecordKind::Context) => Err(CapabilityError::NotAFileRecord(path.to_string())),
            None => self.create_record(path, Some(content)),
        }
    }
}

impl<C: ImmutableCapability + ?Sized> ImmutableCapability for Box<C> {
    fn read_context(&self, path: &str) -> CapabilityResult<Context> {
        (**self).read_context(path)
    }

    fn read_record(&self, path: &str) -> CapabilityResult<Vec<u8>> {
        (**self).read_record(path)
    }

    fn flatten(&self, path: &str) -> CapabilityResult<Vec<FlatRecord>> {
        (**self).flatten(path)
    }

    fn create_record(&self, path: &str, content: Option<&[u8]>) -> CapabilityResult<()> {
        (**self).create_record(path, content)
    }

    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>> {
        (**self).kind(path)
    }
}

impl<C: MutableCapability + ?Sized> MutableCapability for Box<C> {
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        (**self).write_record(path, content)
    }

    fn delete_record(&self, path: &str) -> CapabilityResult<()> {
        (**self).delete_record(path)
    }

    fn upsert_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        (**self).upsert_record(path, content)
    }
}

impl<C: ImmutableCapability + ?Sized> ImmutableCapability for &C {
    fn read_context(&self, path: &str) -> CapabilityResult<Context> {
        (**self).read_context(path)
    }

    fn read_record(&self, path: &str) -> CapabilityResult<Vec<u8>> {
        (**self).read_record(path)
    }

    fn flatten(&self, path: &str) -> CapabilityResult<Vec<FlatRecord>> {
        (**self).flatten(path)
    }

    fn create_record(&self, path: &str, content: Option<&[u8]>) -> CapabilityResult<()> {
        (**self).create_record(path, content)
    }

    fn kind(&self, path: &str) -> CapabilityResult<Option<RecordKind>> {
        (**self).kind(path)
    }
}

impl<C: MutableCapability + ?Sized> MutableCapability for &C {
    fn write_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        (**self).write_record(path, content)
    }

    fn delete_record(&self, path: &str) -> CapabilityResult<()> {
        (**self).delete_record(path)
    }

    fn upsert_record(&self, path: &str, content: &[u8]) -> CapabilityResult<()> {
        (**self).upsert_record(path, content)
    }
}

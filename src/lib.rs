//! mycelium - A record/context data model over pluggable storage capabilities
//!
//! A capability binds the logical model (records and contexts) to a physical
//! substrate. Two bindings ship here:
//! - [`folder::FolderCapability`]: a real directory tree
//! - [`document::DocumentCapability`]: one persisted JSON document
//!
//! [`tracked::TrackedCapability`] wraps either one and keeps an append-only
//! changelog next to every file record, ordered by a [`tracked::CausalityMode`].

pub mod capability;
pub mod cli;
pub mod crash_point;
pub mod document;
pub mod folder;
pub mod observability;
pub mod roundtrip;
pub mod tracked;

//! In-memory document tree
//!
//! ```json
//! {
//!   "children": {
//!     "readme.md": { "type": "file", "content": "<base64>" },
//!     "src": { "type": "context", "children": { ... } }
//!   }
//! }
//! ```
//!
//! The root carries no tag: it is always a context and always present.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityError, CapabilityResult};

/// Child name to node
pub type Children = BTreeMap<String, Node>;

/// A file or context node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    File {
        /// Base64 of the raw bytes
        content: String,
    },
    Context {
        #[serde(default)]
        children: Children,
    },
}

impl Node {
    pub fn file(bytes: &[u8]) -> Self {
        Node::File {
            content: STANDARD.encode(bytes),
        }
    }

    pub fn empty_context() -> Self {
        Node::Context {
            children: Children::new(),
        }
    }
}

/// Decode a file node's content
pub fn decode_content(content: &str, path: &str) -> CapabilityResult<Vec<u8>> {
    STANDARD
        .decode(content)
        .map_err(|e| CapabilityError::CorruptDocument {
            path: path.to_string(),
            reason: format!("invalid base64 content: {}", e),
        })
}

/// Result of walking a path
#[derive(Debug, Clone, Copy)]
pub enum Found<'a> {
    Context(&'a Children),
    File(&'a str),
}

/// The persisted root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTree {
    #[serde(default)]
    pub children: Children,
}

impl DocumentTree {
    /// Walk `segments` from the root.
    ///
    /// `None` if a segment is missing or a file sits in a non-terminal
    /// position.
    pub fn find(&self, segments: &[&str]) -> Option<Found<'_>> {
        let mut children = &self.children;
        for (i, segment) in segments.iter().enumerate() {
            match children.get(*segment)? {
                Node::File { content } => {
                    return if i + 1 == segments.len() {
                        Some(Found::File(content))
                    } else {
                        None
                    };
                }
                Node::Context { children: next } => children = next,
            }
        }
        Some(Found::Context(children))
    }

    /// Mutable children of the context at `segments`, if it is one
    pub fn context_mut(&mut self, segments: &[&str]) -> Option<&mut Children> {
        let mut children = &mut self.children;
        for segment in segments {
            match children.get_mut(*segment)? {
                Node::Context { children: next } => children = next,
                Node::File { .. } => return None,
            }
        }
        Some(children)
    }

    /// Children of the context at `segments`, creating missing contexts.
    ///
    /// Fails PathConflict on the first segment that is a file.
    pub fn ensure_context(&mut self, segments: &[&str]) -> CapabilityResult<&mut Children> {
        let mut children = &mut self.children;
        for (i, segment) in segments.iter().enumerate() {
            let node = children
                .entry((*segment).to_string())
                .or_insert_with(Node::empty_context);
            match node {
                Node::Context { children: next } => children = next,
                Node::File { .. } => {
                    return Err(CapabilityError::PathConflict(segments[..=i].join("/")))
                }
            }
        }
        Ok(children)
    }
}

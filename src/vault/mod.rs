//! The document store seam.
//!
//! The engine never owns the tree. It asks a [`Vault`] for value snapshots ([`Node`]) of folders
//! and documents, reads and writes document text through it, and forgets every node once an
//! operation completes. Parents are derived from paths rather than held as back-references.
//!
//! Two stores ship with the crate:
//!
//! - [`memory::MemoryVault`] - an in-process tree, used by tests and embedders that already hold
//!   their documents in memory
//! - [`fs::FsVault`] - a directory on disk

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt::{Display, Formatter};

use crate::{
    error::WaypointError,
    frontmatter,
    paths::{self, MARKDOWN_EXTENSION},
};

pub mod fs;
pub mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Folder,
    Document,
}

/// Snapshot of a vault entry: its root-relative path and whether it is a folder or a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn folder<S: Into<String>>(path: S) -> Node {
        Node {
            path: path.into(),
            kind: NodeKind::Folder,
        }
    }

    pub fn document<S: Into<String>>(path: S) -> Node {
        Node {
            path: path.into(),
            kind: NodeKind::Document,
        }
    }

    pub fn root() -> Node {
        Node::folder("")
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Folder && self.path.is_empty()
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }

    /// Full file or folder name, extension included.
    pub fn name(&self) -> &str {
        paths::file_name(&self.path)
    }

    /// Name without extension for documents; the plain name for folders.
    pub fn basename(&self) -> &str {
        match self.kind {
            NodeKind::Folder => self.name(),
            NodeKind::Document => paths::split_extension(self.name()).0,
        }
    }

    /// Name as it appears in a rendered listing: markdown documents drop their extension.
    pub fn display_name(&self) -> &str {
        if self.is_markdown() {
            self.basename()
        } else {
            self.name()
        }
    }

    pub fn extension(&self) -> Option<&str> {
        match self.kind {
            NodeKind::Folder => None,
            NodeKind::Document => paths::split_extension(self.name()).1,
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension() == Some(MARKDOWN_EXTENSION)
    }

    pub fn parent(&self) -> Option<Node> {
        paths::parent_path(&self.path).map(Node::folder)
    }

    /// True when this node sits directly inside the vault root.
    pub fn is_root_level(&self) -> bool {
        paths::parent_path(&self.path) == Some("")
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.kind {
            NodeKind::Folder => write!(f, "{}/", self.path),
            NodeKind::Document => write!(f, "{}", self.path),
        }
    }
}

/// Read-only tree queries plus whole-text document I/O.
///
/// Tree queries are synchronous snapshots; document reads and writes are the only suspension
/// points of the engine.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Display name of the vault, used for the root folder header.
    fn name(&self) -> &str;

    /// Look up the entry at `path`, if any.
    fn node(&self, path: &str) -> Option<Node>;

    /// Unordered children of `folder`.
    fn children(&self, folder: &Node) -> Vec<Node>;

    async fn read(&self, doc: &Node) -> Result<String, WaypointError>;

    /// Replace the full text of an existing document.
    async fn write(&self, doc: &Node, content: String) -> Result<(), WaypointError>;

    /// Front-matter value for `key` on `doc`.
    async fn metadata(&self, doc: &Node, key: &str) -> Option<Value> {
        match self.read(doc).await {
            Ok(content) => frontmatter::lookup(&content, key),
            Err(e) => {
                tracing::debug!("metadata lookup on {} failed: {}", doc.path, e);
                None
            }
        }
    }

    fn document(&self, path: &str) -> Option<Node> {
        self.node(path).filter(Node::is_document)
    }

    fn folder(&self, path: &str) -> Option<Node> {
        self.node(path).filter(Node::is_folder)
    }

    /// Every document in the vault, in no particular order.
    fn documents(&self) -> Vec<Node> {
        let mut stack = vec![Node::root()];
        let mut docs = Vec::new();
        while let Some(folder) = stack.pop() {
            for child in self.children(&folder) {
                if child.is_folder() {
                    stack.push(child);
                } else {
                    docs.push(child);
                }
            }
        }
        docs
    }
}

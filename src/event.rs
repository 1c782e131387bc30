use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::vault::{Node, NodeKind};

/// A structural or content change reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    Created(Node),
    /// The node no longer exists, so only its former path and kind are known.
    Deleted { path: String, kind: NodeKind },
    /// Node at its new location, previous path
    Renamed { node: Node, old_path: String },
    Modified(Node),
}

impl StoreEvent {
    /// Folder paths whose rendered listings may have gone stale because of this event.
    pub fn affected_folders(&self) -> Vec<String> {
        match self {
            StoreEvent::Created(node) | StoreEvent::Modified(node) => {
                node.parent().map(|p| vec![p.path]).unwrap_or_default()
            }
            StoreEvent::Deleted { path, .. } => crate::paths::parent_path(path)
                .map(|p| vec![p.to_string()])
                .unwrap_or_default(),
            StoreEvent::Renamed { node, old_path } => {
                let mut folders = Vec::with_capacity(2);
                if let Some(parent) = node.parent() {
                    folders.push(parent.path);
                }
                if let Some(old_parent) = crate::paths::parent_path(old_path) {
                    if !folders.iter().any(|f| f == old_parent) {
                        folders.push(old_parent.to_string());
                    }
                }
                folders
            }
        }
    }
}

impl StoreEvent {
    /// Paths of the documents this event names, the former path of a renamed document included.
    pub fn document_paths(&self) -> Vec<&str> {
        match self {
            StoreEvent::Created(node) | StoreEvent::Modified(node) if node.is_document() => {
                vec![node.path.as_str()]
            }
            StoreEvent::Deleted {
                path,
                kind: NodeKind::Document,
            } => vec![path.as_str()],
            StoreEvent::Renamed { node, old_path } if node.is_document() => {
                vec![node.path.as_str(), old_path.as_str()]
            }
            _ => Vec::new(),
        }
    }
}

impl Display for StoreEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            StoreEvent::Created(node) => write!(f, "Created({})", node.path),
            StoreEvent::Deleted { path, .. } => write!(f, "Deleted({path})"),
            StoreEvent::Renamed { node, old_path } => {
                write!(f, "Renamed({old_path} -> {})", node.path)
            }
            StoreEvent::Modified(node) => write!(f, "Modified({})", node.path),
        }
    }
}

/// Notifications emitted by the engine after it acts on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaypointEvent {
    /// A waypoint block was rewritten
    Updated(String),
    /// The rendered block already matched the document
    Unchanged(String),
    /// A marker directly under the vault root was adopted as the root waypoint
    RootRegistered(String),
    /// A marker outside of a folder note was replaced by an inline error
    InvalidMarker(String),
    /// A coalesced pass finished over the given folders
    PassComplete { folders: Vec<String> },
}

impl Display for WaypointEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            WaypointEvent::Updated(p) => write!(f, "Updated({p})"),
            WaypointEvent::Unchanged(p) => write!(f, "Unchanged({p})"),
            WaypointEvent::RootRegistered(p) => write!(f, "RootRegistered({p})"),
            WaypointEvent::InvalidMarker(p) => write!(f, "InvalidMarker({p})"),
            WaypointEvent::PassComplete { folders } => {
                write!(f, "PassComplete({} folders)", folders.len())
            }
        }
    }
}

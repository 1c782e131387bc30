use async_trait::async_trait;
use parking_lot::RwLock;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::{Node, NodeKind, Vault};
use crate::{error::WaypointError, paths};

#[derive(Debug, Clone)]
enum Entry {
    Folder,
    Document(String),
}

/// An in-memory vault.
///
/// Read and write counters make it convenient for asserting how much I/O an operation performed.
#[derive(Debug)]
pub struct MemoryVault {
    name: String,
    entries: RwLock<BTreeMap<String, Entry>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Default for MemoryVault {
    fn default() -> Self {
        MemoryVault::new("vault")
    }
}

impl MemoryVault {
    pub fn new<S: Into<String>>(name: S) -> MemoryVault {
        let mut entries = BTreeMap::new();
        entries.insert(String::new(), Entry::Folder);
        MemoryVault {
            name: name.into(),
            entries: RwLock::new(entries),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    fn ensure_ancestors(entries: &mut BTreeMap<String, Entry>, path: &str) {
        let mut current = paths::parent_path(path);
        while let Some(folder) = current {
            entries
                .entry(folder.to_string())
                .or_insert(Entry::Folder);
            current = paths::parent_path(folder);
        }
    }

    pub fn insert_folder(&self, path: &str) -> Node {
        let path = paths::normalize(path);
        let mut entries = self.entries.write();
        Self::ensure_ancestors(&mut entries, &path);
        entries.insert(path.clone(), Entry::Folder);
        Node::folder(path)
    }

    /// Create or overwrite a document, creating any missing parent folders.
    pub fn insert_document(&self, path: &str, content: &str) -> Node {
        let path = paths::normalize(path);
        let mut entries = self.entries.write();
        Self::ensure_ancestors(&mut entries, &path);
        entries.insert(path.clone(), Entry::Document(content.to_string()));
        Node::document(path)
    }

    /// Remove an entry and everything below it. Returns the kind of the removed entry.
    pub fn remove(&self, path: &str) -> Option<NodeKind> {
        let path = paths::normalize(path);
        let mut entries = self.entries.write();
        let kind = match entries.remove(&path)? {
            Entry::Folder => NodeKind::Folder,
            Entry::Document(_) => NodeKind::Document,
        };
        if kind == NodeKind::Folder {
            entries.retain(|key, _| !paths::is_within(key, &path) || key.is_empty());
        }
        Some(kind)
    }

    /// Move an entry (and, for folders, its subtree) to a new path.
    pub fn rename(&self, from: &str, to: &str) -> Option<Node> {
        let from = paths::normalize(from);
        let to = paths::normalize(to);
        let mut entries = self.entries.write();
        let moved: Vec<String> = entries
            .keys()
            .filter(|key| !key.is_empty() && paths::is_within(key, &from))
            .cloned()
            .collect();
        if moved.is_empty() {
            return None;
        }
        Self::ensure_ancestors(&mut entries, &to);
        let mut kind = NodeKind::Document;
        for old_key in moved {
            if let Some(entry) = entries.remove(&old_key) {
                if old_key == from && matches!(entry, Entry::Folder) {
                    kind = NodeKind::Folder;
                }
                let new_key = format!("{}{}", to, &old_key[from.len()..]);
                entries.insert(new_key, entry);
            }
        }
        Some(Node { path: to, kind })
    }

    pub fn content(&self, path: &str) -> Option<String> {
        match self.entries.read().get(&paths::normalize(path)) {
            Some(Entry::Document(text)) => Some(text.clone()),
            _ => None,
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Vault for MemoryVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn node(&self, path: &str) -> Option<Node> {
        let path = paths::normalize(path);
        self.entries.read().get(&path).map(|entry| match entry {
            Entry::Folder => Node::folder(path.clone()),
            Entry::Document(_) => Node::document(path.clone()),
        })
    }

    fn children(&self, folder: &Node) -> Vec<Node> {
        self.entries
            .read()
            .iter()
            .filter(|(key, _)| paths::parent_path(key) == Some(folder.path.as_str()))
            .map(|(key, entry)| match entry {
                Entry::Folder => Node::folder(key.clone()),
                Entry::Document(_) => Node::document(key.clone()),
            })
            .collect()
    }

    async fn read(&self, doc: &Node) -> Result<String, WaypointError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.content(&doc.path)
            .ok_or_else(|| WaypointError::NotFound(format!("document {}", doc.path)))
    }

    async fn write(&self, doc: &Node, content: String) -> Result<(), WaypointError> {
        let mut entries = self.entries.write();
        match entries.get_mut(&doc.path) {
            Some(Entry::Document(text)) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                *text = content;
                Ok(())
            }
            _ => Err(WaypointError::NotFound(format!("document {}", doc.path))),
        }
    }
}

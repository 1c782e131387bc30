use async_trait::async_trait;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{Node, Vault};
use crate::{
    error::WaypointError,
    paths::{self, os_path_to_string, string_to_os_path},
};

/// A vault backed by a directory on disk.
///
/// Entries whose name starts with `.` (`.git`, `.obsidian`, editor swap files) are invisible.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    name: String,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl FsVault {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<FsVault, WaypointError> {
        let root = root.as_ref().canonicalize()?;
        if !root.is_dir() {
            return Err(WaypointError::NotFound(format!(
                "vault root is not a directory: {root:?}"
            )));
        }
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(FsVault { root, name })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    pub fn abs_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(string_to_os_path(path))
        }
    }

    /// Vault path for a native path below the root. None for paths outside the vault or hidden
    /// entries.
    pub fn vault_path<P: AsRef<Path>>(&self, abs: P) -> Option<String> {
        let relative = abs.as_ref().strip_prefix(&self.root).ok()?;
        let path = os_path_to_string(relative);
        if path.split('/').any(is_hidden) {
            return None;
        }
        Some(path)
    }
}

#[async_trait]
impl Vault for FsVault {
    fn name(&self) -> &str {
        &self.name
    }

    fn node(&self, path: &str) -> Option<Node> {
        let path = paths::normalize(path);
        if path.split('/').any(is_hidden) {
            return None;
        }
        let metadata = std::fs::metadata(self.abs_path(&path)).ok()?;
        if metadata.is_dir() {
            Some(Node::folder(path))
        } else if metadata.is_file() {
            Some(Node::document(path))
        } else {
            None
        }
    }

    fn children(&self, folder: &Node) -> Vec<Node> {
        let dir = match std::fs::read_dir(self.abs_path(&folder.path)) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::debug!("Cannot list {:?}: {}", folder.path, e);
                return Vec::new();
            }
        };
        dir.filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if is_hidden(&name) {
                    return None;
                }
                let path = paths::join(&folder.path, &name);
                let file_type = entry.file_type().ok()?;
                if file_type.is_dir() {
                    Some(Node::folder(path))
                } else if file_type.is_file() {
                    Some(Node::document(path))
                } else {
                    None
                }
            })
            .collect()
    }

    async fn read(&self, doc: &Node) -> Result<String, WaypointError> {
        tracing::debug!("Reading {:?}", doc.path);
        Ok(tokio::fs::read_to_string(self.abs_path(&doc.path)).await?)
    }

    async fn write(&self, doc: &Node, content: String) -> Result<(), WaypointError> {
        tracing::debug!("Writing {:?}", doc.path);
        Ok(tokio::fs::write(self.abs_path(&doc.path), content).await?)
    }

    /// Every visible document, enumerated with a single directory walk.
    fn documents(&self) -> Vec<Node> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !is_hidden(&entry.file_name().to_string_lossy())
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping unreadable vault entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.vault_path(entry.path()))
            .map(Node::document)
            .collect()
    }
}

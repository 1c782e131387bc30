//! Folder-note resolution.
//!
//! A folder note is the document that stands in for a folder. Two conventions exist and a vault
//! uses exactly one of them:
//!
//! - [`FolderNoteType::InsideFolder`]: `Projects/Projects.md` represents `Projects/`
//! - [`FolderNoteType::OutsideFolder`]: `Projects.md` next to `Projects/` represents it
//!
//! [`folder_note_for`] and [`folder_for_note`] are inverses under a fixed convention.

use serde::{Deserialize, Serialize};

use crate::{
    paths::{self, MARKDOWN_EXTENSION},
    vault::{Node, Vault},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FolderNoteType {
    #[default]
    InsideFolder,
    OutsideFolder,
}

/// Where the note for `folder` would live. The vault root never has one.
pub fn folder_note_path(folder: &Node, convention: FolderNoteType) -> Option<String> {
    if !folder.is_folder() || folder.is_root() {
        return None;
    }
    Some(match convention {
        FolderNoteType::InsideFolder => paths::join(
            &folder.path,
            &format!("{}.{}", folder.name(), MARKDOWN_EXTENSION),
        ),
        FolderNoteType::OutsideFolder => format!("{}.{}", folder.path, MARKDOWN_EXTENSION),
    })
}

/// The existing folder note document for `folder`, if any.
pub fn folder_note_for<V: Vault + ?Sized>(
    vault: &V,
    folder: &Node,
    convention: FolderNoteType,
) -> Option<Node> {
    folder_note_path(folder, convention).and_then(|path| vault.document(&path))
}

/// The folder `doc` represents, if it is a folder note.
pub fn folder_for_note<V: Vault + ?Sized>(
    vault: &V,
    doc: &Node,
    convention: FolderNoteType,
) -> Option<Node> {
    if !doc.is_document() || !doc.is_markdown() {
        return None;
    }
    match convention {
        FolderNoteType::InsideFolder => doc
            .parent()
            .filter(|parent| !parent.is_root() && parent.name() == doc.basename()),
        FolderNoteType::OutsideFolder => vault.folder(paths::strip_extension(&doc.path)),
    }
}

pub fn is_folder_note<V: Vault + ?Sized>(vault: &V, doc: &Node, convention: FolderNoteType) -> bool {
    folder_for_note(vault, doc, convention).is_some()
}

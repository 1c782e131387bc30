//! Folder subtree to nested bullet list.
//!
//! [`render`] walks a folder and produces the list text that goes between the begin and end
//! sentinels of a waypoint block. The walk is read-only: it lists children, reads folder notes to
//! find nested waypoints, and (for [`SortType::Priority`](crate::sort::SortType::Priority))
//! reads front-matter. The same vault snapshot and policy always produce the same text.
//!
//! ```text
//! - **[[Projects]]**          <- header, only when the enclosing note name is shown
//! 	- **[[Alpha]]**         <- sub folder with a folder note
//! 		- [[Plan]]
//! 	- **Beta**              <- sub folder without one
//! 	- [[Ideas]]
//! ```

use futures::future::BoxFuture;
use std::collections::HashSet;

use crate::{
    config::RenderPolicy,
    error::WaypointError,
    folder_note::{folder_note_for, FolderNoteType},
    paths::{relative_link_target, MARKDOWN_EXTENSION},
    sort::{collect_priorities, Priorities},
    vault::{Node, Vault},
};

/// Link to `node` as written inside a document living in `root`.
pub fn link(policy: &RenderPolicy, root: &Node, node: &Node) -> String {
    if policy.use_wiki_links {
        format!("[[{}]]", node.display_name())
    } else {
        format!(
            "[{}]({})",
            node.display_name(),
            relative_link_target(&root.path, &node.path)
        )
    }
}

fn folder_title<V: Vault + ?Sized>(vault: &V, folder: &Node) -> String {
    if folder.is_root() {
        vault.name().to_string()
    } else {
        folder.name().to_string()
    }
}

/// The note standing in for `folder`; the vault root borrows the registered root note.
fn note_for<V: Vault + ?Sized>(vault: &V, policy: &RenderPolicy, folder: &Node) -> Option<Node> {
    if folder.is_root() {
        policy
            .root_note
            .as_deref()
            .and_then(|path| vault.document(path))
    } else {
        folder_note_for(vault, folder, policy.folder_note_type)
    }
}

/// Drop the documents that are already represented by a folder header.
fn without_folder_notes(
    folder: &Node,
    children: Vec<Node>,
    policy: &RenderPolicy,
) -> Vec<Node> {
    if folder.is_root() {
        return match policy.root_note.as_deref() {
            Some(note) => children
                .into_iter()
                .filter(|child| child.path != note)
                .collect(),
            None => children,
        };
    }
    match policy.folder_note_type {
        FolderNoteType::InsideFolder => {
            let own_note = format!("{}.{}", folder.name(), MARKDOWN_EXTENSION);
            children
                .into_iter()
                .filter(|child| child.is_folder() || child.name() != own_note)
                .collect()
        }
        FolderNoteType::OutsideFolder => {
            let folder_names: HashSet<String> = children
                .iter()
                .filter(|child| child.is_folder())
                .map(|child| child.name().to_string())
                .collect();
            children
                .into_iter()
                .filter(|child| {
                    child.is_folder()
                        || !child.is_markdown()
                        || !folder_names.contains(child.basename())
                })
                .collect()
        }
    }
}

/// Render `node` relative to `root` (the folder of the document that will hold the text).
///
/// Returns `None` when the node is not listed at all: ignored folders, and non-markdown files
/// unless they are shown. A top level call without an enclosing header lists the children at
/// `indent`; every other folder puts its children one level below its header.
pub fn render<'a, V: Vault + ?Sized>(
    vault: &'a V,
    policy: &'a RenderPolicy,
    root: &'a Node,
    node: &'a Node,
    indent: usize,
    top_level: bool,
) -> BoxFuture<'a, Result<Option<String>, WaypointError>> {
    Box::pin(async move {
        let prefix = policy.indent.repeat(indent);

        if node.is_document() {
            if !node.is_markdown() && !policy.show_non_markdown {
                return Ok(None);
            }
            return Ok(Some(format!("{prefix}- {}", link(policy, root, node))));
        }

        if policy.ignored_paths.contains(&node.path) {
            tracing::debug!("Skipping ignored folder {:?}", node.path);
            return Ok(None);
        }

        let folder_note = note_for(vault, policy, node);
        let header = if top_level && !policy.show_enclosing_note_name {
            None
        } else {
            let title = match &folder_note {
                Some(note) => link(policy, root, note),
                None => folder_title(vault, node),
            };
            Some(format!("{prefix}- **{title}**"))
        };

        if let Some(note) = folder_note.as_ref().filter(|_| !top_level) {
            if policy.stop_at_folder_notes {
                return Ok(header);
            }
            match vault.read(note).await {
                Ok(text) if policy.owns_waypoint(&text) => {
                    tracing::trace!("{:?} has its own waypoint, not descending", node.path);
                    return Ok(header);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        "Could not read folder note {}, listing its folder: {}",
                        note.path,
                        e
                    );
                }
            }
        }

        let mut children = vault.children(node);
        if !policy.show_folder_notes {
            children = without_folder_notes(node, children, policy);
        }
        let priorities = if policy.sort.needs_priorities() {
            collect_priorities(vault, &children, policy).await
        } else {
            Priorities::new()
        };
        policy.sort.sort(&mut children, &priorities);

        let child_indent = if top_level && !policy.show_enclosing_note_name {
            indent
        } else {
            indent + 1
        };
        let mut lines: Vec<String> = header.into_iter().collect();
        for child in children.iter() {
            if let Some(text) = render(vault, policy, root, child, child_indent, false).await? {
                lines.push(text);
            }
        }
        Ok(Some(lines.join("\n")))
    })
}

//! Finding the document whose waypoint lists a given node.

use crate::{
    config::RenderPolicy,
    error::WaypointError,
    folder_note::folder_note_for,
    vault::{Node, Vault},
};

async fn owns_waypoint<V: Vault + ?Sized>(
    vault: &V,
    policy: &RenderPolicy,
    doc: &Node,
) -> Result<bool, WaypointError> {
    let text = vault.read(doc).await?;
    Ok(policy.owns_waypoint(&text))
}

/// The registered root note, if it still exists and still carries a waypoint.
async fn root_waypoint<V: Vault + ?Sized>(
    vault: &V,
    policy: &RenderPolicy,
) -> Result<Option<Node>, WaypointError> {
    let Some(doc) = policy
        .root_note
        .as_deref()
        .and_then(|path| vault.document(path))
    else {
        return Ok(None);
    };
    if owns_waypoint(vault, policy, &doc).await? {
        Ok(Some(doc))
    } else {
        tracing::debug!("Root note {} no longer has a waypoint", doc.path);
        Ok(None)
    }
}

/// The document whose waypoint lists `node`.
///
/// A node directly inside the vault root is governed by the registered root note alone, once one
/// is registered. Anything else walks upward from `node` (or from its parent when `include_self`
/// is false) and returns the nearest folder note carrying a waypoint, skipping folders without a
/// note. The walk stops at the vault root; only a walk that starts at the root itself consults the
/// root note there. `Ok(None)` means there is nothing to update.
pub async fn find_governing_waypoint<V: Vault + ?Sized>(
    vault: &V,
    policy: &RenderPolicy,
    node: &Node,
    include_self: bool,
) -> Result<Option<Node>, WaypointError> {
    if node.is_root_level() && policy.root_note.is_some() {
        return root_waypoint(vault, policy).await;
    }
    let mut current = if include_self && node.is_folder() {
        Some(node.clone())
    } else {
        node.parent()
    };
    if current.as_ref().is_some_and(Node::is_root) {
        return root_waypoint(vault, policy).await;
    }
    while let Some(folder) = current.filter(|folder| !folder.is_root()) {
        if let Some(note) = folder_note_for(vault, &folder, policy.folder_note_type) {
            if owns_waypoint(vault, policy, &note).await? {
                return Ok(Some(note));
            }
        }
        current = folder.parent();
    }
    Ok(None)
}

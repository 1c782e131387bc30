//! Locating and splicing the waypoint block inside a document.
//!
//! A document owns a waypoint when one of its lines (ignoring surrounding whitespace) is either the
//! configured marker or [`BEGIN_WAYPOINT`]. The block spans from that line to the next
//! [`END_WAYPOINT`] line, or is just the start line when no end sentinel follows. Everything
//! outside of that line range is preserved byte for byte.

use crate::{
    config::{BEGIN_WAYPOINT, END_WAYPOINT},
    error::WaypointError,
};

/// Inline text written over a marker that sits in a document which cannot hold a waypoint.
pub const INVALID_PLACEMENT_NOTICE: &str = "%% Error: Cannot create a waypoint in a note that's not the folder note. Move the marker into the folder's note or into a note at the top of the vault. %%";

/// Inclusive line range of an existing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start: usize,
    pub end: usize,
}

/// Find the first marker or begin sentinel line and its closing end sentinel.
pub fn locate(content: &str, marker: &str) -> Option<BlockRange> {
    let lines: Vec<&str> = content.split('\n').collect();
    let start = lines.iter().position(|line| {
        let line = line.trim();
        line == marker || line == BEGIN_WAYPOINT
    })?;
    let end = lines[start..]
        .iter()
        .position(|line| line.trim() == END_WAYPOINT)
        .map(|offset| start + offset)
        .unwrap_or(start);
    Some(BlockRange { start, end })
}

/// Index of the first line that is exactly the bare marker.
pub fn find_marker_line(content: &str, marker: &str) -> Option<usize> {
    content.split('\n').position(|line| line.trim() == marker)
}

/// Sentinel-wrapped block text for a rendered listing.
pub fn compose(rendered: &str) -> String {
    if rendered.is_empty() {
        format!("{BEGIN_WAYPOINT}\n{END_WAYPOINT}")
    } else {
        format!("{BEGIN_WAYPOINT}\n{rendered}\n{END_WAYPOINT}")
    }
}

fn splice_lines(content: &str, range: BlockRange, replacement: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..range.start]);
    out.push(replacement);
    out.extend_from_slice(&lines[range.end + 1..]);
    out.join("\n")
}

/// Replace the waypoint block of `content` with `rendered`.
///
/// Returns `Ok(None)` when the existing block already matches, `Ok(Some(text))` with the new
/// document text otherwise. `doc_path` is only used for the error message.
pub fn upsert(
    content: &str,
    marker: &str,
    rendered: &str,
    doc_path: &str,
) -> Result<Option<String>, WaypointError> {
    let range = locate(content, marker)
        .ok_or_else(|| WaypointError::NoWaypoint(doc_path.to_string()))?;
    let block = compose(rendered);
    let existing = content
        .split('\n')
        .skip(range.start)
        .take(range.end - range.start + 1)
        .collect::<Vec<&str>>()
        .join("\n");
    if existing == block {
        return Ok(None);
    }
    Ok(Some(splice_lines(content, range, &block)))
}

/// Overwrite line `index` with `text`.
pub fn replace_line(content: &str, index: usize, text: &str) -> String {
    splice_lines(
        content,
        BlockRange {
            start: index,
            end: index,
        },
        text,
    )
}

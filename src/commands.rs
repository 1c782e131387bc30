use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Command interface between a host's command bindings and the [`WaypointEngine`].
///
/// [`WaypointEngine`]: crate::engine::WaypointEngine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Regenerate the waypoint block of the document at this path
    UpsertWaypoint(String),
    /// Refresh the nearest waypoint listing the node at `path`
    SyncAncestors { path: String, include_self: bool },
    /// Look for a bare marker line in the document at this path and act on it
    DetectMarker(String),
    /// Run a pass over the touched folders now, ignoring the debouncer
    Flush,
    /// Re-read settings from the engine's settings provider
    ReloadSettings,
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Op::UpsertWaypoint(p) => write!(f, "UpsertWaypoint({p})"),
            Op::SyncAncestors { path, include_self } => {
                write!(f, "SyncAncestors({path}, include_self: {include_self})")
            }
            Op::DetectMarker(p) => write!(f, "DetectMarker({p})"),
            Op::Flush => write!(f, "Flush"),
            Op::ReloadSettings => write!(f, "ReloadSettings"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OpResult {
    Ok,
    /// Whether the document was written
    Modified(bool),
    /// Path of the waypoint document that was refreshed, if any
    Governing(Option<String>),
    /// Number of folders processed by the pass
    Flushed(usize),
}

impl Display for OpResult {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            OpResult::Ok => write!(f, "Ok"),
            OpResult::Modified(m) => write!(f, "Modified({m})"),
            OpResult::Governing(Some(p)) => write!(f, "Governing({p})"),
            OpResult::Governing(None) => write!(f, "Governing(none)"),
            OpResult::Flushed(n) => write!(f, "Flushed({n} folders)"),
        }
    }
}

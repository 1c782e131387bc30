use std::{fmt, io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;

#[cfg(feature = "service")]
use notify::{Error as NotifyError, ErrorKind as NotifyErrorKind};

use crate::event::WaypointEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum WaypointError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("Waypoint marker placed outside of a folder note: {0}")]
    InvalidMarkerPlacement(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("No waypoint found in {0}")]
    NoWaypoint(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Not a folder note under the active convention: {0}")]
    NotFolderNote(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<StripPrefixError> for WaypointError {
    fn from(src: StripPrefixError) -> WaypointError {
        WaypointError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for WaypointError {
    fn from(src: toml::de::Error) -> WaypointError {
        WaypointError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for WaypointError {
    fn from(src: toml::ser::Error) -> WaypointError {
        WaypointError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<serde_yaml::Error> for WaypointError {
    fn from(src: serde_yaml::Error) -> WaypointError {
        WaypointError::Serialization(format!("YAML frontmatter error: {src}"))
    }
}

impl From<JsonError> for WaypointError {
    fn from(src: JsonError) -> WaypointError {
        WaypointError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for WaypointError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => WaypointError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => WaypointError::PermissionDenied,
            _ => WaypointError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for WaypointError {
    fn from(x: fmt::Error) -> Self {
        WaypointError::Custom(format!("{x}"))
    }
}

impl From<RegexError> for WaypointError {
    fn from(x: RegexError) -> Self {
        WaypointError::Serialization(format!("Regex parse failed: {x}"))
    }
}

impl From<TokioSendError<WaypointEvent>> for WaypointError {
    fn from(x: TokioSendError<WaypointEvent>) -> Self {
        WaypointError::Io(format!(
            "Channel update send Error, could not transmit waypoint event {:?}",
            x.0
        ))
    }
}

#[cfg(feature = "service")]
impl From<NotifyError> for WaypointError {
    fn from(notify_error: NotifyError) -> Self {
        match notify_error.kind {
            NotifyErrorKind::Generic(msg) => WaypointError::Custom(format!(
                "notify-debouncer: {}, paths: {:?}",
                msg, notify_error.paths
            )),
            NotifyErrorKind::Io(io_error) => WaypointError::Custom(format!(
                "notify-debouncer: io error {}, paths: {:?}",
                io_error.kind(),
                notify_error.paths
            )),
            NotifyErrorKind::PathNotFound => WaypointError::NotFound(format!(
                "notify-debouncer: path(s) not found: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::WatchNotFound => WaypointError::NotFound(format!(
                "notify-debouncer: watch not found, paths: {:?}",
                notify_error.paths
            )),
            NotifyErrorKind::InvalidConfig(_) => {
                WaypointError::Custom("notify-debouncer invalid config".to_string())
            }
            NotifyErrorKind::MaxFilesWatch => {
                WaypointError::Custom("notify-debouncer max file watch limit reached".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err: WaypointError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, WaypointError::NotFound(_)));
        let err: WaypointError = io::Error::new(io::ErrorKind::PermissionDenied, "no").into();
        assert_eq!(err, WaypointError::PermissionDenied);
    }
}

//! Root-relative path utilities.
//!
//! Vault paths are `/`-separated and relative to the vault root, which itself has the empty path
//! `""`. Nothing in here touches the filesystem; [`os_path_to_string`] and [`string_to_os_path`]
//! are the only bridges to native paths.

use std::{
    borrow::Cow,
    path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR},
};

pub const MARKDOWN_EXTENSION: &str = "md";

/// Utility function to replace separators and convert to unicode (via to_string_lossy) on os path.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    let res = os_path_ref
        .as_ref()
        .components()
        .filter_map(|c| match c {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => None,
            _ => Some(c.as_os_str().to_string_lossy()),
        })
        .collect::<Vec<Cow<'_, str>>>()
        .join("/");
    tracing::trace!(
        "os_path_to_string: turned {:?} into {}",
        os_path_ref.as_ref(),
        res
    );
    res
}

pub fn string_to_os_path(path_string: &str) -> PathBuf {
    PathBuf::from(path_string.replace('/', MAIN_SEPARATOR_STR))
}

/// Strip leading/trailing separators so user supplied paths compare equal to vault paths.
pub fn normalize(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Path of the folder containing `path`, or None for the vault root.
pub fn parent_path(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rfind('/').map(|idx| &path[..idx]).unwrap_or(""))
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    path.rfind('/').map(|idx| &path[idx + 1..]).unwrap_or(path)
}

/// Split a file name into (stem, extension). Leading dots do not count as extension markers.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

pub fn join(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Path with the final extension removed (`A/B.md` -> `A/B`).
pub fn strip_extension(path: &str) -> &str {
    let name = file_name(path);
    match split_extension(name) {
        (stem, Some(_)) => &path[..path.len() - name.len() + stem.len()],
        (_, None) => path,
    }
}

/// True when `path` sits at or below `folder`.
pub fn is_within(path: &str, folder: &str) -> bool {
    folder.is_empty()
        || path == folder
        || (path.starts_with(folder) && path.as_bytes().get(folder.len()) == Some(&b'/'))
}

/// Markdown link target for `path` as seen from `root`: `./` followed by the percent-encoded
/// remainder of the path below `root`.
///
/// Paths outside of `root` are encoded in full.
pub fn relative_link_target(root: &str, path: &str) -> String {
    let relative = if root.is_empty() {
        path
    } else {
        path.strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    };
    let encoded = relative
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<String>>()
        .join("/");
    format!("./{encoded}")
}

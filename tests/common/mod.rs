//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; later calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write `(path, content)` pairs below `root`, creating folders as needed.
#[allow(dead_code)]
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let file = root.join(path);
        if let Some(dir) = file.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(file, content).unwrap();
    }
}

/// Create a test vault directory with a root note and one folder note.
///
/// Returns the path to the vault directory (e.g. `<temp_dir>/notes/`):
///
/// ```text
/// Home.md              (marker)
/// Projects/
///   Projects.md        (marker)
///   a.md
///   Sub/
///     b.md
/// ```
#[allow(dead_code)]
pub fn create_test_vault(temp_dir: &TempDir) -> PathBuf {
    let vault_path = temp_dir.path().join("notes");
    std::fs::create_dir(&vault_path).unwrap();
    write_files(
        &vault_path,
        &[
            ("Home.md", "# Home\n%% Waypoint %%\n"),
            ("Projects/Projects.md", "%% Waypoint %%\n"),
            ("Projects/a.md", "# A\n"),
            ("Projects/Sub/b.md", "# B\n"),
        ],
    );
    vault_path
}

#[allow(dead_code)]
pub fn read(vault_path: &Path, path: &str) -> String {
    std::fs::read_to_string(vault_path.join(path)).unwrap()
}

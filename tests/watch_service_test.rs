//! Integration tests for WatchService (file watching and waypoint refresh)
//!
//! These drive the real filesystem watcher, so assertions poll with a generous timeout.

#![cfg(feature = "service")]

mod common;

use common::{create_test_vault, init_logging, read, write_files};
use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};
use tempfile::TempDir;
use waypoint_core::{
    config::WaypointSettings, engine::WaypointEngine, vault::FsVault, watch::WatchService,
};

fn wait_for(vault_path: &Path, path: &str, needle: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if read(vault_path, path).contains(needle) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    false
}

fn start(vault_path: &Path) -> WatchService {
    let settings = WaypointSettings {
        debounce_ms: 100,
        ..WaypointSettings::default()
    };
    let vault = Arc::new(FsVault::new(vault_path).unwrap());
    let engine = Arc::new(WaypointEngine::new(vault, settings));
    let service = WatchService::new(engine).unwrap();
    service.sync_now().unwrap();
    service
}

#[test]
fn test_new_file_is_listed() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let vault_path = create_test_vault(&temp_dir);
    let _service = start(&vault_path);

    write_files(&vault_path, &[("Projects/Sub/c.md", "")]);

    assert!(
        wait_for(&vault_path, "Projects/Projects.md", "\t- [[b]]\n\t- [[c]]\n"),
        "listing never picked up the new file: {}",
        read(&vault_path, "Projects/Projects.md")
    );
}

#[test]
fn test_removed_file_is_dropped() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let vault_path = create_test_vault(&temp_dir);
    let _service = start(&vault_path);
    assert!(read(&vault_path, "Projects/Projects.md").contains("\t- [[b]]"));

    std::fs::remove_file(vault_path.join("Projects/Sub/b.md")).unwrap();

    assert!(
        wait_for(
            &vault_path,
            "Projects/Projects.md",
            "- [[a]]\n- **Sub**\n%% End Waypoint %%"
        ),
        "listing still shows the removed file: {}",
        read(&vault_path, "Projects/Projects.md")
    );
}

#[test]
fn test_marker_typed_into_folder_note() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let vault_path = create_test_vault(&temp_dir);
    let service = start(&vault_path);

    write_files(&vault_path, &[("Projects/Sub/Sub.md", "# Sub\n%% Waypoint %%\n")]);

    assert!(
        wait_for(
            &vault_path,
            "Projects/Sub/Sub.md",
            "%% Begin Waypoint %%\n- [[b]]\n%% End Waypoint %%"
        ),
        "marker was never expanded: {}",
        read(&vault_path, "Projects/Sub/Sub.md")
    );
    assert!(wait_for(
        &vault_path,
        "Projects/Projects.md",
        "- **[[Sub]]**\n%% End Waypoint %%"
    ));
    assert!(service.engine().stats().writes >= 3);
}

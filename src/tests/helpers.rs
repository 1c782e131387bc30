//! Shared test utilities for engine scenarios

use crate::{
    config::WaypointSettings,
    engine::WaypointEngine,
    scheduler::ManualClock,
    vault::MemoryVault,
};
use std::sync::Arc;

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Build a vault from `(path, content)` pairs. Paths ending in `/` become empty folders.
pub fn vault_from(entries: &[(&str, &str)]) -> MemoryVault {
    let vault = MemoryVault::new("Vault");
    for (path, content) in entries {
        if path.ends_with('/') {
            vault.insert_folder(path);
        } else {
            vault.insert_document(path, content);
        }
    }
    vault
}

/// A small project vault:
///
/// ```text
/// Home.md
/// Projects/
///   Projects.md      (marker)
///   Ideas.md
///   Alpha/
///     Alpha.md
///     Plan.md
///   Beta/
///     Spec.md
/// ```
pub fn project_vault() -> MemoryVault {
    vault_from(&[
        ("Home.md", "# Home\n"),
        ("Projects/Projects.md", "# Projects\n\n%% Waypoint %%\n\nfooter\n"),
        ("Projects/Ideas.md", ""),
        ("Projects/Alpha/Alpha.md", "# Alpha\n"),
        ("Projects/Alpha/Plan.md", ""),
        ("Projects/Beta/Spec.md", ""),
    ])
}

/// Engine over `vault` with a manual clock for driving the debouncer.
pub fn engine_with_clock(
    vault: MemoryVault,
    settings: WaypointSettings,
) -> (WaypointEngine<MemoryVault>, Arc<ManualClock>) {
    init_logging();
    let clock = Arc::new(ManualClock::new());
    let engine = WaypointEngine::new(Arc::new(vault), settings).with_clock(clock.clone());
    (engine, clock)
}

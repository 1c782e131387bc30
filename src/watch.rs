//! # Watch Service - keeping waypoints current on disk
//!
//! [`WatchService`] connects a [`WaypointEngine`] over an [`FsVault`] to filesystem
//! notifications, so waypoints follow the vault as notes are created, moved, edited, and deleted
//! by any program.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use waypoint_core::{
//!     config::TomlSettingsProvider, engine::WaypointEngine, vault::FsVault, watch::WatchService,
//! };
//!
//! let vault = Arc::new(FsVault::new("/path/to/vault")?);
//! let provider = Arc::new(TomlSettingsProvider::new(vault.root_dir().join(".waypoint.toml")));
//! let engine = Arc::new(WaypointEngine::with_provider(vault, provider)?);
//!
//! let service = WatchService::new(engine)?;
//! service.sync_now()?;
//! // ... waypoints are kept up to date until `service` is dropped
//! # Ok::<(), waypoint_core::WaypointError>(())
//! ```
//!
//! ## Threading Model
//!
//! 1. **File Watcher Thread** (from `notify-debouncer-full`)
//!    - Groups raw notifications and stitches rename pairs together
//!    - Ignores dot files (`.git`, `.obsidian`, editor swap files)
//!    - Translates each notification into [`StoreEvent`]s and queues them
//! 2. **Consumer Task** (on the service's tokio runtime)
//!    - Feeds queued events to [`WaypointEngine::on_store_event`] one at a time
//!    - Sweeps folders left over from suppressed events with [`WaypointEngine::flush_idle`] once
//!      the vault has been quiet for the configured debounce period
//!
//! Writes made by the engine come back as modify notifications. They touch the folder of the
//! written note, the follow-up pass finds the waypoint already current, and nothing is written.
//!
//! ## Shutdown
//!
//! Dropping the service stops the watcher and aborts the consumer task.

use notify_debouncer_full::{
    new_debouncer,
    notify::{
        event::{CreateKind, ModifyKind, RemoveKind, RenameMode},
        Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    },
    DebounceEventResult, Debouncer, FileIdMap,
};
use std::{sync::Arc, time::Duration};
use tokio::{
    runtime::Runtime,
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
    task::JoinHandle,
    time::timeout,
};

use crate::{
    engine::WaypointEngine,
    error::WaypointError,
    event::StoreEvent,
    vault::{FsVault, Node, NodeKind, Vault},
};

/// How long the notification debouncer groups raw events before handing them over.
const NOTIFY_TIMEOUT: Duration = Duration::from_millis(200);

/// A file system watcher with debouncing for a vault
type VaultWatcher = Debouncer<RecommendedWatcher, FileIdMap>;

pub struct WatchService {
    engine: Arc<WaypointEngine<FsVault>>,
    runtime: Runtime,
    watcher: VaultWatcher,
    consumer: JoinHandle<()>,
}

impl WatchService {
    pub fn new(engine: Arc<WaypointEngine<FsVault>>) -> Result<WatchService, WaypointError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let (tx, rx) = unbounded_channel::<StoreEvent>();
        let vault = engine.vault().clone();
        let root = vault.root_dir().to_path_buf();

        let mut watcher = new_debouncer(
            NOTIFY_TIMEOUT,
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events.iter() {
                        for store_event in store_events(&vault, &event.event) {
                            tracing::debug!("[Debouncer] queueing {store_event}");
                            if tx.send(store_event).is_err() {
                                tracing::debug!("[Debouncer] consumer is gone, dropping event");
                                return;
                            }
                        }
                    }
                }
                Err(errors) => {
                    tracing::error!("Notify debouncer returned errors: {:?}", errors);
                }
            },
        )?;
        watcher.watcher().watch(&root, RecursiveMode::Recursive)?;
        tracing::info!("Watching {:?}", root);

        let idle = Duration::from_millis(engine.settings().debounce_ms.max(1));
        let consumer = runtime.spawn(consume(engine.clone(), rx, idle));

        Ok(WatchService {
            engine,
            runtime,
            watcher,
            consumer,
        })
    }

    pub fn engine(&self) -> &Arc<WaypointEngine<FsVault>> {
        &self.engine
    }

    /// Detect markers and refresh every waypoint in the vault, blocking until done.
    pub fn sync_now(&self) -> Result<usize, WaypointError> {
        self.runtime.block_on(self.engine.sync_all())
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        let root = self.engine.vault().root_dir().to_path_buf();
        if let Err(e) = self.watcher.watcher().unwatch(&root) {
            tracing::debug!("Unwatch({:?}) failed: {}", root, e);
        }
        self.consumer.abort();
    }
}

async fn consume(
    engine: Arc<WaypointEngine<FsVault>>,
    mut rx: UnboundedReceiver<StoreEvent>,
    idle: Duration,
) {
    tracing::info!("[WatchService] Starting event consumer");
    loop {
        match timeout(idle, rx.recv()).await {
            Ok(Some(event)) => {
                if let Err(e) = engine.on_store_event(event).await {
                    tracing::warn!("[WatchService] Error handling store event: {}", e);
                }
                engine.flush_idle().await;
            }
            Ok(None) => break,
            Err(_) => {
                let flushed = engine.flush_idle().await;
                if flushed > 0 {
                    tracing::debug!("[WatchService] Idle sweep processed {flushed} folders");
                }
            }
        }
    }
    tracing::info!("[WatchService] Event channel closed, consumer exiting");
}

fn lookup_or(vault: &FsVault, path: String, kind: NodeKind) -> Node {
    vault.node(&path).unwrap_or(Node { path, kind })
}

/// Translate one notification into store events. Paths outside the vault and hidden entries are
/// dropped.
pub(crate) fn store_events(vault: &FsVault, event: &NotifyEvent) -> Vec<StoreEvent> {
    let paths: Vec<String> = event
        .paths
        .iter()
        .filter_map(|p| vault.vault_path(p))
        .filter(|p| !p.is_empty())
        .collect();
    match event.kind {
        EventKind::Create(kind) => {
            let kind = match kind {
                CreateKind::Folder => NodeKind::Folder,
                _ => NodeKind::Document,
            };
            paths
                .into_iter()
                .map(|p| StoreEvent::Created(lookup_or(vault, p, kind)))
                .collect()
        }
        EventKind::Remove(kind) => {
            let kind = match kind {
                RemoveKind::Folder => NodeKind::Folder,
                _ => NodeKind::Document,
            };
            paths
                .into_iter()
                .map(|path| StoreEvent::Deleted { path, kind })
                .collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // Both halves must be inside the visible vault, otherwise treat it as one-sided
            match (
                event.paths.first().and_then(|p| vault.vault_path(p)),
                event.paths.get(1).and_then(|p| vault.vault_path(p)),
            ) {
                (Some(old_path), Some(new_path)) => vec![StoreEvent::Renamed {
                    node: lookup_or(vault, new_path, NodeKind::Document),
                    old_path,
                }],
                (Some(path), None) => vec![StoreEvent::Deleted {
                    path,
                    kind: NodeKind::Document,
                }],
                (None, Some(path)) => {
                    vec![StoreEvent::Created(lookup_or(vault, path, NodeKind::Document))]
                }
                (None, None) => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => paths
            .into_iter()
            .map(|path| StoreEvent::Deleted {
                path,
                kind: NodeKind::Document,
            })
            .collect(),
        EventKind::Modify(ModifyKind::Name(_)) => paths
            .into_iter()
            .filter_map(|p| vault.node(&p))
            .map(StoreEvent::Created)
            .collect(),
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => paths
            .into_iter()
            .filter_map(|p| vault.document(&p))
            .map(StoreEvent::Modified)
            .collect(),
        _ => Vec::new(),
    }
}

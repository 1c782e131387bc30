//! # Waypoint engine
//!
//! [`WaypointEngine`] owns no documents. It holds the current settings, the set of folders touched
//! since the last pass, and the debouncer, and drives the pure pieces of the crate against a
//! [`Vault`]:
//!
//! ```text
//! StoreEvent --> affected folders --> TouchedFolders --(Debouncer: Fire)--> flush()
//!                                                                            |
//!        for each folder: find_governing_waypoint --> upsert_waypoint <------+
//!                                                        |
//!                              render --> block::upsert --> Vault::write
//! ```
//!
//! Direct entry points ([`WaypointEngine::upsert_waypoint`],
//! [`WaypointEngine::sync_ancestors_of`], [`WaypointEngine::detect_marker`]) bypass the debouncer
//! and act immediately. [`WaypointEngine::execute`] exposes the same operations as
//! [`Op`] commands.
//!
//! ## Concurrency
//!
//! Every method takes `&self`. Locks guard only in-memory state and are never held across a vault
//! read or write, so concurrent passes over different documents interleave their I/O freely. Each
//! upsert is a read-modify-write of a single document; a concurrent external edit of the same
//! document between the read and the write is lost (last write wins).

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    block::{self, INVALID_PLACEMENT_NOTICE},
    commands::{Op, OpResult},
    config::{RenderPolicy, SettingsProvider, WaypointSettings},
    error::WaypointError,
    event::{StoreEvent, WaypointEvent},
    folder_note::{folder_for_note, FolderNoteType},
    locator::find_governing_waypoint,
    paths,
    render::render,
    scheduler::{Clock, Debouncer, Decision, SystemClock, TouchedFolders},
    vault::{Node, Vault},
};

/// Running counters, mostly useful to tests and the CLI summary.
#[derive(Debug, Default)]
pub struct SyncStats {
    passes: AtomicUsize,
    renders: AtomicUsize,
    writes: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    /// Coalesced passes that had at least one touched folder
    pub passes: usize,
    /// Waypoint renders, one per upsert
    pub renders: usize,
    /// Document writes, including inline error notices
    pub writes: usize,
}

impl SyncStats {
    pub fn snapshot(&self) -> SyncCounts {
        SyncCounts {
            passes: self.passes.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

impl Display for SyncCounts {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} passes, {} renders, {} writes",
            self.passes, self.renders, self.writes
        )
    }
}

/// What [`WaypointEngine::detect_marker`] did with a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerOutcome {
    /// No bare marker line in the document
    Absent,
    /// The document is a folder note; its waypoint was generated
    FolderNote,
    /// The document sits directly in the vault root and is now the root note
    RootNote,
    /// The marker was replaced by an inline error notice
    Rejected,
}

pub struct WaypointEngine<V: Vault> {
    vault: Arc<V>,
    settings: RwLock<WaypointSettings>,
    provider: Option<Arc<dyn SettingsProvider>>,
    touched: TouchedFolders,
    headers: TouchedFolders,
    debouncer: Mutex<Debouncer>,
    clock: Arc<dyn Clock>,
    events: Option<UnboundedSender<WaypointEvent>>,
    stats: SyncStats,
}

impl<V: Vault> WaypointEngine<V> {
    pub fn new(vault: Arc<V>, settings: WaypointSettings) -> WaypointEngine<V> {
        let settings = settings.validated();
        let quiet = Duration::from_millis(settings.debounce_ms);
        WaypointEngine {
            vault,
            settings: RwLock::new(settings),
            provider: None,
            touched: TouchedFolders::default(),
            headers: TouchedFolders::default(),
            debouncer: Mutex::new(Debouncer::new(quiet)),
            clock: Arc::new(SystemClock),
            events: None,
            stats: SyncStats::default(),
        }
    }

    /// Load settings from `provider` and persist later changes (the root pointer) through it.
    pub fn with_provider(
        vault: Arc<V>,
        provider: Arc<dyn SettingsProvider>,
    ) -> Result<WaypointEngine<V>, WaypointError> {
        let settings = provider.load()?;
        let mut engine = WaypointEngine::new(vault, settings);
        engine.provider = Some(provider);
        Ok(engine)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> WaypointEngine<V> {
        self.clock = clock;
        self
    }

    pub fn with_events(mut self, tx: UnboundedSender<WaypointEvent>) -> WaypointEngine<V> {
        self.events = Some(tx);
        self
    }

    pub fn vault(&self) -> &Arc<V> {
        &self.vault
    }

    pub fn settings(&self) -> WaypointSettings {
        self.settings.read().clone()
    }

    pub fn policy(&self) -> RenderPolicy {
        self.settings.read().policy()
    }

    pub fn stats(&self) -> SyncCounts {
        self.stats.snapshot()
    }

    /// Number of folders waiting for the next pass.
    pub fn pending(&self) -> usize {
        self.touched.len() + self.headers.len()
    }

    /// Replace the settings. Persisted when a provider is attached.
    pub fn set_settings(&self, settings: WaypointSettings) -> Result<(), WaypointError> {
        let settings = settings.validated();
        if let Some(provider) = &self.provider {
            provider.save(&settings)?;
        }
        self.apply(settings);
        Ok(())
    }

    /// Re-read settings from the attached provider.
    pub fn reload_settings(&self) -> Result<(), WaypointError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            WaypointError::Config("no settings provider attached to this engine".to_string())
        })?;
        let settings = provider.load()?;
        self.apply(settings.validated());
        Ok(())
    }

    fn apply(&self, settings: WaypointSettings) {
        self.debouncer
            .lock()
            .set_quiet(Duration::from_millis(settings.debounce_ms));
        *self.settings.write() = settings;
    }

    fn emit(&self, event: WaypointEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.send(event).map_err(WaypointError::from) {
                tracing::debug!("{e}");
            }
        }
    }

    /// The folder whose listing belongs in `doc`.
    fn governing_folder(&self, doc: &Node, policy: &RenderPolicy) -> Result<Node, WaypointError> {
        let sibling_folder = match policy.folder_note_type {
            FolderNoteType::OutsideFolder => {
                self.vault.folder(paths::strip_extension(&doc.path))
            }
            FolderNoteType::InsideFolder => None,
        };
        if let Some(folder) = sibling_folder {
            return Ok(folder);
        }
        if doc.is_root_level() {
            return Ok(Node::root());
        }
        match policy.folder_note_type {
            FolderNoteType::InsideFolder => doc
                .parent()
                .ok_or_else(|| WaypointError::NotFolderNote(doc.path.clone())),
            FolderNoteType::OutsideFolder => Err(WaypointError::NotFolderNote(doc.path.clone())),
        }
    }

    /// Render `folder` as it would appear in a waypoint of a document living in `links_from`.
    pub async fn render_folder(
        &self,
        folder: &Node,
        links_from: &Node,
    ) -> Result<String, WaypointError> {
        let policy = self.policy();
        Ok(render(&*self.vault, &policy, links_from, folder, 0, true)
            .await?
            .unwrap_or_default())
    }

    /// Regenerate the waypoint block of `doc`. Returns whether the document was written.
    #[tracing::instrument(skip_all, fields(doc = %doc.path))]
    pub async fn upsert_waypoint(&self, doc: &Node) -> Result<bool, WaypointError> {
        let mut policy = self.policy();
        let folder = self.governing_folder(doc, &policy)?;
        if folder.is_root() {
            // The root note heads its own listing
            policy.root_note = Some(doc.path.clone());
            policy.show_enclosing_note_name = true;
        }
        let links_from = doc.parent().unwrap_or_else(Node::root);

        self.stats.renders.fetch_add(1, Ordering::Relaxed);
        let rendered = render(&*self.vault, &policy, &links_from, &folder, 0, true)
            .await?
            .unwrap_or_default();

        let content = self.vault.read(doc).await?;
        match block::upsert(&content, &policy.marker, &rendered, &doc.path)? {
            None => {
                tracing::debug!("Waypoint in {} is up to date", doc.path);
                self.emit(WaypointEvent::Unchanged(doc.path.clone()));
                Ok(false)
            }
            Some(updated) => {
                self.vault.write(doc, updated).await?;
                self.stats.writes.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Updated waypoint in {}", doc.path);
                self.emit(WaypointEvent::Updated(doc.path.clone()));
                Ok(true)
            }
        }
    }

    /// Refresh the nearest waypoint listing `node`, if there is one. Returns the document that
    /// governs `node`.
    pub async fn sync_ancestors_of(
        &self,
        node: &Node,
        include_self: bool,
    ) -> Result<Option<Node>, WaypointError> {
        let policy = self.policy();
        let Some(doc) = find_governing_waypoint(&*self.vault, &policy, node, include_self).await?
        else {
            tracing::trace!("No waypoint governs {}", node.path);
            return Ok(None);
        };
        self.upsert_waypoint(&doc).await?;
        Ok(Some(doc))
    }

    fn register_root(&self, doc: &Node) -> Result<(), WaypointError> {
        let snapshot = {
            let mut settings = self.settings.write();
            settings.root = Some(doc.path.clone());
            settings.clone()
        };
        if let Some(provider) = &self.provider {
            provider.save(&snapshot)?;
        }
        tracing::info!("Registered {} as the vault root waypoint", doc.path);
        self.emit(WaypointEvent::RootRegistered(doc.path.clone()));
        Ok(())
    }

    /// Act on a bare marker line in `doc`.
    ///
    /// Folder notes get their waypoint and the waypoint above them is refreshed, a note directly
    /// inside the vault root becomes the root note, and any other document has its marker
    /// replaced by an inline error notice.
    pub async fn detect_marker(&self, doc: &Node) -> Result<MarkerOutcome, WaypointError> {
        if !doc.is_markdown() {
            return Ok(MarkerOutcome::Absent);
        }
        let policy = self.policy();
        let content = self.vault.read(doc).await?;
        let Some(line) = block::find_marker_line(&content, &policy.marker) else {
            return Ok(MarkerOutcome::Absent);
        };

        if folder_for_note(&*self.vault, doc, policy.folder_note_type).is_some() {
            self.upsert_waypoint(doc).await?;
            if let Some(parent) = doc.parent() {
                // A sibling note's own folder is one level below `parent`, so the parent itself
                // is still a candidate; an inside note would find itself.
                let include_self = policy.folder_note_type == FolderNoteType::OutsideFolder;
                self.sync_ancestors_of(&parent, include_self).await?;
            }
            return Ok(MarkerOutcome::FolderNote);
        }

        if doc.is_root_level() {
            self.register_root(doc)?;
            self.upsert_waypoint(doc).await?;
            return Ok(MarkerOutcome::RootNote);
        }

        tracing::warn!(
            "{}",
            WaypointError::InvalidMarkerPlacement(doc.path.clone())
        );
        let updated = block::replace_line(&content, line, INVALID_PLACEMENT_NOTICE);
        self.vault.write(doc, updated).await?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        self.emit(WaypointEvent::InvalidMarker(doc.path.clone()));
        Ok(MarkerOutcome::Rejected)
    }

    /// Folders whose note `event` names. The note decides how the folder's header reads and
    /// whether its children are shown, so the listing that contains the folder goes stale too.
    fn header_folders(&self, event: &StoreEvent) -> Vec<String> {
        let folder_note_type = self.settings.read().folder_note_type;
        event
            .document_paths()
            .into_iter()
            .filter_map(|path| {
                folder_for_note(&*self.vault, &Node::document(path), folder_note_type)
            })
            .map(|folder| folder.path)
            .collect()
    }

    /// Record a store change and run a pass if the debouncer allows it.
    pub async fn on_store_event(&self, event: StoreEvent) -> Result<(), WaypointError> {
        tracing::debug!("Store event: {event}");
        self.touched.touch(event.affected_folders());
        self.headers.touch(self.header_folders(&event));
        let decision = self.debouncer.lock().on_event(self.clock.now());
        if decision == Decision::Fire {
            self.flush().await;
        }
        if let StoreEvent::Modified(node) = &event {
            if node.is_document() {
                self.detect_marker(node).await?;
            }
        }
        Ok(())
    }

    /// Run a pass over every touched folder now. Returns the number of folders processed.
    ///
    /// Touched folders are looked up starting with their own note; folders whose note changed
    /// are looked up from the folder above, where their header is listed. A failure on one
    /// folder is logged and does not stop the others.
    #[tracing::instrument(skip_all)]
    pub async fn flush(&self) -> usize {
        let touched = self.touched.drain();
        let headers = self.headers.drain();
        if touched.is_empty() && headers.is_empty() {
            return 0;
        }
        self.stats.passes.fetch_add(1, Ordering::Relaxed);
        let policy = self.policy();
        let lookups = touched
            .iter()
            .map(|path| (path, true))
            .chain(headers.iter().map(|path| (path, false)));
        let mut synced = BTreeSet::new();
        for (path, include_self) in lookups {
            let folder = Node::folder(path.clone());
            let doc =
                match find_governing_waypoint(&*self.vault, &policy, &folder, include_self).await {
                    Ok(Some(doc)) => doc,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!("Could not locate the waypoint for {:?}: {}", path, e);
                        continue;
                    }
                };
            if !synced.insert(doc.path.clone()) {
                continue;
            }
            if let Err(e) = self.upsert_waypoint(&doc).await {
                tracing::warn!("Could not update waypoint in {}: {}", doc.path, e);
            }
        }
        let folders: Vec<String> = touched
            .into_iter()
            .chain(headers)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        tracing::debug!(
            "Pass over {} folders updated {} waypoints",
            folders.len(),
            synced.len()
        );
        let count = folders.len();
        self.emit(WaypointEvent::PassComplete { folders });
        count
    }

    /// Flush folders left over from suppressed events once the burst has gone quiet.
    pub async fn flush_idle(&self) -> usize {
        if self.touched.is_empty() && self.headers.is_empty() {
            return 0;
        }
        let quiet = {
            let mut debouncer = self.debouncer.lock();
            let now = self.clock.now();
            debouncer.settle(now);
            debouncer.is_quiet_at(now)
        };
        if quiet {
            self.flush().await
        } else {
            0
        }
    }

    /// Every document in the vault, sorted by path.
    pub fn documents(&self) -> Vec<Node> {
        let mut docs = self.vault.documents();
        docs.sort();
        docs
    }

    /// Detect markers in every markdown document, then refresh every existing waypoint.
    /// Returns the number of documents written.
    pub async fn sync_all(&self) -> Result<usize, WaypointError> {
        let before = self.stats().writes;
        let docs: Vec<Node> = self
            .documents()
            .into_iter()
            .filter(Node::is_markdown)
            .collect();
        for doc in docs.iter() {
            if let Err(e) = self.detect_marker(doc).await {
                tracing::warn!("Marker detection failed for {}: {}", doc.path, e);
            }
        }
        let policy = self.policy();
        for doc in docs.iter() {
            let is_root_note = policy.root_note.as_deref() == Some(doc.path.as_str());
            let is_folder_note =
                folder_for_note(&*self.vault, doc, policy.folder_note_type).is_some();
            if !is_root_note && !is_folder_note {
                continue;
            }
            let content = self.vault.read(doc).await?;
            if block::locate(&content, &policy.marker).is_some() {
                if let Err(e) = self.upsert_waypoint(doc).await {
                    tracing::warn!("Could not update waypoint in {}: {}", doc.path, e);
                }
            }
        }
        Ok(self.stats().writes - before)
    }

    /// Dispatch a command.
    pub async fn execute(&self, op: Op) -> Result<OpResult, WaypointError> {
        tracing::debug!("Executing {op}");
        match op {
            Op::UpsertWaypoint(path) => {
                let doc = self.document(&path)?;
                Ok(OpResult::Modified(self.upsert_waypoint(&doc).await?))
            }
            Op::SyncAncestors { path, include_self } => {
                let path = paths::normalize(&path);
                let node = self
                    .vault
                    .node(&path)
                    .ok_or_else(|| WaypointError::NotFound(path.clone()))?;
                let governing = self.sync_ancestors_of(&node, include_self).await?;
                Ok(OpResult::Governing(governing.map(|doc| doc.path)))
            }
            Op::DetectMarker(path) => {
                let doc = self.document(&path)?;
                let outcome = self.detect_marker(&doc).await?;
                Ok(OpResult::Modified(outcome != MarkerOutcome::Absent))
            }
            Op::Flush => Ok(OpResult::Flushed(self.flush().await)),
            Op::ReloadSettings => {
                self.reload_settings()?;
                Ok(OpResult::Ok)
            }
        }
    }

    fn document(&self, path: &str) -> Result<Node, WaypointError> {
        let path = paths::normalize(path);
        self.vault
            .document(&path)
            .ok_or(WaypointError::NotFound(path))
    }
}

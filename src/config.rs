use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs::{create_dir_all, read_to_string, write},
    path::PathBuf,
};

use crate::{error::WaypointError, folder_note::FolderNoteType, paths, sort::SortType};

pub const DEFAULT_FLAG: &str = "%% Waypoint %%";
pub const BEGIN_WAYPOINT: &str = "%% Begin Waypoint %%";
pub const END_WAYPOINT: &str = "%% End Waypoint %%";
pub const DEFAULT_PRIORITY_KEY: &str = "waypointPriority";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

static FLAG_PATTERN: Lazy<Result<Regex, WaypointError>> =
    Lazy::new(|| Regex::new(r"^%%\s*[^%\s][^\n]*%%$").map_err(WaypointError::from));

/// The persisted configuration blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointSettings {
    pub waypoint_flag: String,
    pub stop_scan_at_folder_notes: bool,
    pub show_folder_notes: bool,
    pub show_non_markdown_files: bool,
    pub show_enclosing_note: bool,
    pub folder_note_type: FolderNoteType,
    pub use_wiki_links: bool,
    pub use_spaces: bool,
    pub num_spaces: usize,
    pub sort_type: SortType,
    pub ignore_paths: Vec<String>,
    pub priority_key: String,
    /// Document holding the vault-root waypoint, once one has been discovered.
    pub root: Option<String>,
    pub debounce_ms: u64,
}

impl Default for WaypointSettings {
    fn default() -> Self {
        WaypointSettings {
            waypoint_flag: DEFAULT_FLAG.to_string(),
            stop_scan_at_folder_notes: false,
            show_folder_notes: false,
            show_non_markdown_files: false,
            show_enclosing_note: false,
            folder_note_type: FolderNoteType::InsideFolder,
            use_wiki_links: true,
            use_spaces: false,
            num_spaces: 2,
            sort_type: SortType::Natural,
            ignore_paths: Vec::new(),
            priority_key: DEFAULT_PRIORITY_KEY.to_string(),
            root: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// True when `flag` is usable as a waypoint marker line.
pub fn is_valid_flag(flag: &str) -> bool {
    match FLAG_PATTERN.as_ref() {
        Ok(pattern) => pattern.is_match(flag) && flag != BEGIN_WAYPOINT && flag != END_WAYPOINT,
        Err(e) => {
            tracing::error!("Flag pattern unavailable: {e}");
            false
        }
    }
}

impl WaypointSettings {
    /// Repair user-edited values instead of rejecting the whole blob.
    pub fn validated(mut self) -> Self {
        let flag = self.waypoint_flag.trim().to_string();
        if is_valid_flag(&flag) {
            self.waypoint_flag = flag;
        } else {
            tracing::warn!(
                "Waypoint flag {:?} must be a single line surrounded by double-percent signs \
                 (e.g. {:?}); falling back to the default",
                self.waypoint_flag,
                DEFAULT_FLAG
            );
            self.waypoint_flag = DEFAULT_FLAG.to_string();
        }
        self.ignore_paths = self
            .ignore_paths
            .iter()
            .map(|p| paths::normalize(p))
            .filter(|p| !p.is_empty())
            .collect();
        if self.priority_key.trim().is_empty() {
            self.priority_key = DEFAULT_PRIORITY_KEY.to_string();
        }
        self.root = self.root.map(|r| paths::normalize(&r)).filter(|r| !r.is_empty());
        self
    }

    pub fn indent_unit(&self) -> IndentUnit {
        if self.use_spaces {
            IndentUnit::Spaces(self.num_spaces)
        } else {
            IndentUnit::Tab
        }
    }

    /// Immutable snapshot handed to a single synchronization run.
    pub fn policy(&self) -> RenderPolicy {
        RenderPolicy {
            marker: self.waypoint_flag.clone(),
            folder_note_type: self.folder_note_type,
            stop_at_folder_notes: self.stop_scan_at_folder_notes,
            show_folder_notes: self.show_folder_notes,
            show_non_markdown: self.show_non_markdown_files,
            use_wiki_links: self.use_wiki_links,
            show_enclosing_note_name: self.show_enclosing_note,
            indent: self.indent_unit(),
            sort: self.sort_type,
            ignored_paths: self.ignore_paths.iter().cloned().collect(),
            priority_key: self.priority_key.clone(),
            root_note: self.root.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentUnit {
    Tab,
    Spaces(usize),
}

impl IndentUnit {
    pub fn repeat(&self, level: usize) -> String {
        match self {
            IndentUnit::Tab => "\t".repeat(level),
            IndentUnit::Spaces(n) => " ".repeat(n * level),
        }
    }
}

/// Rendering options captured once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPolicy {
    pub marker: String,
    pub folder_note_type: FolderNoteType,
    pub stop_at_folder_notes: bool,
    pub show_folder_notes: bool,
    pub show_non_markdown: bool,
    pub use_wiki_links: bool,
    pub show_enclosing_note_name: bool,
    pub indent: IndentUnit,
    pub sort: SortType,
    pub ignored_paths: BTreeSet<String>,
    pub priority_key: String,
    /// Document standing in as the folder note of the vault root
    pub root_note: Option<String>,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        WaypointSettings::default().policy()
    }
}

impl RenderPolicy {
    /// True when `text` carries a marker or a previously generated block.
    pub fn owns_waypoint(&self, text: &str) -> bool {
        text.contains(BEGIN_WAYPOINT) || text.contains(&self.marker)
    }
}

/// Where settings live between runs.
pub trait SettingsProvider: Send + Sync {
    fn load(&self) -> Result<WaypointSettings, WaypointError>;
    fn save(&self, settings: &WaypointSettings) -> Result<(), WaypointError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlSettingsProvider {
    path: PathBuf,
}

impl TomlSettingsProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlSettingsProvider { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsProvider for TomlSettingsProvider {
    fn load(&self) -> Result<WaypointSettings, WaypointError> {
        tracing::debug!("Attempting to read settings from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Settings file not found, using defaults.");
            return Ok(WaypointSettings::default());
        }
        let content = read_to_string(&self.path)?;
        let settings: WaypointSettings = toml::from_str(&content)?;
        Ok(settings.validated())
    }

    fn save(&self, settings: &WaypointSettings) -> Result<(), WaypointError> {
        tracing::debug!("Attempting to write settings to: {:?}", &self.path);
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            create_dir_all(dir)?;
        }
        let toml_string = toml::to_string(settings)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

/// Non-persistent provider for embedders that manage settings themselves.
#[derive(Debug, Default)]
pub struct InMemorySettings(RwLock<WaypointSettings>);

impl InMemorySettings {
    pub fn new(settings: WaypointSettings) -> Self {
        InMemorySettings(RwLock::new(settings))
    }
}

impl SettingsProvider for InMemorySettings {
    fn load(&self) -> Result<WaypointSettings, WaypointError> {
        Ok(self.0.read().clone().validated())
    }

    fn save(&self, settings: &WaypointSettings) -> Result<(), WaypointError> {
        *self.0.write() = settings.clone();
        Ok(())
    }
}

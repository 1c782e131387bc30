//! # waypoint-core
//!
//! Keeps auto-generated tables of contents ("waypoints") current inside the notes of a vault of
//! folders and markdown documents.
//!
//! ## Overview
//!
//! A user puts a marker line (by default `%% Waypoint %%`) in a folder note. The engine replaces
//! it with a generated block listing the folder's documents and subfolders:
//!
//! ```markdown
//! # Projects
//!
//! %% Begin Waypoint %%
//! - **[[Alpha]]**
//! 	- [[Plan]]
//! - **Beta**
//! 	- [[Spec]]
//! - [[Ideas]]
//! %% End Waypoint %%
//! ```
//!
//! From then on every create, delete, rename, and edit in the vault refreshes the block, touching
//! only the waypoints whose listings could have changed. Text outside of the block is never
//! modified.
//!
//! ### Key Features
//!
//! - **Deterministic rendering**: the same tree and settings always produce the same block, so a
//!   refresh without structural changes writes nothing
//! - **Nested waypoints**: a subfolder whose note has its own waypoint is listed by its header
//!   only
//! - **Two folder-note conventions**: `Projects/Projects.md` or `Projects.md` next to `Projects/`
//! - **Coalesced updates**: a burst of store events triggers one pass, not one per event
//! - **Pluggable stores**: anything implementing [`vault::Vault`]; an in-memory store and a
//!   directory store ship with the crate
//!
//! ## Architecture
//!
//! - **[`render`]**: folder subtree to bullet list
//! - **[`block`]**: locate and splice the waypoint block inside a document
//! - **[`folder_note`]**: folder-note conventions
//! - **[`locator`]**: nearest waypoint above a changed node
//! - **[`scheduler`]**: debouncer state machine and the touched-folder set
//! - **[`sort`]**: sibling ordering, including front-matter priorities
//! - **[`engine`]**: ties the above together behind [`engine::WaypointEngine`]
//! - **[`config`]**: persisted settings and the per-run [`config::RenderPolicy`]
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use waypoint_core::{config::WaypointSettings, engine::WaypointEngine, vault::{MemoryVault, Node}};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), waypoint_core::WaypointError> {
//!     let vault = MemoryVault::new("Notes");
//!     vault.insert_document("Projects/Projects.md", "# Projects\n%% Waypoint %%\n");
//!     vault.insert_document("Projects/Plan.md", "");
//!
//!     let engine = WaypointEngine::new(Arc::new(vault), WaypointSettings::default());
//!     engine.detect_marker(&Node::document("Projects/Projects.md")).await?;
//!
//!     let text = engine.vault().content("Projects/Projects.md").unwrap_or_default();
//!     assert!(text.contains("- [[Plan]]"));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **default**: engine, in-memory and directory vaults, TOML settings
//! - **service**: file watching ([`watch::WatchService`], `notify`)
//! - **bin**: the `waypoint` command line tool

pub mod block;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod folder_note;
pub mod frontmatter;
pub mod locator;
pub mod paths;
pub mod render;
pub mod scheduler;
pub mod sort;
#[cfg(test)]
mod tests;
pub mod vault;
#[cfg(feature = "service")]
pub mod watch;

pub use error::*;

//! waypoint CLI tool
//!
//! Command-line interface for generating and maintaining waypoints in a markdown vault.
//!
//! ## Commands
//!
//! - `render <vault> [folder]`: Print the listing a waypoint for `folder` would contain
//! - `sync <vault>`: Act on every marker and refresh every existing waypoint once
//! - `watch <vault>`: Sync, then keep waypoints current until Ctrl-C
//!
//! Settings are read from `<vault>/.waypoint.toml` unless `--config` points elsewhere. The vault
//! root waypoint, once discovered, is written back to the same file.

use clap::{Args, Parser, Subcommand};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
    time::Duration,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use waypoint_core::{
    config::TomlSettingsProvider,
    engine::WaypointEngine,
    event::WaypointEvent,
    paths,
    vault::{FsVault, Vault},
    watch::WatchService,
    WaypointError,
};

const DEFAULT_CONFIG_FILE: &str = ".waypoint.toml";

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(author, version, about = "Keep folder-note tables of contents in sync with a markdown vault", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct VaultArgs {
    /// Path to the vault directory
    path: PathBuf,

    /// Settings file (default: <vault>/.waypoint.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print waypoint events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rendered listing of a folder without writing anything
    Render {
        #[command(flatten)]
        vault: VaultArgs,

        /// Vault-relative folder to render (default: the vault root)
        folder: Option<String>,
    },

    /// Detect markers and refresh every waypoint once
    Sync {
        #[command(flatten)]
        vault: VaultArgs,
    },

    /// Sync, then watch the vault and keep waypoints current
    Watch {
        #[command(flatten)]
        vault: VaultArgs,
    },
}

fn open_engine(
    args: &VaultArgs,
    tx: Option<UnboundedSender<WaypointEvent>>,
) -> Result<WaypointEngine<FsVault>, WaypointError> {
    let vault = Arc::new(FsVault::new(&args.path)?);
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| vault.root_dir().join(DEFAULT_CONFIG_FILE));
    tracing::debug!("Using settings file {:?}", config_path);
    let provider = Arc::new(TomlSettingsProvider::new(config_path));
    let engine = WaypointEngine::with_provider(vault, provider)?;
    Ok(match tx {
        Some(tx) => engine.with_events(tx),
        None => engine,
    })
}

fn print_event(event: &WaypointEvent, json: bool) {
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => eprintln!("Could not serialize {event}: {e}"),
        }
    } else {
        println!("{event}");
    }
}

/// Print events on a separate thread until every sender is gone.
fn spawn_printer(mut rx: UnboundedReceiver<WaypointEvent>, json: bool) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while let Some(event) = rx.blocking_recv() {
            print_event(&event, json);
        }
    })
}

fn runtime() -> Result<tokio::runtime::Runtime, WaypointError> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { vault, folder } => {
            let engine = open_engine(&vault, None)?;
            let path = folder.map(|f| paths::normalize(&f)).unwrap_or_default();
            let folder = engine
                .vault()
                .folder(&path)
                .ok_or_else(|| WaypointError::NotFound(format!("folder {path:?}")))?;
            let text = runtime()?.block_on(engine.render_folder(&folder, &folder))?;
            println!("{text}");
            Ok(())
        }

        Commands::Sync { vault } => {
            let (tx, rx) = unbounded_channel();
            let printer = spawn_printer(rx, vault.json);
            let engine = open_engine(&vault, Some(tx))?;
            let written = runtime()?.block_on(engine.sync_all())?;
            let stats = engine.stats();
            drop(engine);
            if printer.join().is_err() {
                eprintln!("Event printer panicked");
            }
            if !vault.json {
                println!("Synced {}: {written} documents written ({stats})", vault.path.display());
            }
            Ok(())
        }

        Commands::Watch { vault } => {
            let (tx, rx) = unbounded_channel();
            let printer = spawn_printer(rx, vault.json);
            let engine = Arc::new(open_engine(&vault, Some(tx))?);
            let service = WatchService::new(engine)?;

            let written = service.sync_now()?;
            tracing::info!("Initial sync wrote {written} documents");

            println!(
                "Watching {} for changes. Press Ctrl-C to stop.",
                vault.path.display()
            );

            // Set up Ctrl-C handler
            let running = Arc::new(AtomicBool::new(true));
            let r = running.clone();
            ctrlc::set_handler(move || {
                println!("\nShutting down...");
                r.store(false, Ordering::SeqCst);
            })?;

            // Keep running until Ctrl-C
            while running.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(100));
            }

            let stats = service.engine().stats();
            drop(service);
            // The printer exits once the engine, and with it the last sender, is gone
            drop(printer);
            println!("Shutdown complete ({stats})");
            Ok(())
        }
    }
}

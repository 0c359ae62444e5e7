mod app;
mod builder;
mod cache;
mod components;
mod config;
mod error;
mod event;
mod explorer;
mod fs;
mod handler;
mod outline;
mod root;
mod theme;
mod tree;
mod tui;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::App;
use crate::cache::CacheStore;
use crate::config::{AppConfig, CacheConfig, ExplorerConfig, WatcherConfig};
use crate::error::AppError;
use crate::event::{Event, EventHandler};
use crate::explorer::{Explorer, Settings};
use crate::fs::watcher::FsWatcher;
use crate::tui::{install_panic_hook, Tui};

/// Project tree sidebar with folding, incremental builds and a tree cache.
#[derive(Parser, Debug)]
#[command(name = "pe", version, about)]
struct Cli {
    /// File or directory to start from (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to a config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tree builder to use
    #[arg(short, long, value_parser = ["external", "synchronous", "incremental"])]
    builder: Option<String>,

    /// Show one line per directory instead of joining single-child chains
    #[arg(long)]
    no_inline: bool,

    /// Neither read nor write the tree cache
    #[arg(long)]
    no_cache: bool,

    /// Disable filesystem watcher (auto-refresh)
    #[arg(long)]
    no_watcher: bool,

    /// Print the outline and exit
    #[arg(long, conflicts_with = "list")]
    print: bool,

    /// Print every file path relative to the root and exit
    #[arg(long)]
    list: bool,

    /// Delete every cached tree and exit
    #[arg(long, conflicts_with_all = ["print", "list"])]
    clear_cache: bool,
}

impl Cli {
    fn is_headless(&self) -> bool {
        self.print || self.list || self.clear_cache
    }

    /// Config layer holding only what the flags set.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            explorer: ExplorerConfig {
                builder: self.builder.clone(),
                inline_folders: self.no_inline.then_some(false),
                ..ExplorerConfig::default()
            },
            cache: CacheConfig {
                enabled: self.no_cache.then_some(false),
                ..CacheConfig::default()
            },
            watcher: WatcherConfig {
                enabled: self.no_watcher.then_some(false),
                ..WatcherConfig::default()
            },
            ..AppConfig::default()
        }
    }
}

/// `PE_LOG=<file>` appends debug logs to that file. Headless runs otherwise
/// log to stderr filtered by `RUST_LOG`; the TUI stays silent.
fn init_logging(headless: bool) {
    if let Ok(log_file) = std::env::var("PE_LOG") {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => {
                env_logger::Builder::new()
                    .target(env_logger::Target::Pipe(Box::new(file)))
                    .filter_level(log::LevelFilter::Debug)
                    .init();
                log::info!("pe starting up");
                return;
            }
            Err(e) => eprintln!("cannot open log file {}: {}", log_file, e),
        }
    }
    if headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.is_headless());

    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));
    let mut cache = match config.cache_directory() {
        Some(dir) => CacheStore::new(dir),
        None => CacheStore::in_memory(),
    };

    if cli.clear_cache {
        cache.clear()?;
        if let Some(dir) = cache.directory() {
            println!("cleared {}", dir.display());
        }
        return Ok(());
    }

    let origin = cli
        .path
        .canonicalize()
        .map_err(|_| AppError::InvalidPath(format!("{} does not exist", cli.path.display())))?;
    let root = root::from_config(&config).resolve(&origin);
    log::info!("project root {}", root.display());
    let settings = Settings::from_config(&config);

    if cli.is_headless() {
        let mut events = EventHandler::headless();
        let mut explorer = Explorer::new(&root, settings, events.sender());
        explorer.open(&root, &mut cache)?;
        settle(&mut explorer, &mut events, &mut cache).await?;

        let mut out = io::stdout().lock();
        if cli.list {
            for path in explorer.tree().flatten() {
                writeln!(out, "{}", path)?;
            }
        } else {
            write!(out, "{}", explorer.text())?;
        }
        return Ok(());
    }

    install_panic_hook();
    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let event_tx = events.sender();

    let mut explorer = Explorer::new(&root, settings, event_tx.clone());
    let opened = explorer.open(&root, &mut cache);
    let mut app = App::new(explorer, cache, &config);
    if let Err(e) = opened {
        app.set_status_message(format!("Build failed: {}", e));
    }
    if config.reveal_current() && origin.is_file() {
        app.reveal_when_ready(origin);
    }

    let _watcher = if app.watcher_active {
        let filter = app.explorer.settings().filter.clone();
        let debounce = Duration::from_millis(config.debounce_ms());
        match FsWatcher::new(&root, debounce, filter, event_tx) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                app.watcher_active = false;
                app.set_status_message(format!("Watcher unavailable: {}", e));
                None
            }
        }
    } else {
        None
    };

    let result = run(&mut tui, &mut app, &mut events).await;
    tui.restore()?;
    result
}

/// Feed builder events back until no build is running.
async fn settle(
    explorer: &mut Explorer,
    events: &mut EventHandler,
    cache: &mut CacheStore,
) -> error::Result<()> {
    while explorer.is_building() {
        let event = events.next().await?;
        explorer.handle_event(event, cache)?;
    }
    match explorer.last_failure() {
        Some(failure) => Err(AppError::BuildFailed(failure.to_string())),
        None => Ok(()),
    }
}

async fn run(tui: &mut Tui, app: &mut App, events: &mut EventHandler) -> error::Result<()> {
    loop {
        tui.terminal_mut().draw(|frame| {
            ui::render(app, frame);
        })?;

        match events.next().await? {
            Event::Key(key) => handler::handle_key_event(app, key),
            Event::Tick | Event::Resize(_, _) => {}
            Event::FsChange(paths) => app.handle_fs_change(paths),
            event => app.handle_build_event(event),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

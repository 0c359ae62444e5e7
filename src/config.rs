//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--builder`, `--no-cache`, `--no-watcher`, ...)
//! 2. `--config <file>`
//! 3. `$PE_CONFIG` environment variable (path to config file)
//! 4. Project-local `.pe.toml` in the current working directory
//! 5. Global `~/.config/project-explorer/config.toml`
//! 6. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::builder::external::DEFAULT_LIST_COMMAND;
use crate::builder::BuilderKind;

// ── Section configs ──────────────────────────────────────────────────────────

/// Tree construction and rendering settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Builder: "external", "synchronous" or "incremental".
    pub builder: Option<String>,
    /// Merge single-directory chains into one line.
    pub inline_folders: Option<bool>,
    /// Exclusion regex tested against bare names; empty disables filtering.
    pub exclude: Option<String>,
    /// Idle gap between incremental builder steps.
    pub idle_delay_ms: Option<u64>,
    /// Shell command used by the external builder.
    pub list_command: Option<String>,
    /// Root resolution: "directory" or "markers".
    pub root_strategy: Option<String>,
    /// File names marking a project root for the "markers" strategy.
    pub root_markers: Option<Vec<String>>,
}

/// Tree cache settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: Option<bool>,
    /// Rebuild in the background after showing a cached tree.
    pub auto_refresh: Option<bool>,
    pub directory: Option<PathBuf>,
}

/// Sidebar placement.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SidebarConfig {
    /// "left" or "right".
    pub side: Option<String>,
    /// Width in columns.
    pub width: Option<u16>,
}

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Confirm before delete operations.
    pub confirm_delete: Option<bool>,
    /// Reveal the starting file when a file path is given on the command line.
    pub reveal_current: Option<bool>,
}

/// Filesystem watcher settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Enable filesystem watcher for auto-refresh.
    pub enabled: Option<bool>,
    /// Debounce interval in milliseconds.
    pub debounce_ms: Option<u64>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark" or "light".
    pub scheme: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub explorer: ExplorerConfig,
    pub cache: CacheConfig,
    pub sidebar: SidebarConfig,
    pub general: GeneralConfig,
    pub watcher: WatcherConfig,
    pub theme: ThemeConfig,
}

/// Which edge of the terminal the sidebar sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// How the root directory is derived from the starting location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStrategy {
    Directory,
    Markers,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Names hidden from the tree unless overridden.
pub const DEFAULT_EXCLUDE: &str = r"^#|^\.git$|~$|^node_modules$";
/// Default idle gap between incremental steps in milliseconds.
pub const DEFAULT_IDLE_DELAY_MS: u64 = 10;
/// Default sidebar width in columns.
pub const DEFAULT_SIDEBAR_WIDTH: u16 = 40;
/// Default debounce interval in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
/// Default project root markers.
pub const DEFAULT_ROOT_MARKERS: &[&str] = &[".git", ".hg", "Cargo.toml", "package.json", ".projectile"];

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("PE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".pe.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("project-explorer").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a logged warning).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            explorer: ExplorerConfig {
                builder: other.explorer.builder.clone().or(self.explorer.builder),
                inline_folders: other
                    .explorer
                    .inline_folders
                    .or(self.explorer.inline_folders),
                exclude: other.explorer.exclude.clone().or(self.explorer.exclude),
                idle_delay_ms: other.explorer.idle_delay_ms.or(self.explorer.idle_delay_ms),
                list_command: other
                    .explorer
                    .list_command
                    .clone()
                    .or(self.explorer.list_command),
                root_strategy: other
                    .explorer
                    .root_strategy
                    .clone()
                    .or(self.explorer.root_strategy),
                root_markers: other
                    .explorer
                    .root_markers
                    .clone()
                    .or(self.explorer.root_markers),
            },
            cache: CacheConfig {
                enabled: other.cache.enabled.or(self.cache.enabled),
                auto_refresh: other.cache.auto_refresh.or(self.cache.auto_refresh),
                directory: other.cache.directory.clone().or(self.cache.directory),
            },
            sidebar: SidebarConfig {
                side: other.sidebar.side.clone().or(self.sidebar.side),
                width: other.sidebar.width.or(self.sidebar.width),
            },
            general: GeneralConfig {
                confirm_delete: other.general.confirm_delete.or(self.general.confirm_delete),
                reveal_current: other.general.reveal_current.or(self.general.reveal_current),
            },
            watcher: WatcherConfig {
                enabled: other.watcher.enabled.or(self.watcher.enabled),
                debounce_ms: other.watcher.debounce_ms.or(self.watcher.debounce_ms),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Lowest priority first so higher layers overwrite.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                log::debug!("loaded config from {}", path.display());
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            match load_file(cli_path) {
                Some(file_cfg) => config = config.merge(&file_cfg),
                None => log::warn!("config file {} not loaded", cli_path.display()),
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    /// Selected builder; unknown names fall back to incremental.
    pub fn builder(&self) -> BuilderKind {
        match self.explorer.builder.as_deref() {
            None => BuilderKind::Incremental,
            Some(name) => BuilderKind::parse(name).unwrap_or_else(|| {
                log::warn!("unknown builder {:?}, using incremental", name);
                BuilderKind::Incremental
            }),
        }
    }

    pub fn inline_folders(&self) -> bool {
        self.explorer.inline_folders.unwrap_or(true)
    }

    /// Exclusion pattern; `None` when filtering is disabled.
    pub fn exclude(&self) -> Option<&str> {
        match self.explorer.exclude.as_deref() {
            Some("") => None,
            Some(pattern) => Some(pattern),
            None => Some(DEFAULT_EXCLUDE),
        }
    }

    pub fn idle_delay_ms(&self) -> u64 {
        self.explorer.idle_delay_ms.unwrap_or(DEFAULT_IDLE_DELAY_MS)
    }

    pub fn list_command(&self) -> &str {
        self.explorer
            .list_command
            .as_deref()
            .unwrap_or(DEFAULT_LIST_COMMAND)
    }

    pub fn root_strategy(&self) -> RootStrategy {
        match self.explorer.root_strategy.as_deref() {
            None | Some("directory") => RootStrategy::Directory,
            Some("markers") => RootStrategy::Markers,
            Some(other) => {
                log::warn!("unknown root strategy {:?}, using directory", other);
                RootStrategy::Directory
            }
        }
    }

    pub fn root_markers(&self) -> Vec<String> {
        self.explorer.root_markers.clone().unwrap_or_else(|| {
            DEFAULT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect()
        })
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.enabled.unwrap_or(true)
    }

    pub fn auto_refresh(&self) -> bool {
        self.cache.auto_refresh.unwrap_or(true)
    }

    /// Cache directory, `<cache_dir>/project-explorer` unless configured.
    pub fn cache_directory(&self) -> Option<PathBuf> {
        self.cache
            .directory
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("project-explorer")))
    }

    pub fn sidebar_side(&self) -> Side {
        match self.sidebar.side.as_deref() {
            None | Some("left") => Side::Left,
            Some("right") => Side::Right,
            Some(other) => {
                log::warn!("unknown sidebar side {:?}, using left", other);
                Side::Left
            }
        }
    }

    pub fn sidebar_width(&self) -> u16 {
        match self.sidebar.width {
            Some(0) | None => DEFAULT_SIDEBAR_WIDTH,
            Some(width) => width,
        }
    }

    /// Whether to confirm before delete.
    pub fn confirm_delete(&self) -> bool {
        self.general.confirm_delete.unwrap_or(true)
    }

    pub fn reveal_current(&self) -> bool {
        self.general.reveal_current.unwrap_or(true)
    }

    /// Whether the watcher is enabled.
    pub fn watcher_enabled(&self) -> bool {
        self.watcher.enabled.unwrap_or(true)
    }

    /// Watcher debounce interval in milliseconds.
    pub fn debounce_ms(&self) -> u64 {
        self.watcher.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)
    }

    /// Theme scheme: "dark" or "light".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

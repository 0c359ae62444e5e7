//! Deciding which directory an explorer session is rooted at.

use std::path::{Path, PathBuf};

use crate::config::{AppConfig, RootStrategy};

/// Maps an originating location (a file or directory) to an absolute root
/// directory. Implementations must be deterministic for a given origin.
pub trait RootResolver {
    fn resolve(&self, origin: &Path) -> PathBuf;
}

impl<F> RootResolver for F
where
    F: Fn(&Path) -> PathBuf,
{
    fn resolve(&self, origin: &Path) -> PathBuf {
        self(origin)
    }
}

/// The origin itself when it is a directory, else its parent.
fn containing_dir(origin: &Path) -> PathBuf {
    if origin.is_dir() {
        return origin.to_path_buf();
    }
    origin
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| origin.to_path_buf())
}

/// Root at the origin's own directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryRoot;

impl RootResolver for DirectoryRoot {
    fn resolve(&self, origin: &Path) -> PathBuf {
        containing_dir(origin)
    }
}

/// Root at the nearest ancestor holding one of the marker entries, falling
/// back to the origin's directory.
#[derive(Debug, Clone)]
pub struct MarkerRoot {
    markers: Vec<String>,
}

impl MarkerRoot {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }
}

impl RootResolver for MarkerRoot {
    fn resolve(&self, origin: &Path) -> PathBuf {
        let start = containing_dir(origin);
        start
            .ancestors()
            .find(|dir| self.markers.iter().any(|marker| dir.join(marker).exists()))
            .map(Path::to_path_buf)
            .unwrap_or(start)
    }
}

/// Resolver selected by the `[explorer] root_strategy` option.
pub fn from_config(config: &AppConfig) -> Box<dyn RootResolver> {
    match config.root_strategy() {
        RootStrategy::Directory => Box::new(DirectoryRoot),
        RootStrategy::Markers => Box::new(MarkerRoot::new(config.root_markers())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("crates").join("core").join("src")).unwrap();
        fs::write(dir.path().join("Cargo.toml"), "").unwrap();
        fs::write(
            dir.path().join("crates").join("core").join("src").join("lib.rs"),
            "",
        )
        .unwrap();
        dir
    }

    #[test]
    fn directory_root_of_directory_and_file() {
        let dir = project();
        let src = dir.path().join("crates").join("core").join("src");
        assert_eq!(DirectoryRoot.resolve(&src), src);
        assert_eq!(DirectoryRoot.resolve(&src.join("lib.rs")), src);
    }

    #[test]
    fn marker_root_finds_nearest_marked_ancestor() {
        let dir = project();
        let resolver = MarkerRoot::new(vec!["Cargo.toml".into()]);
        let file = dir.path().join("crates").join("core").join("src").join("lib.rs");
        assert_eq!(resolver.resolve(&file), dir.path());
    }

    #[test]
    fn marker_root_prefers_the_closest_marker() {
        let dir = project();
        let inner = dir.path().join("crates").join("core");
        fs::write(inner.join("Cargo.toml"), "").unwrap();
        let resolver = MarkerRoot::new(vec!["Cargo.toml".into()]);
        assert_eq!(resolver.resolve(&inner.join("src")), inner);
    }

    #[test]
    fn marker_root_falls_back_to_directory() {
        let dir = project();
        let resolver = MarkerRoot::new(vec!["no-such-marker".into()]);
        let src = dir.path().join("crates").join("core").join("src");
        assert_eq!(resolver.resolve(&src), src);
    }

    #[test]
    fn closures_are_resolvers() {
        let fixed = |_: &Path| PathBuf::from("/fixed");
        assert_eq!(fixed.resolve(Path::new("/anything")), PathBuf::from("/fixed"));
    }

    #[test]
    fn config_selects_strategy() {
        let dir = project();
        let cfg: AppConfig =
            toml::from_str("[explorer]\nroot_strategy = \"markers\"\n").unwrap();
        let src = dir.path().join("crates").join("core").join("src");
        assert_eq!(from_config(&cfg).resolve(&src), dir.path());
        assert_eq!(from_config(&AppConfig::default()).resolve(&src), src);
    }
}

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::builder::Interesting;
use crate::event::Event;

/// Changes per debounce window above which the batch collapses into a
/// refresh of the whole root.
pub const FLOOD_THRESHOLD: usize = 100;

/// Recursive watcher on the explorer root, feeding `Event::FsChange`.
pub struct FsWatcher {
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl FsWatcher {
    /// Watch `root` recursively. Paths with an excluded component are
    /// dropped before they reach the event loop.
    pub fn new(
        root: &Path,
        debounce: Duration,
        filter: Interesting,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let root_path = root.to_path_buf();

        let mut debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let paths = events
                        .into_iter()
                        .filter(|e| e.kind == DebouncedEventKind::Any)
                        .map(|e| e.path);
                    if let Some(batch) = collect_changes(&root_path, paths, &filter, FLOOD_THRESHOLD)
                    {
                        let _ = event_tx.send(Event::FsChange(batch));
                    }
                }
                Err(e) => log::warn!("watcher error: {}", e),
            },
        )?;

        debouncer
            .watcher()
            .watch(root, notify::RecursiveMode::Recursive)?;
        log::info!("watching {}", root.display());

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

/// Filter one debounced batch. Returns `None` when nothing relevant changed
/// and `[root]` when the batch is too large to reconcile path by path.
pub fn collect_changes(
    root: &Path,
    paths: impl IntoIterator<Item = PathBuf>,
    filter: &Interesting,
    threshold: usize,
) -> Option<Vec<PathBuf>> {
    let mut batch: Vec<PathBuf> = paths
        .into_iter()
        .filter(|p| p != root && p.starts_with(root) && !is_excluded(root, p, filter))
        .collect();
    batch.sort();
    batch.dedup();

    if batch.is_empty() {
        None
    } else if batch.len() > threshold {
        Some(vec![root.to_path_buf()])
    } else {
        Some(batch)
    }
}

/// Whether any component of `path` below `root` is rejected by `filter`.
pub fn is_excluded(root: &Path, path: &Path, filter: &Interesting) -> bool {
    path.strip_prefix(root)
        .map(|relative| {
            relative.components().any(|component| match component {
                Component::Normal(name) => !filter.allows(&name.to_string_lossy()),
                _ => false,
            })
        })
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> Interesting {
        Interesting::new(Some(r"^\.git$|^node_modules$")).unwrap()
    }

    #[test]
    fn excluded_components_are_dropped() {
        let root = Path::new("/project");
        assert!(is_excluded(root, Path::new("/project/.git/HEAD"), &filter()));
        assert!(is_excluded(
            root,
            Path::new("/project/web/node_modules/x/index.js"),
            &filter()
        ));
        assert!(!is_excluded(root, Path::new("/project/src/main.rs"), &filter()));
    }

    #[test]
    fn paths_outside_root_are_excluded() {
        assert!(is_excluded(
            Path::new("/project"),
            Path::new("/elsewhere/file"),
            &filter()
        ));
    }

    #[test]
    fn partial_name_does_not_match() {
        assert!(!is_excluded(
            Path::new("/project"),
            Path::new("/project/node_modules2/file.txt"),
            &filter()
        ));
    }

    #[test]
    fn batch_is_filtered_and_deduplicated() {
        let root = Path::new("/project");
        let batch = collect_changes(
            root,
            vec![
                PathBuf::from("/project/b.txt"),
                PathBuf::from("/project/.git/index"),
                PathBuf::from("/project/a.txt"),
                PathBuf::from("/project/b.txt"),
                PathBuf::from("/project"),
            ],
            &filter(),
            FLOOD_THRESHOLD,
        )
        .unwrap();
        assert_eq!(
            batch,
            vec![PathBuf::from("/project/a.txt"), PathBuf::from("/project/b.txt")]
        );
    }

    #[test]
    fn irrelevant_batch_is_dropped() {
        let root = Path::new("/project");
        let batch = collect_changes(
            root,
            vec![PathBuf::from("/project/.git/HEAD")],
            &filter(),
            FLOOD_THRESHOLD,
        );
        assert!(batch.is_none());
    }

    #[test]
    fn flood_collapses_to_root() {
        let root = Path::new("/tmp");
        let paths = (0..200).map(|i| PathBuf::from(format!("/tmp/file_{}", i)));
        let batch = collect_changes(root, paths, &Interesting::default(), 100).unwrap();
        assert_eq!(batch, vec![PathBuf::from("/tmp")]);
    }

    #[test]
    fn below_threshold_keeps_individual_paths() {
        let root = Path::new("/tmp");
        let paths = (0..50).map(|i| PathBuf::from(format!("/tmp/file_{}", i)));
        let batch = collect_changes(root, paths, &Interesting::default(), 100).unwrap();
        assert_eq!(batch.len(), 50);
    }
}

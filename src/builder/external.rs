//! Build the tree from a single external listing process.
//!
//! The command runs through `sh -c` with the root as working directory and
//! prints one record per line, directories with a trailing `/`. Output is
//! accumulated while the process runs and parsed once it exits cleanly.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{root_name, Interesting};
use crate::error::{AppError, Result};
use crate::event::Event;
use crate::tree::Tree;

/// Default listing: every descendant as `./path`, dotfiles pruned,
/// directories suffixed with `/`. Sticks to POSIX `find` primaries so it
/// works with both GNU and BSD `find`.
pub const DEFAULT_LIST_COMMAND: &str =
    r#"find . ! -name . -name '.*' -prune -o -type d -exec sh -c 'printf "%s/\n" "$@"' sh {} + -o -print"#;

/// Handle to a running listing process.
///
/// Dropping or cancelling the handle aborts the task, which kills the child.
pub struct ExternalBuild {
    task: JoinHandle<()>,
}

impl ExternalBuild {
    /// Start the listing; the outcome is delivered as `BuildFinished` or
    /// `BuildFailed` tagged with `generation`.
    pub fn spawn(
        root: PathBuf,
        command: String,
        filter: Interesting,
        generation: u64,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let event = match run(&root, &command, &filter).await {
                Ok(tree) => Event::BuildFinished { generation, tree },
                Err(e) => {
                    log::warn!("external build of {} abandoned: {}", root.display(), e);
                    Event::BuildFailed {
                        generation,
                        message: e.to_string(),
                    }
                }
            };
            let _ = event_tx.send(event);
        });
        Self { task }
    }

    /// Force-terminate the listing.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for ExternalBuild {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `command` in `root` and parse its output into a tree.
pub async fn run(root: &Path, command: &str, filter: &Interesting) -> Result<Tree> {
    log::info!("running `{}` in {}", command, root.display());
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::BuildFailed("listing command has no stdout".into()))?;

    let mut output = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stdout.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        output.extend_from_slice(&chunk[..n]);
    }

    let status = child.wait().await?;
    if !status.success() {
        return Err(AppError::BuildFailed(status.to_string()));
    }

    let text = String::from_utf8_lossy(&output);
    Ok(parse_listing(&root_name(root), &text, filter))
}

/// Turn newline-delimited records into a sorted tree. Records with any
/// segment rejected by `filter` are dropped.
pub fn parse_listing(root_name: &str, output: &str, filter: &Interesting) -> Tree {
    let records = output.lines().filter(|record| {
        record
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .all(|segment| filter.allows(segment))
    });
    let mut tree = Tree::from_paths(root_name, records);
    tree.sort();
    tree
}

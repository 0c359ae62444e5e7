use std::path::Path;
use std::time::Instant;

use super::{list_dir, root_name, Interesting};
use crate::error::Result;
use crate::tree::{NodeId, Tree};

/// Build the whole tree before returning.
///
/// Only an unreadable root is an error; unreadable subdirectories are kept
/// as empty branches and logged.
pub fn build(root: &Path, filter: &Interesting) -> Result<Tree> {
    let started = Instant::now();
    let mut tree = Tree::new(root_name(root));
    let entries = list_dir(root, filter)?;
    let root_id = tree.root();
    fill(&mut tree, root_id, root, entries, filter);
    tree.sort();
    log::info!(
        "synchronous build of {} finished in {:?}",
        root.display(),
        started.elapsed()
    );
    Ok(tree)
}

fn fill(
    tree: &mut Tree,
    parent: NodeId,
    dir: &Path,
    entries: Vec<(String, bool)>,
    filter: &Interesting,
) {
    for (name, is_dir) in entries {
        if !is_dir {
            tree.push_file(parent, name);
            continue;
        }
        let path = dir.join(&name);
        let id = tree.push_dir(parent, name);
        match list_dir(&path, filter) {
            Ok(children) => fill(tree, id, &path, children, filter),
            Err(e) => log::warn!("skipping unreadable directory {}: {}", path.display(), e),
        }
    }
}

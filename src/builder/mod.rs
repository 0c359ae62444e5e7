//! Tree construction strategies.
//!
//! Three interchangeable builders produce a sorted `Tree` for a root
//! directory:
//! - `sync`: blocking depth-first walk, result available immediately.
//! - `external`: one listing process whose output is parsed on exit.
//! - `incremental`: one directory listing per idle slot, driven by the
//!   owning `Explorer`.
//!
//! All of them share the `Interesting` name filter.

pub mod external;
pub mod incremental;
pub mod sync;

use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;

use crate::error::Result;

/// Which builder a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderKind {
    External,
    Synchronous,
    Incremental,
}

impl BuilderKind {
    /// Parse a builder name from config or CLI.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "external" => Some(BuilderKind::External),
            "synchronous" | "sync" => Some(BuilderKind::Synchronous),
            "incremental" => Some(BuilderKind::Incremental),
            _ => None,
        }
    }

    /// Whether the builder completes after `build` returns.
    pub fn is_async(self) -> bool {
        !matches!(self, BuilderKind::Synchronous)
    }

    pub fn label(self) -> &'static str {
        match self {
            BuilderKind::External => "external",
            BuilderKind::Synchronous => "synchronous",
            BuilderKind::Incremental => "incremental",
        }
    }
}

/// Name filter deciding which directory entries are shown and traversed.
///
/// The exclusion pattern is tested against the bare file name; matching
/// names are skipped, and a skipped directory is never descended into.
#[derive(Debug, Clone, Default)]
pub struct Interesting {
    exclude: Option<Regex>,
}

impl Interesting {
    /// Compile the filter. `None` or an empty pattern lets everything through.
    pub fn new(pattern: Option<&str>) -> Result<Self> {
        let exclude = match pattern {
            Some(p) if !p.is_empty() => Some(Regex::new(p)?),
            _ => None,
        };
        Ok(Self { exclude })
    }

    pub fn allows(&self, name: &str) -> bool {
        match &self.exclude {
            Some(re) => !re.is_match(name),
            None => true,
        }
    }
}

/// Base name used for a tree's root node.
pub fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| root.to_string_lossy().to_string())
}

/// List the immediate entries of `dir` as `(name, is_dir)`, filtered and
/// sorted by name. Unreadable entries are skipped. Symlinks are reported
/// as files so the walk never follows them.
pub fn list_dir(dir: &Path, filter: &Interesting) -> io::Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if !filter.allows(&name) {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push((name, is_dir));
    }
    entries.sort();
    Ok(entries)
}

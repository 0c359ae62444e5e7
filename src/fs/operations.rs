//! Filesystem operations behind the explorer's mutations.
//!
//! Each call either succeeds or returns the underlying I/O error; nothing is
//! retried.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Create an empty file. Fails if the file already exists.
pub fn create_file(path: &Path) -> Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    Ok(())
}

/// Create a single directory. Fails if it exists or the parent is missing.
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path)?;
    Ok(())
}

/// Remove a file, or a directory with everything below it.
pub fn delete(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Move `from` to `to`. Refuses to replace an existing entry.
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    refuse_existing(to)?;
    fs::rename(from, to)?;
    Ok(())
}

/// Copy `from` to `to`, recursing into directories.
pub fn copy(from: &Path, to: &Path) -> Result<()> {
    refuse_existing(to)?;
    if fs::symlink_metadata(from)?.is_dir() {
        copy_dir(from, to)
    } else {
        fs::copy(from, to)?;
        Ok(())
    }
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn refuse_existing(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        )
        .into());
    }
    Ok(())
}

/// First free sibling name for a copy of `path`: `name_copy.ext`,
/// `name_copy2.ext`, and so on.
pub fn copy_destination(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut attempt = 1;
    loop {
        let suffix = if attempt == 1 {
            "_copy".to_string()
        } else {
            format!("_copy{}", attempt)
        };
        let name = match &extension {
            Some(ext) => format!("{}{}.{}", stem, suffix, ext),
            None => format!("{}{}", stem, suffix),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_file_and_dir() {
        let tmp = TempDir::new().unwrap();
        create_file(&tmp.path().join("new.txt")).unwrap();
        create_dir(&tmp.path().join("sub")).unwrap();
        assert!(tmp.path().join("new.txt").is_file());
        assert!(tmp.path().join("sub").is_dir());
    }

    #[test]
    fn create_file_refuses_existing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.txt");
        fs::write(&path, "keep").unwrap();
        assert!(create_file(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
    }

    #[test]
    fn create_dir_needs_parent() {
        let tmp = TempDir::new().unwrap();
        assert!(create_dir(&tmp.path().join("missing").join("sub")).is_err());
    }

    #[test]
    fn delete_file_and_tree() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("parent");
        fs::create_dir_all(dir.join("child")).unwrap();
        fs::write(dir.join("child").join("f.txt"), "").unwrap();
        fs::write(tmp.path().join("g.txt"), "").unwrap();

        delete(&dir).unwrap();
        delete(&tmp.path().join("g.txt")).unwrap();
        assert!(!dir.exists());
        assert!(!tmp.path().join("g.txt").exists());
    }

    #[test]
    fn delete_missing_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(delete(&tmp.path().join("ghost")).is_err());
    }

    #[test]
    fn rename_moves_entry() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("old.txt");
        let to = tmp.path().join("new.txt");
        fs::write(&from, "data").unwrap();
        rename(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "data");
    }

    #[test]
    fn rename_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("a.txt");
        let to = tmp.path().join("b.txt");
        fs::write(&from, "a").unwrap();
        fs::write(&to, "b").unwrap();
        assert!(rename(&from, &to).is_err());
        assert!(from.exists());
    }

    #[test]
    fn copy_file_keeps_source() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("src.txt");
        fs::write(&from, "hello").unwrap();
        let to = tmp.path().join("dst.txt");
        copy(&from, &to).unwrap();
        assert!(from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "hello");
    }

    #[test]
    fn copy_directory_recursively() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("tree");
        fs::create_dir_all(from.join("sub")).unwrap();
        fs::write(from.join("a.txt"), "aaa").unwrap();
        fs::write(from.join("sub").join("b.txt"), "bbb").unwrap();

        let to = tmp.path().join("tree2");
        copy(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(to.join("a.txt")).unwrap(), "aaa");
        assert_eq!(fs::read_to_string(to.join("sub").join("b.txt")).unwrap(), "bbb");
    }

    #[test]
    fn copy_destination_skips_taken_names() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("file.txt");
        fs::write(&path, "").unwrap();
        assert_eq!(copy_destination(&path), tmp.path().join("file_copy.txt"));
        fs::write(tmp.path().join("file_copy.txt"), "").unwrap();
        assert_eq!(copy_destination(&path), tmp.path().join("file_copy2.txt"));
    }

    #[test]
    fn copy_destination_without_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Makefile");
        assert_eq!(copy_destination(&path), tmp.path().join("Makefile_copy"));
    }
}

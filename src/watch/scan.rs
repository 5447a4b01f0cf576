// src/watch/scan.rs

//! Directory walks for priming and for directories that appear while
//! watching.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::fs::FileSystem;
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::path_utils::normalize;
use crate::watch::patterns::WatchFilter;

/// The file or directory being deployed.
///
/// For a directory target the root is the directory itself. For a single
/// file the root is its parent directory and only that file is packaged.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    root: PathBuf,
    file: Option<String>,
}

impl WatchTarget {
    pub fn resolve(fs: &dyn FileSystem, target: &Path) -> Result<Self> {
        if !fs.exists(target) {
            bail!("target {:?} does not exist", target);
        }
        let canon = fs.canonicalize(target)?;

        if fs.is_dir(&canon) {
            return Ok(Self {
                root: canon,
                file: None,
            });
        }

        let parent = canon
            .parent()
            .with_context(|| format!("target file {:?} has no parent directory", canon))?;
        let name = canon
            .file_name()
            .with_context(|| format!("target {:?} has no file name", canon))?;

        Ok(Self {
            root: parent.to_path_buf(),
            file: Some(name.to_string_lossy().into_owned()),
        })
    }

    /// Directory every archive key is relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key of the packaged file when the target is a single file.
    pub fn single_file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}

/// Collect the keys of all files under `start` that pass `filter`.
///
/// `start` must be `root` or a directory below it. Keys are sorted so that
/// priming order is stable.
pub fn collect_files(
    fs: &dyn FileSystem,
    root: &Path,
    start: &Path,
    filter: &WatchFilter,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut stack = vec![start.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let Some(key) = normalize(root, &path) else {
                continue;
            };
            if fs.is_dir(&path) {
                if filter.allows_dir(&key) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && filter.allows(&key) {
                keys.push(key);
            }
        }
    }

    keys.sort();
    Ok(keys)
}

/// Build the priming sequence: one `Added` event per existing file.
pub fn prime(
    fs: &dyn FileSystem,
    target: &WatchTarget,
    filter: &WatchFilter,
) -> Result<Vec<ChangeEvent>> {
    let keys = match target.single_file() {
        Some(key) if filter.allows(key) => vec![key.to_string()],
        Some(_) => Vec::new(),
        None => collect_files(fs, target.root(), target.root(), filter)?,
    };

    debug!(count = keys.len(), root = ?target.root(), "primed deployment package");

    Ok(keys
        .into_iter()
        .map(|key| ChangeEvent::new(key, ChangeKind::Added))
        .collect())
}

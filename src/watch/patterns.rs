// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Decides which archive keys belong to the deployment package.
///
/// Exclude patterns are evaluated against keys (e.g. `"lib/util.js"`). When
/// the target is a single file, only that file's key is accepted.
#[derive(Clone)]
pub struct WatchFilter {
    exclude_set: Option<GlobSet>,
    only: Option<String>,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("only", &self.only)
            .finish_non_exhaustive()
    }
}

impl WatchFilter {
    /// Compile a filter from exclude patterns.
    pub fn new(exclude: &[String], only: Option<String>) -> Result<Self> {
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };

        Ok(Self { exclude_set, only })
    }

    /// A filter that accepts every key.
    pub fn allow_all() -> Self {
        Self {
            exclude_set: None,
            only: None,
        }
    }

    /// Returns true if the key should be packaged.
    pub fn allows(&self, key: &str) -> bool {
        if let Some(only) = &self.only {
            if key != only {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_set {
            if exclude.is_match(key) {
                return false;
            }
        }
        true
    }

    /// Returns true if entries below the directory `key` may be packaged.
    ///
    /// Used to prune directory walks early.
    pub fn allows_dir(&self, key: &str) -> bool {
        if let Some(only) = &self.only {
            // A single-file target never descends into subdirectories.
            return only.starts_with(&format!("{key}/"));
        }
        match &self.exclude_set {
            // `dir/**` style patterns match the directory plus a trailing child.
            Some(exclude) => !exclude.is_match(format!("{key}/")),
            None => true,
        }
    }
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

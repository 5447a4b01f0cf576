// src/archive/archiver.rs

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::archive::hash::content_hash;
use crate::engine::queue::PendingQueue;
use crate::errors::Result;
use crate::fs::{FileSystem, is_not_found};
use crate::types::{ChangeEvent, ChangeKind};

/// Total read attempts for a file that reads as empty. A file that is
/// still empty after this many reads is packaged as empty.
pub const MAX_READ_ATTEMPTS: usize = 4;

/// Pause between reads of a file that came back empty.
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(20);

/// Owns the in-memory deployment package.
///
/// - `entries` holds the raw bytes of every packaged file, keyed by archive key.
/// - `hashes` holds the content hash of each entry; a key is in both maps or
///   in neither.
///
/// Entries are kept sorted and written with a fixed timestamp, so identical
/// contents always serialize to identical bytes.
#[derive(Debug)]
pub struct Archiver {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    entries: BTreeMap<String, Vec<u8>>,
    hashes: HashMap<String, String>,
}

impl Archiver {
    pub fn new(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            root: root.into(),
            fs,
            entries: BTreeMap::new(),
            hashes: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of packaged files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Recorded content hash for `key`, if packaged.
    pub fn hash_of(&self, key: &str) -> Option<&str> {
        self.hashes.get(key).map(String::as_str)
    }

    /// Apply every pending change and return the full serialized package.
    ///
    /// Changes are popped one at a time, so on error the queue still holds
    /// the ones not yet applied.
    pub async fn archive(&mut self, queue: &mut PendingQueue) -> Result<Vec<u8>> {
        let mut applied = 0usize;

        while let Some(ChangeEvent { key, kind }) = queue.pop() {
            match kind {
                ChangeKind::Added | ChangeKind::Modified => {
                    match self.read_settled(&key).await? {
                        Some(bytes) => {
                            if self.store(&key, bytes) {
                                applied += 1;
                            }
                        }
                        // Gone before we got to it: same as an unlink.
                        None => {
                            debug!(key = %key, "file vanished before it was read");
                            if self.remove(&key) {
                                applied += 1;
                            }
                        }
                    }
                }
                ChangeKind::Removed => {
                    if self.remove(&key) {
                        applied += 1;
                    }
                }
            }
        }

        let buffer = self.serialize()?;
        info!(
            applied,
            entries = self.entries.len(),
            bytes = buffer.len(),
            "archive updated"
        );
        Ok(buffer)
    }

    /// Read `key`, retrying while the file reads as empty.
    ///
    /// Returns `None` if the file does not exist.
    async fn read_settled(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.root.join(key);
        let mut attempts = 0;

        loop {
            let fs = Arc::clone(&self.fs);
            let read_path = path.clone();
            let read = tokio::task::spawn_blocking(move || fs.read(&read_path))
                .await
                .context("file read task panicked")?;
            attempts += 1;

            let bytes = match read {
                Ok(bytes) => bytes,
                Err(err) if is_not_found(&err) => return Ok(None),
                Err(err) => return Err(err.into()),
            };

            if !bytes.is_empty() || attempts >= MAX_READ_ATTEMPTS {
                return Ok(Some(bytes));
            }

            debug!(key = %key, attempts, "file read as empty; retrying");
            tokio::time::sleep(EMPTY_READ_BACKOFF).await;
        }
    }

    /// Insert or replace an entry. Returns false if the content is unchanged.
    fn store(&mut self, key: &str, bytes: Vec<u8>) -> bool {
        let hash = content_hash(&bytes);
        if self.hashes.get(key) == Some(&hash) {
            debug!(key = %key, "content unchanged; skipping");
            return false;
        }

        debug!(key = %key, size = bytes.len(), "packaging file");
        self.hashes.insert(key.to_string(), hash);
        self.entries.insert(key.to_string(), bytes);
        true
    }

    /// Remove `key`, and everything below it when `key` was a directory.
    /// Returns false if nothing was packaged under that key.
    fn remove(&mut self, key: &str) -> bool {
        let prefix = format!("{key}/");
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|k| k.as_str() == key || k.starts_with(&prefix))
            .cloned()
            .collect();

        for k in &doomed {
            self.entries.remove(k);
            self.hashes.remove(k);
            debug!(key = %k, "removed from package");
        }
        !doomed.is_empty()
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (key, bytes) in &self.entries {
            writer.start_file(key.as_str(), options)?;
            writer.write_all(bytes)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

// src/watch/watcher.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::PipelineEvent;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{ChangeEvent, ChangeKind};
use crate::watch::events::{Classified, PathState, classify};
use crate::watch::path_utils::normalize;
use crate::watch::patterns::WatchFilter;
use crate::watch::scan::{WatchTarget, collect_files, prime};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher for `target` that forwards normalized
/// changes into the pipeline.
///
/// - A directory target is watched recursively.
/// - A single-file target is watched through its parent directory, so
///   editors that save by renaming a temp file over it are still seen.
///
/// Existing files are not reported; priming covers those.
pub fn spawn_watcher(
    target: &WatchTarget,
    filter: WatchFilter,
    pipeline_tx: mpsc::Sender<PipelineEvent>,
) -> Result<WatcherHandle> {
    let root = target.root().to_path_buf();
    let mode = if target.single_file().is_some() {
        RecursiveMode::NonRecursive
    } else {
        RecursiveMode::Recursive
    };

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("ulos: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("ulos: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, mode)?;

    info!("file watcher started on {:?}", root);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");

            for (index, path) in event.paths.iter().enumerate() {
                let changes =
                    changes_for_path(fs.as_ref(), &root, &filter, &event.kind, index, path);

                for change in changes {
                    debug!(key = %change.key, kind = %change.kind, "forwarding change");
                    if let Err(err) = pipeline_tx.send(PipelineEvent::FileChanged(change)).await {
                        warn!("failed to send PipelineEvent::FileChanged: {err}");
                        // If the pipeline is gone, there's no point keeping the
                        // watcher loop alive.
                        return;
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Start watching `target`, then run the priming scan.
///
/// The watcher is registered first, so a file created while the scan runs
/// is reported by the scan, the watcher, or both. Duplicates coalesce in
/// the pending queue.
pub fn watch_and_prime(
    fs: &dyn FileSystem,
    target: &WatchTarget,
    filter: &WatchFilter,
    pipeline_tx: mpsc::Sender<PipelineEvent>,
) -> Result<(WatcherHandle, Vec<ChangeEvent>)> {
    let handle = spawn_watcher(target, filter.clone(), pipeline_tx)?;
    let primed = prime(fs, target, filter)?;
    Ok((handle, primed))
}

/// Turn one path of a `notify` event into zero or more pipeline changes.
pub fn changes_for_path(
    fs: &dyn FileSystem,
    root: &Path,
    filter: &WatchFilter,
    kind: &EventKind,
    index: usize,
    path: &Path,
) -> Vec<ChangeEvent> {
    if path == root {
        return Vec::new();
    }

    let Some(key) = normalize(root, path) else {
        warn!("could not relativize path {:?} against root {:?}", path, root);
        return Vec::new();
    };

    let state = if fs.is_file(path) {
        PathState::File
    } else if fs.is_dir(path) {
        PathState::Dir
    } else {
        PathState::Missing
    };

    match classify(kind, index, state) {
        None => Vec::new(),
        Some(Classified::Change(ChangeKind::Removed)) => {
            // The path is gone, so it may have been a file or a directory.
            if filter.allows(&key) || filter.allows_dir(&key) {
                vec![ChangeEvent::new(key, ChangeKind::Removed)]
            } else {
                Vec::new()
            }
        }
        Some(Classified::Change(change)) => {
            if filter.allows(&key) {
                vec![ChangeEvent::new(key, change)]
            } else {
                Vec::new()
            }
        }
        Some(Classified::ScanDir) => {
            if !filter.allows_dir(&key) {
                return Vec::new();
            }
            match collect_files(fs, root, path, filter) {
                Ok(keys) => keys
                    .into_iter()
                    .map(|k| ChangeEvent::new(k, ChangeKind::Added))
                    .collect(),
                Err(err) => {
                    warn!(dir = %key, error = %err, "failed to scan new directory");
                    Vec::new()
                }
            }
        }
    }
}

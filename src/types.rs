use std::fmt;

/// Kind of change observed for a single file.
///
/// Only the most recent kind per key is kept while a change waits in the
/// pending queue, so the variants carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "add",
            ChangeKind::Modified => "change",
            ChangeKind::Removed => "unlink",
        };
        f.write_str(s)
    }
}

/// A normalized filesystem change, keyed by its archive-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Forward-slash separated path relative to the watch root.
    pub key: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(key: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

/// Status transitions published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    /// A changed package is being sent to the endpoint.
    Uploading,
    /// The endpoint accepted the package and nothing is left in the queue.
    Uploaded { code_size: u64 },
    /// A fatal upload error, only published when the pipeline keeps
    /// watching after errors.
    Failed { message: String },
}

// src/watch/path_utils.rs

//! Mapping filesystem paths to archive keys.

use std::path::Path;

/// Convert a path into an archive key: relative to `root`, with forward
/// slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` for paths outside `root`, and for `root` itself.
pub fn normalize(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return to_key(rel);
    }

    // Different absolute prefixes may name the same directory (macOS
    // /private/var, symlinked checkouts). Removed files cannot be
    // canonicalized, so their parent is resolved instead.
    let root_canon = root.canonicalize().ok()?;
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .and_then(to_key)
}

fn to_key(rel: &Path) -> Option<String> {
    let key = rel.to_string_lossy().replace('\\', "/");
    if key.is_empty() { None } else { Some(key) }
}

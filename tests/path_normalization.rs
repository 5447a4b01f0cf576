// tests/path_normalization.rs

use std::error::Error;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::TempDir;
use ulos::watch::normalize;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn nested_path_becomes_forward_slash_key() {
    let root = Path::new("/deploy/dist");
    let path = root.join("lib").join("util.js");

    assert_eq!(normalize(root, &path).as_deref(), Some("lib/util.js"));
}

#[test]
fn root_itself_has_no_key() {
    let root = Path::new("/deploy/dist");
    assert_eq!(normalize(root, root), None);
}

#[test]
fn path_outside_root_has_no_key() {
    let root = Path::new("/deploy/dist");
    assert_eq!(normalize(root, Path::new("/deploy/other/index.js")), None);
}

#[test]
fn removed_file_normalizes_through_canonical_parent() -> TestResult {
    let dir = TempDir::new()?;
    std::fs::create_dir(dir.path().join("lib"))?;

    // A non-canonical spelling of the root with a `..` hop in it.
    let root = dir.path().join("lib").join("..");
    let gone = dir.path().join("lib").join("deleted.js");

    assert_eq!(normalize(&root, &gone).as_deref(), Some("lib/deleted.js"));
    Ok(())
}

proptest! {
    #[test]
    fn key_is_relative_and_slash_separated(
        segments in proptest::collection::vec("[a-zA-Z0-9_.-]{1,8}", 1..5)
            .prop_filter("no dot segments", |s| s.iter().all(|p| p != "." && p != ".."))
    ) {
        let root = PathBuf::from("/srv/app");
        let mut path = root.clone();
        for segment in &segments {
            path.push(segment);
        }

        let key = normalize(&root, &path);

        prop_assert_eq!(key, Some(segments.join("/")));
    }
}

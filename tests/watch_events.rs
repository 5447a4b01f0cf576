// tests/watch_events.rs

use std::error::Error;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::EventKind;
use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use tempfile::TempDir;
use ulos::fs::RealFileSystem;
use ulos::fs::mock::MockFileSystem;
use ulos::types::{ChangeEvent, ChangeKind};
use ulos::watch::events::{Classified, PathState, classify};
use ulos::watch::{WatchFilter, WatchTarget, changes_for_path, prime, watch_and_prime};
use ulos_test_utils::builders::{PipelineBuilder, PipelineHarness};
use ulos_test_utils::fake_client::FakeFunctionClient;
use ulos_test_utils::{changed, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const ROOT: &str = "/site";

fn filter(exclude: &[&str]) -> WatchFilter {
    let patterns: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    WatchFilter::new(&patterns, None).unwrap()
}

#[test]
fn classify_maps_event_kinds_to_change_kinds() {
    let data = EventKind::Modify(ModifyKind::Data(DataChange::Content));

    assert_eq!(
        classify(&EventKind::Create(CreateKind::File), 0, PathState::File),
        Some(Classified::Change(ChangeKind::Added))
    );
    assert_eq!(
        classify(&data, 0, PathState::File),
        Some(Classified::Change(ChangeKind::Modified))
    );
    assert_eq!(
        classify(&EventKind::Remove(RemoveKind::File), 0, PathState::Missing),
        Some(Classified::Change(ChangeKind::Removed))
    );
    assert_eq!(
        classify(&EventKind::Create(CreateKind::Folder), 0, PathState::Dir),
        Some(Classified::ScanDir)
    );
}

#[test]
fn classify_ignores_metadata_and_access() {
    let metadata = EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions));
    assert_eq!(classify(&metadata, 0, PathState::File), None);
    assert_eq!(
        classify(&EventKind::Access(notify::event::AccessKind::Any), 0, PathState::File),
        None
    );
}

#[test]
fn rename_both_removes_old_name_and_adds_new_one() {
    let rename = EventKind::Modify(ModifyKind::Name(RenameMode::Both));

    assert_eq!(
        classify(&rename, 0, PathState::Missing),
        Some(Classified::Change(ChangeKind::Removed))
    );
    assert_eq!(
        classify(&rename, 1, PathState::File),
        Some(Classified::Change(ChangeKind::Added))
    );
}

#[test]
fn modify_on_vanished_path_is_a_removal() {
    let data = EventKind::Modify(ModifyKind::Data(DataChange::Any));
    assert_eq!(
        classify(&data, 0, PathState::Missing),
        Some(Classified::Change(ChangeKind::Removed))
    );
}

#[test]
fn excluded_keys_produce_no_changes() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/app.js.map", "{}");

    let changes = changes_for_path(
        &fs,
        Path::new(ROOT),
        &filter(&["**/*.map"]),
        &EventKind::Create(CreateKind::File),
        0,
        Path::new("/site/app.js.map"),
    );

    assert!(changes.is_empty());
}

#[test]
fn new_directory_reports_every_file_inside() {
    let fs = MockFileSystem::new();
    fs.add_file("/site/assets/logo.svg", "<svg/>");
    fs.add_file("/site/assets/css/main.css", "body{}");
    fs.add_file("/site/assets/main.css.map", "{}");

    let changes = changes_for_path(
        &fs,
        Path::new(ROOT),
        &filter(&["**/*.map"]),
        &EventKind::Create(CreateKind::Folder),
        0,
        Path::new("/site/assets"),
    );

    assert_eq!(
        changes,
        vec![
            ChangeEvent::new("assets/css/main.css", ChangeKind::Added),
            ChangeEvent::new("assets/logo.svg", ChangeKind::Added),
        ]
    );
}

#[test]
fn removed_directory_is_reported_by_its_key() {
    let fs = MockFileSystem::new();

    let changes = changes_for_path(
        &fs,
        Path::new(ROOT),
        &WatchFilter::allow_all(),
        &EventKind::Remove(RemoveKind::Folder),
        0,
        Path::new("/site/lib"),
    );

    assert_eq!(changes, vec![ChangeEvent::new("lib", ChangeKind::Removed)]);
}

#[test]
fn events_on_the_root_itself_are_ignored() {
    let fs = MockFileSystem::new();
    let changes = changes_for_path(
        &fs,
        Path::new(ROOT),
        &WatchFilter::allow_all(),
        &EventKind::Modify(ModifyKind::Any),
        0,
        Path::new(ROOT),
    );
    assert!(changes.is_empty());
}

#[test]
fn single_file_target_only_accepts_its_own_key() {
    let only = WatchFilter::new(&[], Some("handler.py".to_string())).unwrap();

    assert!(only.allows("handler.py"));
    assert!(!only.allows("other.py"));
    assert!(!only.allows_dir("lib"));
}

#[test]
fn priming_a_directory_lists_existing_files_as_added() -> TestResult {
    let dir = TempDir::new()?;
    std::fs::create_dir_all(dir.path().join("lib"))?;
    std::fs::write(dir.path().join("index.js"), "i")?;
    std::fs::write(dir.path().join("lib").join("util.js"), "u")?;
    std::fs::write(dir.path().join("lib").join("util.js.map"), "{}")?;

    let fs = RealFileSystem;
    let target = WatchTarget::resolve(&fs, dir.path())?;
    let primed = prime(&fs, &target, &filter(&["**/*.map"]))?;

    assert_eq!(
        primed,
        vec![
            ChangeEvent::new("index.js", ChangeKind::Added),
            ChangeEvent::new("lib/util.js", ChangeKind::Added),
        ]
    );
    Ok(())
}

#[test]
fn priming_a_single_file_target_uses_its_parent_as_root() -> TestResult {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("handler.py"), "def handler(): pass")?;
    std::fs::write(dir.path().join("notes.txt"), "not deployed")?;

    let fs = RealFileSystem;
    let target = WatchTarget::resolve(&fs, &dir.path().join("handler.py"))?;
    let filter = WatchFilter::new(&[], target.single_file().map(str::to_string))?;

    assert_eq!(target.root(), dir.path().canonicalize()?);
    assert_eq!(
        prime(&fs, &target, &filter)?,
        vec![ChangeEvent::new("handler.py", ChangeKind::Added)]
    );
    Ok(())
}

#[tokio::test]
async fn file_created_before_startup_finishes_is_in_the_first_package() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("a.js"), "a")?;

    let fs = RealFileSystem;
    let target = WatchTarget::resolve(&fs, dir.path())?;
    let filter = WatchFilter::new(&[], None)?;
    let client = FakeFunctionClient::new();
    let PipelineHarness {
        events, manager, ..
    } = PipelineBuilder::new(target.root(), Arc::new(RealFileSystem))
        .client(client.clone())
        .build();

    let (watcher, primed) = watch_and_prime(&fs, &target, &filter, events.clone())?;
    assert_eq!(primed, vec![ChangeEvent::new("a.js", ChangeKind::Added)]);

    // Written after the scan, while credentials would still be resolving.
    std::fs::write(dir.path().join("b.js"), "b")?;

    let run = tokio::spawn(manager.run());
    for change in primed {
        events.send(changed(&change.key, change.kind)).await?;
    }

    with_timeout(async {
        while client.upload_count() == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    let uploads = client.uploads();
    let archive = zip::ZipArchive::new(Cursor::new(uploads[0].package.as_slice()))?;
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"a.js"));
    assert!(names.contains(&"b.js"));

    drop(watcher);
    drop(events);
    with_timeout(run).await??;
    Ok(())
}

#[test]
fn missing_target_is_an_error() {
    let fs = RealFileSystem;
    assert!(WatchTarget::resolve(&fs, Path::new("/definitely/not/here")).is_err());
}

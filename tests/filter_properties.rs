use std::path::{Path, PathBuf};
use std::sync::Arc;

use proptest::prelude::*;

use watchpipe::fs::{FileSystem, MockFileSystem};
use watchpipe::watch::{ChangeCollector, ChangeKind, EventFilter, WatcherEvent};
use watchpipe_test_utils::builders::RecordingBackend;

const IGNORED: [&str; 3] = ["vendor", "bin", ".git"];

fn filter() -> EventFilter {
    EventFilter::new(["go", "mod"], IGNORED)
}

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,8}",
        1 => proptest::sample::select(IGNORED.to_vec()).prop_map(str::to_string),
    ]
}

fn extension() -> impl Strategy<Value = String> {
    proptest::sample::select(vec!["go", "mod", "md", "txt", "rs", "swp"]).prop_map(str::to_string)
}

fn relative_path() -> impl Strategy<Value = PathBuf> {
    (proptest::collection::vec(segment(), 0..4), "[a-z]{1,8}", extension()).prop_map(
        |(dirs, stem, ext)| {
            let mut path: PathBuf = dirs.into_iter().collect();
            path.push(format!("{stem}.{ext}"));
            path
        },
    )
}

fn kind() -> impl Strategy<Value = ChangeKind> {
    prop_oneof![
        Just(ChangeKind::Created),
        Just(ChangeKind::Modified),
        Just(ChangeKind::Removed),
    ]
}

proptest! {
    #[test]
    fn ignored_segment_is_never_accepted(path in relative_path()) {
        let has_ignored = path
            .components()
            .any(|c| IGNORED.contains(&&*c.as_os_str().to_string_lossy()));
        if has_ignored {
            prop_assert!(!filter().accepts(&path));
        }
    }

    #[test]
    fn foreign_extension_is_never_accepted(path in relative_path()) {
        let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
        if !matches!(ext.as_deref(), Some("go") | Some("mod")) {
            prop_assert!(!filter().accepts(&path));
        }
    }

    #[test]
    fn one_window_yields_at_most_one_filtered_batch(
        changes in proptest::collection::vec((relative_path(), kind()), 0..20)
    ) {
        let fs = MockFileSystem::new();
        fs.add_dir("/root");
        let shared: Arc<dyn FileSystem> = Arc::new(fs);
        let mut collector =
            ChangeCollector::new(filter(), shared, Box::new(RecordingBackend::new()));
        collector.watch_root(Path::new("/root")).expect("root is watchable");

        let expected = changes.iter().filter(|(p, _)| filter().accepts(p)).count();
        for (path, kind) in &changes {
            collector.ingest(WatcherEvent::new(Path::new("/root").join(path), *kind));
        }

        match collector.flush() {
            None => prop_assert_eq!(expected, 0),
            Some(batch) => {
                prop_assert!(!batch.is_empty());
                prop_assert!(batch.len() <= expected);
                for event in &batch {
                    let relative = event.path.strip_prefix("/root").expect("inside root");
                    prop_assert!(filter().accepts(relative));
                }
            }
        }
        prop_assert!(collector.flush().is_none());
    }
}

//! Tests for ReplayService

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use fstree::application::services::{tree_digest, ReplayOptions, ReplayService, StepOutcome};
use fstree::application::ApplicationError;
use fstree::domain::TreeError;
use fstree::infrastructure::traits::{FileSystem, RealFileSystem};
use fstree::util::testing::init_test_setup;

/// Helper to create temp script files for testing
fn create_script(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write script");
    path
}

fn real_service() -> ReplayService {
    init_test_setup();
    ReplayService::new(Arc::new(RealFileSystem))
}

/// Scripts held in memory, keyed by path.
#[derive(Default)]
struct MemoryFileSystem {
    files: HashMap<PathBuf, String>,
}

impl MemoryFileSystem {
    fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.to_string());
        self
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such script"))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

const LAYOUT: &str = "\
root /
add etc /
add passwd etc
add usr /
add bin usr
move bin usr etc
";

#[test]
fn given_clean_script_when_replaying_then_all_steps_apply() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let script = create_script(&temp, "layout.fst", LAYOUT);

    // Act
    let report = real_service()
        .replay_file(&script, "unused", ReplayOptions::default())
        .unwrap();

    // Assert
    assert!(report.is_clean());
    assert_eq!(report.applied(), 5);
    assert_eq!(report.tree.root(), "/");
    assert_eq!(
        report.tree.path_to_root(&"bin".to_string()),
        vec!["bin", "etc", "/"]
    );
}

#[test]
fn given_script_without_root_when_replaying_then_uses_default_root() {
    let temp = TempDir::new().unwrap();
    let script = create_script(&temp, "noroot.fst", "add a r\nadd b a\n");

    let report = real_service()
        .replay_file(&script, "r", ReplayOptions::default())
        .unwrap();

    assert_eq!(report.tree.root(), "r");
    assert_eq!(report.tree.node_count(), 3);
}

#[test]
fn given_rejected_step_when_stop_on_error_then_rest_is_skipped() {
    let temp = TempDir::new().unwrap();
    let script = create_script(
        &temp,
        "cycle.fst",
        "root R\nadd A R\nadd B A\nmove A R B\nadd C B\n",
    );

    let report = real_service()
        .replay_file(&script, "/", ReplayOptions::default())
        .unwrap();

    assert_eq!(report.applied(), 2);
    assert_eq!(report.rejected(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.steps[2].line, 4);
    assert_eq!(
        report.steps[2].outcome,
        StepOutcome::Rejected(TreeError::CycleDetected {
            node: "A".into(),
            target: "B".into()
        })
    );
    assert!(!report.tree.contains(&"C".to_string()));
}

#[test]
fn given_rejected_step_when_keep_going_then_later_steps_apply() {
    let temp = TempDir::new().unwrap();
    let script = create_script(
        &temp,
        "cycle.fst",
        "root R\nadd A R\nadd B A\nmove A R B\nadd C B\n",
    );
    let options = ReplayOptions {
        stop_on_error: false,
        ..ReplayOptions::default()
    };

    let report = real_service().replay_file(&script, "/", options).unwrap();

    assert_eq!(report.applied(), 3);
    assert_eq!(report.rejected(), 1);
    assert_eq!(report.skipped(), 0);
    assert_eq!(
        report.tree.path_to_root(&"C".to_string()),
        vec!["C", "B", "A", "R"]
    );
}

#[test]
fn given_rejected_step_when_atomic_then_error_names_the_line() {
    let temp = TempDir::new().unwrap();
    let script = create_script(
        &temp,
        "atomic.fst",
        "root R\nadd A R\n\n# inner node\nadd B A\nremove A R\n",
    );
    let options = ReplayOptions {
        atomic: true,
        ..ReplayOptions::default()
    };

    let err = real_service()
        .replay_file(&script, "/", options)
        .unwrap_err();

    match err {
        ApplicationError::AtomicRejected { line, source } => {
            assert_eq!(line, 6);
            assert_eq!(source.index, 2);
            assert_eq!(source.error, TreeError::NotLeaf("A".into()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_clean_script_when_atomic_and_verified_then_all_steps_apply() {
    let temp = TempDir::new().unwrap();
    let script = create_script(&temp, "layout.fst", LAYOUT);
    let options = ReplayOptions {
        atomic: true,
        verify: true,
        ..ReplayOptions::default()
    };

    let report = real_service().replay_file(&script, "/", options).unwrap();

    assert!(report.is_clean());
    assert!(report.tree.check_invariants().is_ok());
}

#[test]
fn given_equivalent_scripts_then_digests_match() {
    let temp = TempDir::new().unwrap();
    let direct = create_script(
        &temp,
        "direct.fst",
        "root /\nadd etc /\nadd usr /\nadd bin etc\n",
    );
    let detour = create_script(
        &temp,
        "detour.fst",
        "root /\nadd usr /\nadd bin usr\nadd etc /\nmove bin usr etc\nadd tmp /\nremove tmp /\n",
    );
    let service = real_service();

    let a = service
        .replay_file(&direct, "/", ReplayOptions::default())
        .unwrap();
    let b = service
        .replay_file(&detour, "/", ReplayOptions::default())
        .unwrap();

    assert_eq!(tree_digest(&a.tree), tree_digest(&b.tree));
    assert_eq!(tree_digest(&a.tree).len(), 64);
}

#[test]
fn given_different_trees_then_digests_differ() {
    let fs = MemoryFileSystem::default()
        .with_file("/a.fst", "root /\nadd x /\nadd y x\n")
        .with_file("/b.fst", "root /\nadd x /\nadd y /\n");
    let service = ReplayService::new(Arc::new(fs));

    let a = service
        .replay_file(Path::new("/a.fst"), "/", ReplayOptions::default())
        .unwrap();
    let b = service
        .replay_file(Path::new("/b.fst"), "/", ReplayOptions::default())
        .unwrap();

    assert_ne!(tree_digest(&a.tree), tree_digest(&b.tree));
}

#[test]
fn given_missing_script_when_replaying_then_operation_failed() {
    let service = ReplayService::new(Arc::new(MemoryFileSystem::default()));

    let err = service
        .replay_file(Path::new("/missing.fst"), "/", ReplayOptions::default())
        .unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(err.to_string().contains("/missing.fst"));
}

#[test]
fn given_malformed_script_when_loading_then_parse_error() {
    let fs = MemoryFileSystem::default().with_file("/bad.fst", "add a /\nmove a /\n");
    let service = ReplayService::new(Arc::new(fs));

    let err = service.load(Path::new("/bad.fst")).unwrap_err();

    assert!(matches!(err, ApplicationError::Parse { line: 2, .. }));
}

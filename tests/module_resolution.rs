//! Integration tests for the module index and the resolver seams.
//!
//! These tests exercise the shared module index under concurrent use and
//! plug custom parsers and remote caches into an [`Updater`].

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use cuegraph::config::{ModuleIndexOptions, ProjectConfig};
use cuegraph::error::{CuegraphError, Result};
use cuegraph::{CueHeaderParser, ModuleIndex, RemoteCache, SourceHeader, SourceParser, Updater};

// ============================================================================
// Test Helpers
// ============================================================================

fn create_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create dir");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Creates a module root with `count` packages under `gen/pkgN`.
fn create_module(root: &Path, rel: &str, count: usize) {
    create_file(root, &format!("{}/module.cue", rel), "module: \"corp.example\"\n");
    for i in 0..count {
        create_file(
            root,
            &format!("{}/gen/pkg{}/types.cue", rel, i),
            &format!("package pkg{}\n", i),
        );
    }
}

fn new_index() -> ModuleIndex {
    ModuleIndex::new(Arc::new(CueHeaderParser), &ModuleIndexOptions::default())
}

/// Remote cache that knows nothing and counts how often it was asked.
#[derive(Default)]
struct CountingRemote {
    calls: AtomicUsize,
}

impl RemoteCache for CountingRemote {
    fn root(&self, import_path: &str) -> Result<(String, String)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CuegraphError::RemoteLookup {
            import: import_path.to_string(),
            reason: "offline".to_string(),
        })
    }
}

/// Parser that assigns every file the package `fixed` and no imports.
struct FixedPackageParser;

impl SourceParser for FixedPackageParser {
    fn parse_source(&self, _path: &Path, _source: &str) -> Result<SourceHeader> {
        Ok(SourceHeader {
            package: Some("fixed".to_string()),
            imports: Vec::new(),
        })
    }
}

// ============================================================================
// Concurrent Access
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for m in 0..4 {
            create_module(temp_dir.path(), &format!("m{}/cue.mod", m), 5);
        }
        let index = Arc::new(new_index());

        std::thread::scope(|s| {
            for m in 0..4 {
                let index = index.clone();
                let dir = temp_dir.path().join(format!("m{}/cue.mod", m));
                s.spawn(move || {
                    index.register_module(&format!("//m{}/cue.mod:cue.mod", m), &dir);
                });
            }
            for _ in 0..4 {
                let index = index.clone();
                s.spawn(move || {
                    for i in 0..5 {
                        // readers may run before or after any registration
                        let _ = index.lookup(&format!("pkg{}", i), None);
                    }
                });
            }
        });

        let summaries = index.summaries();
        assert_eq!(summaries.len(), 4);
        for m in 0..4 {
            let label = format!("//m{}/cue.mod:cue.mod", m);
            assert_eq!(
                index.lookup("pkg3", Some(&label)).as_deref(),
                Some(format!("//m{}/cue.mod/gen/pkg3:pkg3_instance", m).as_str())
            );
        }
    }

    #[test]
    fn test_registration_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_module(temp_dir.path(), "cue.mod", 2);
        let index = new_index();
        let dir = temp_dir.path().join("cue.mod");

        assert!(index.register_module("//cue.mod:cue.mod", &dir));
        let before = index.summaries();
        assert!(!index.register_module("//cue.mod:cue.mod", &dir));
        assert_eq!(index.summaries(), before);
    }

    #[test]
    fn test_unhinted_lookup_prefers_first_registered_module() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_module(temp_dir.path(), "a/cue.mod", 1);
        create_module(temp_dir.path(), "b/cue.mod", 1);
        let index = new_index();

        index.register_module("//b/cue.mod:cue.mod", &temp_dir.path().join("b/cue.mod"));
        index.register_module("//a/cue.mod:cue.mod", &temp_dir.path().join("a/cue.mod"));

        assert_eq!(
            index.lookup("pkg0", None).as_deref(),
            Some("//b/cue.mod/gen/pkg0:pkg0_instance")
        );
        assert_eq!(
            index.lookup("pkg0", Some("//a/cue.mod:cue.mod")).as_deref(),
            Some("//a/cue.mod/gen/pkg0:pkg0_instance")
        );
        assert!(index.lookup("pkg0", Some("//c/cue.mod:cue.mod")).is_none());
    }
}

// ============================================================================
// Pluggable Collaborators
// ============================================================================

mod collaborators {
    use super::*;

    #[test]
    fn test_remote_failure_drops_import_without_failing_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_file(
            temp_dir.path(),
            "app/a.cue",
            "package app\n\nimport (\n\t\"example.com/x\"\n\t\"example.com/y\"\n)\n",
        );
        create_file(temp_dir.path(), "lib/b.cue", "package lib\n");

        let remote = Arc::new(CountingRemote::default());
        let updater = Updater::with_parts(
            ProjectConfig::default(),
            Arc::new(CueHeaderParser),
            remote.clone(),
        );
        let report = updater.run(temp_dir.path()).expect("Update failed");

        let app = report.directory("app").expect("app updated");
        assert!(app.gen[0].attr("deps").is_none());
        assert!(report.directory("lib").is_some());
        assert_eq!(remote.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_custom_parser_drives_aggregation() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_file(temp_dir.path(), "svc/one.cue", "this is not parsed");
        create_file(temp_dir.path(), "svc/two.cue", "neither is this");

        let updater = Updater::with_parts(
            ProjectConfig::default(),
            Arc::new(FixedPackageParser),
            Arc::new(CountingRemote::default()),
        );
        let agg = updater.inspect(temp_dir.path(), "svc").expect("Inspect failed");

        assert_eq!(agg.instances.len(), 1);
        assert_eq!(agg.instances["fixed_instance"].sorted_srcs(), vec!["one.cue", "two.cue"]);
    }

    #[test]
    fn test_module_index_uses_injected_parser() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        create_file(temp_dir.path(), "cue.mod/gen/a/b/anything.cue", "garbage");

        let index = ModuleIndex::new(Arc::new(FixedPackageParser), &ModuleIndexOptions::default());
        index.register_module("//cue.mod:cue.mod", &temp_dir.path().join("cue.mod"));

        assert_eq!(
            index.lookup("a:fixed", None).as_deref(),
            Some("//cue.mod/gen/a/b:fixed_instance")
        );
    }
}

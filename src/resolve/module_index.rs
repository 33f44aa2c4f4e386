//! Process-wide index of module roots.
//!
//! Every registered module root has its conventional package directories
//! (`gen`, `usr`, `pkg` by default) walked once; each package found there is
//! indexed under every import-string shape a caller is likely to use. The
//! index is shared across all directory passes behind a single
//! reader/writer lock: registration holds the write lock for the whole walk
//! of one module, lookups take the read lock.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::{CollisionPolicy, ModuleIndexOptions};
use crate::source::{SourceParser, SOURCE_EXTENSION};
use crate::target;

/// Host-like import prefixes that get an extra domain-qualified entry.
pub const DEFAULT_DOMAIN_PREFIXES: &[&str] = &["k8s.io/", "sigs.k8s.io/", "github.com/"];

/// One registered module root and its import index.
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    pub label: String,
    pub dir: PathBuf,
    imports: HashMap<String, String>,
    /// Keys inserted as a package's own import path.
    exact: HashSet<String>,
}

impl ModuleRecord {
    fn new(label: &str, dir: &Path) -> Self {
        Self {
            label: label.to_string(),
            dir: dir.to_path_buf(),
            imports: HashMap::new(),
            exact: HashSet::new(),
        }
    }

    pub fn lookup(&self, import: &str) -> Option<&str> {
        self.imports.get(import).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Summary row for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub label: String,
    pub dir: PathBuf,
    pub entries: usize,
}

pub struct ModuleIndex {
    modules: RwLock<IndexMap<String, ModuleRecord>>,
    parser: Arc<dyn SourceParser>,
    known_dirs: Vec<String>,
    domain_prefixes: Vec<String>,
    collision: CollisionPolicy,
}

impl ModuleIndex {
    pub fn new(parser: Arc<dyn SourceParser>, options: &ModuleIndexOptions) -> Self {
        let mut domain_prefixes: Vec<String> =
            DEFAULT_DOMAIN_PREFIXES.iter().map(|s| s.to_string()).collect();
        for extra in &options.domain_prefixes {
            let extra = if extra.ends_with('/') {
                extra.clone()
            } else {
                format!("{}/", extra)
            };
            if !domain_prefixes.contains(&extra) {
                domain_prefixes.push(extra);
            }
        }

        Self {
            modules: RwLock::new(IndexMap::new()),
            parser,
            known_dirs: options.known_dirs.clone(),
            domain_prefixes,
            collision: options.collision,
        }
    }

    /// Registers the module rooted at `dir` under `label` and indexes its
    /// package directories.
    ///
    /// Registering the same label and directory again is a no-op and returns
    /// `false`. A label re-registered with a different directory is re-indexed.
    pub fn register_module(&self, label: &str, dir: &Path) -> bool {
        let mut modules = self.modules.write();
        if let Some(existing) = modules.get(label) {
            if existing.dir == dir {
                return false;
            }
            tracing::warn!(
                "module {} moved from {} to {}, re-indexing",
                label,
                existing.dir.display(),
                dir.display()
            );
        }

        let mut record = ModuleRecord::new(label, dir);
        for subdir in &self.known_dirs {
            let dir_path = dir.join(subdir);
            if !dir_path.is_dir() {
                continue;
            }
            self.index_module_dir(&mut record, subdir, &dir_path);
        }
        tracing::info!("indexed module {}: {} import entries", label, record.len());

        modules.insert(label.to_string(), record);
        true
    }

    /// Looks `import` up. With a module hint only that module is consulted;
    /// without one, modules are scanned in registration order and the first
    /// hit wins.
    pub fn lookup(&self, import: &str, module: Option<&str>) -> Option<String> {
        let modules = self.modules.read();
        match module.filter(|m| !m.is_empty()) {
            Some(label) => modules
                .get(label)
                .and_then(|record| record.lookup(import))
                .map(String::from),
            None => modules
                .values()
                .find_map(|record| record.lookup(import))
                .map(String::from),
        }
    }

    pub fn is_registered(&self, label: &str) -> bool {
        self.modules.read().contains_key(label)
    }

    pub fn summaries(&self) -> Vec<ModuleSummary> {
        self.modules
            .read()
            .values()
            .map(|record| ModuleSummary {
                label: record.label.clone(),
                dir: record.dir.clone(),
                entries: record.len(),
            })
            .collect()
    }

    fn index_module_dir(&self, record: &mut ModuleRecord, subdir: &str, dir_path: &Path) {
        for entry in WalkDir::new(dir_path).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("walking {}/{}: {}", record.dir.display(), subdir, e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !path.to_string_lossy().ends_with(SOURCE_EXTENSION) {
                continue;
            }

            let import_path = match path.parent().and_then(|p| p.strip_prefix(dir_path).ok()) {
                Some(rel) => rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
                None => continue,
            };
            if import_path.is_empty() {
                tracing::debug!("skipping {}: not inside a package directory", path.display());
                continue;
            }

            let header = match self.parser.parse_file(path) {
                Ok(header) => header,
                Err(e) => {
                    tracing::warn!("error parsing source file {}: {}", path.display(), e);
                    continue;
                }
            };
            let Some(package) = header.package.filter(|p| !p.is_empty()) else {
                continue;
            };

            let target =
                target::module_instance_target(&record.label, subdir, &import_path, &package);
            self.index_references(record, &import_path, &package, &target);
        }
    }

    /// Inserts the four reference shapes of one package.
    ///
    /// A package's exact import path always beats a shorthand derived from
    /// another package, whatever the collision policy.
    fn index_references(
        &self,
        record: &mut ModuleRecord,
        import_path: &str,
        package: &str,
        target: &str,
    ) {
        self.insert_exact(record, import_path, target);

        // bare package name
        self.insert(record, package.to_string(), target);

        // colon-qualified prefixes: a:pkg, a/b:pkg, ...; the full path is exact
        let parts: Vec<&str> = import_path.split('/').collect();
        for i in 0..parts.len() {
            let key = format!("{}:{}", parts[..=i].join("/"), package);
            if i + 1 == parts.len() {
                self.insert_exact(record, &key, target);
            } else {
                self.insert(record, key, target);
            }
        }

        // host-like import paths
        for prefix in &self.domain_prefixes {
            if !import_path.starts_with(prefix.as_str()) {
                continue;
            }
            let parts: Vec<&str> = import_path.splitn(3, '/').collect();
            if parts.len() >= 3 {
                let domain_import = parts.join("/");
                self.insert(record, format!("{}:{}", domain_import, package), target);
                self.insert(record, domain_import, target);
                break;
            }
        }
    }

    fn insert_exact(&self, record: &mut ModuleRecord, key: &str, target: &str) {
        self.insert_entry(record, key.to_string(), target, true);
    }

    fn insert(&self, record: &mut ModuleRecord, key: String, target: &str) {
        self.insert_entry(record, key, target, false);
    }

    fn insert_entry(&self, record: &mut ModuleRecord, key: String, target: &str, exact: bool) {
        let existing_exact = record.exact.contains(&key);
        match record.imports.get(&key) {
            Some(existing) if existing == target => {}
            Some(existing) if existing_exact && !exact => {
                tracing::debug!(
                    "module {}: keeping exact {:?} -> {} over shorthand for {}",
                    record.label,
                    key,
                    existing,
                    target
                );
                return;
            }
            Some(existing) if exact && !existing_exact => {
                tracing::debug!(
                    "module {}: exact {:?} replaces shorthand {} with {}",
                    record.label,
                    key,
                    existing,
                    target
                );
                record.imports.insert(key.clone(), target.to_string());
            }
            Some(existing) => {
                tracing::warn!(
                    "module {}: import {:?} indexed as both {} and {}",
                    record.label,
                    key,
                    existing,
                    target
                );
                if self.collision == CollisionPolicy::LastWriterWins {
                    tracing::debug!("indexed {} -> {}", key, target);
                    record.imports.insert(key.clone(), target.to_string());
                }
            }
            None => {
                tracing::debug!("indexed {} -> {}", key, target);
                record.imports.insert(key.clone(), target.to_string());
            }
        }
        if exact {
            record.exact.insert(key);
        }
    }
}

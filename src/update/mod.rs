//! Whole-repository update: configure, generate, index and resolve.
//!
//! A run visits every directory under the root. Configuration flows top-down,
//! rules are generated children-first, and only after every directory has
//! been generated (and so every module registered and every instance indexed)
//! are imports resolved. The module index is therefore complete before the
//! first lookup.

pub mod discover;
pub mod report;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, ProjectConfig};
use crate::error::Result;
use crate::generate::{Aggregation, GenerateArgs, Generator};
use crate::pathutil;
use crate::resolve::{
    self, ImportResolver, ModuleIndex, ModuleSummary, RemoteCache, StaticRemoteCache,
};
use crate::rule::{BuildFile, Label, MemoryRuleIndex};
use crate::source::{CueHeaderParser, SourceParser};

pub use discover::{discover_directories, Directory};
pub use report::{DirectoryUpdate, ReportFormat, UpdateReport};

pub struct Updater {
    project: ProjectConfig,
    generator: Generator,
    modules: Arc<ModuleIndex>,
    resolver: ImportResolver,
}

impl Updater {
    /// Updater with the built-in parser and a remote cache built from the
    /// project's repository table.
    pub fn new(project: ProjectConfig) -> Self {
        let remote = StaticRemoteCache::new(project.repositories.clone())
            .with_local_prefix(&project.root_config().prefix);
        Self::with_parts(project, Arc::new(CueHeaderParser), Arc::new(remote))
    }

    pub fn with_parts(
        project: ProjectConfig,
        parser: Arc<dyn SourceParser>,
        remote: Arc<dyn RemoteCache>,
    ) -> Self {
        let modules = Arc::new(ModuleIndex::new(parser.clone(), &project.module_index));
        let resolver = ImportResolver::new(modules.clone(), remote);
        Self {
            project,
            generator: Generator::new(parser),
            modules,
            resolver,
        }
    }

    /// Loads `cuegraph.toml` from `root`, if present.
    pub fn for_root(root: &Path) -> Result<Self> {
        Ok(Self::new(ProjectConfig::load(root)?))
    }

    pub fn modules(&self) -> &Arc<ModuleIndex> {
        &self.modules
    }

    pub fn module_summaries(&self) -> Vec<ModuleSummary> {
        self.modules.summaries()
    }

    pub fn run(&self, root: &Path) -> Result<UpdateReport> {
        let directories = discover_directories(root)?;
        tracing::info!("scanning {} directories under {}", directories.len(), root.display());

        let mut updates = self.configure(&directories);

        // children before parents
        for (dir, update) in directories.iter().zip(updates.iter_mut()).rev() {
            let result = self.generator.generate(&GenerateArgs {
                dir: &dir.path,
                rel: &dir.rel,
                config: &update.config,
                regular_files: &dir.regular_files,
                gen_files: &[],
                existing: &update.existing,
            });
            update.gen = result.gen;
            update.empty = result.empty;
        }

        let index = self.index(root, &updates);

        for update in updates.iter_mut() {
            let DirectoryUpdate { rel, config, gen, .. } = update;
            for rule in gen.iter_mut() {
                let from = Label::new("", rel.as_str(), rule.name.as_str());
                self.resolver.resolve_rule(config, rule, &index, &from);
            }
        }

        let report = UpdateReport::new(root.to_path_buf(), updates);
        tracing::info!(
            "generated {} rules in {} directories, {} obsolete, {} modules",
            report.rule_count(),
            report.directories.len(),
            report.empty_count(),
            self.modules.summaries().len()
        );
        Ok(report)
    }

    /// Aggregation of the single directory `rel` under `root`, with the
    /// configuration it would get during a full run.
    pub fn inspect(&self, root: &Path, rel: &str) -> Result<Aggregation> {
        let rel = normalize_rel(rel);
        let config = self.config_for(root, &rel)?;
        let dir = if rel.is_empty() { root.to_path_buf() } else { root.join(&rel) };
        let regular_files = discover::list_files(&dir)?;

        Ok(self.generator.aggregate(&GenerateArgs {
            dir: &dir,
            rel: &rel,
            config: &config,
            regular_files: &regular_files,
            gen_files: &[],
            existing: &[],
        }))
    }

    fn root_config(&self) -> Config {
        self.project.root_config()
    }

    /// Computes every directory's configuration, parents first.
    fn configure(&self, directories: &[Directory]) -> Vec<DirectoryUpdate> {
        let mut configs: HashMap<String, Config> = HashMap::new();
        let root_config = self.root_config();

        directories
            .iter()
            .map(|dir| {
                let build_file = load_build_file(&dir.path);
                let directives = build_file
                    .as_ref()
                    .map(|b| b.directives.as_slice())
                    .unwrap_or(&[]);
                let parent = if dir.rel.is_empty() {
                    &root_config
                } else {
                    configs.get(&parent_rel(&dir.rel)).unwrap_or(&root_config)
                };
                let config = Config::for_directory(parent, &dir.rel, directives);
                configs.insert(dir.rel.clone(), config.clone());

                DirectoryUpdate {
                    rel: dir.rel.clone(),
                    config,
                    existing: build_file.map(|b| b.rules).unwrap_or_default(),
                    gen: Vec::new(),
                    empty: Vec::new(),
                }
            })
            .collect()
    }

    /// Indexes every generated rule and registers every discovered module.
    fn index(&self, root: &Path, updates: &[DirectoryUpdate]) -> MemoryRuleIndex {
        let mut index = MemoryRuleIndex::new();
        for update in updates {
            for rule in &update.gen {
                if let Some((label, dir)) = resolve::module_registration(rule, &update.rel, root) {
                    self.modules.register_module(&label, &dir);
                }
                if let Some(specs) = resolve::import_specs(&update.config, rule, &update.rel) {
                    for spec in specs {
                        index.add(spec, Label::new("", update.rel.as_str(), rule.name.as_str()));
                    }
                }
            }
        }
        tracing::debug!("rule index holds {} import specs", index.len());
        index
    }

    /// Configuration of `rel`, applying every build file from the root down.
    fn config_for(&self, root: &Path, rel: &str) -> Result<Config> {
        let mut config = self.root_config();
        let mut chain = vec![String::new()];
        let mut current = String::new();
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            current = pathutil::join(&[current.as_str(), segment]);
            chain.push(current.clone());
        }

        for dir_rel in chain {
            let path: PathBuf = if dir_rel.is_empty() {
                root.to_path_buf()
            } else {
                root.join(&dir_rel)
            };
            let directives = BuildFile::load(&path)?.map(|b| b.directives).unwrap_or_default();
            config = Config::for_directory(&config, &dir_rel, &directives);
        }
        Ok(config)
    }
}

fn load_build_file(dir: &Path) -> Option<BuildFile> {
    match BuildFile::load(dir) {
        Ok(build_file) => build_file,
        Err(e) => {
            tracing::warn!("reading build file in {}: {}", dir.display(), e);
            None
        }
    }
}

fn parent_rel(rel: &str) -> String {
    let parent = pathutil::dir(rel);
    if parent == "." {
        String::new()
    } else {
        parent
    }
}

fn normalize_rel(rel: &str) -> String {
    let cleaned = pathutil::clean(rel);
    if cleaned == "." {
        String::new()
    } else {
        cleaned.trim_start_matches('/').to_string()
    }
}

//! Project file (`cuegraph.toml`) at the repository root.
//!
//! ```toml
//! [[directive]]
//! key = "prefix"
//! value = "example.com"
//!
//! [[repository]]
//! prefix = "example.com"
//! name = "com_example"
//!
//! [module_index]
//! known_dirs = ["gen", "usr", "pkg"]
//! domain_prefixes = ["example.com/"]
//! collision = "last"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Config, Directive};
use crate::error::Result;

pub const PROJECT_FILENAME: &str = "cuegraph.toml";

/// Conventional subdirectories of a `cue.mod` root that hold importable packages.
pub const DEFAULT_KNOWN_DIRS: &[&str] = &["gen", "usr", "pkg"];

/// How the module index treats two packages claiming the same import string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The package indexed later replaces the earlier entry.
    #[default]
    #[serde(alias = "last")]
    LastWriterWins,
    /// The first entry is kept; later ones are only reported.
    #[serde(alias = "first")]
    FirstWriterWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleIndexOptions {
    pub known_dirs: Vec<String>,
    /// Additional host-like import prefixes, on top of the built-in ones.
    pub domain_prefixes: Vec<String>,
    pub collision: CollisionPolicy,
}

impl Default for ModuleIndexOptions {
    fn default() -> Self {
        Self {
            known_dirs: DEFAULT_KNOWN_DIRS.iter().map(|s| s.to_string()).collect(),
            domain_prefixes: Vec::new(),
            collision: CollisionPolicy::default(),
        }
    }
}

/// Maps an import-path prefix to the external repository that provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub prefix: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directives applied to the repository root before its build file's own.
    #[serde(rename = "directive")]
    pub directives: Vec<Directive>,
    #[serde(rename = "repository")]
    pub repositories: Vec<RepositoryEntry>,
    pub module_index: ModuleIndexOptions,
}

impl ProjectConfig {
    /// Loads `cuegraph.toml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PROJECT_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Configuration of the repository root before its build file is read.
    pub fn root_config(&self) -> Config {
        Config::for_directory(&Config::default(), "", &self.directives)
    }
}

//! Import-root lookup for imports that live outside the repository.

use crate::config::RepositoryEntry;
use crate::error::{CuegraphError, Result};
use crate::pathutil;

/// Maps an import path to the root prefix it falls under and the repository
/// providing it.
pub trait RemoteCache: Send + Sync {
    /// Returns `(root prefix, repository)` for `import_path`.
    fn root(&self, import_path: &str) -> Result<(String, String)>;
}

/// Remote cache backed by a fixed prefix table. The longest matching prefix wins.
#[derive(Debug, Clone, Default)]
pub struct StaticRemoteCache {
    entries: Vec<RepositoryEntry>,
}

impl StaticRemoteCache {
    pub fn new(entries: Vec<RepositoryEntry>) -> Self {
        Self { entries }
    }

    /// Adds the repository's own import prefix, resolving to the main repository.
    pub fn with_local_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() && !self.entries.iter().any(|e| e.prefix == prefix) {
            self.entries.push(RepositoryEntry {
                prefix: prefix.to_string(),
                name: String::new(),
            });
        }
        self
    }
}

impl RemoteCache for StaticRemoteCache {
    fn root(&self, import_path: &str) -> Result<(String, String)> {
        self.entries
            .iter()
            .filter(|e| pathutil::has_prefix(import_path, &e.prefix))
            .max_by_key(|e| e.prefix.len())
            .map(|e| (e.prefix.clone(), e.name.clone()))
            .ok_or_else(|| CuegraphError::RemoteLookup {
                import: import_path.to_string(),
                reason: "no known repository provides this import path".to_string(),
            })
    }
}

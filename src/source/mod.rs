//! Source files and their classification.
//!
//! The configuration-language parser is consumed through [`SourceParser`]:
//! all this crate needs from a file is its package name and its import list.
//! [`CueHeaderParser`] is the built-in implementation.

pub mod parser;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use parser::CueHeaderParser;

/// Extension of files this crate aggregates.
pub const SOURCE_EXTENSION: &str = ".cue";

/// What the parser reports about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceHeader {
    pub package: Option<String>,
    pub imports: Vec<String>,
}

/// Parses a source file's package clause and imports.
pub trait SourceParser: Send + Sync {
    fn parse_source(&self, path: &Path, source: &str) -> Result<SourceHeader>;

    fn parse_file(&self, path: &Path) -> Result<SourceHeader> {
        let source = std::fs::read_to_string(path)?;
        self.parse_source(path, &source)
    }
}

/// A parsed source file. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File name within its directory.
    pub name: String,
    /// Repository-relative directory.
    pub rel: String,
    /// Declared package; `None` for standalone files.
    pub package: Option<String>,
    pub imports: Vec<String>,
}

impl SourceFile {
    pub fn new(path: PathBuf, rel: impl Into<String>, header: SourceHeader) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path,
            name,
            rel: rel.into(),
            package: header.package.filter(|p| !p.is_empty()),
            imports: header.imports,
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.package.is_none()
    }
}

/// Source files of one directory, split by shape.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub standalone: Vec<&'a SourceFile>,
    /// Package name to the files declaring it, in filename order.
    pub packages: BTreeMap<String, Vec<&'a SourceFile>>,
}

/// Partitions files into standalone files and package groups.
pub fn classify<'a>(files: impl IntoIterator<Item = &'a SourceFile>) -> Classified<'a> {
    let mut out = Classified::default();
    for file in files {
        match &file.package {
            Some(pkg) => out.packages.entry(pkg.clone()).or_default().push(file),
            None => out.standalone.push(file),
        }
    }
    out
}

/// Parses every source file among `names` in `dir`, in parallel.
///
/// Files that fail to parse are logged and left out. The result is keyed by
/// file name so iteration order does not depend on scheduling.
pub fn parse_directory(
    parser: &Arc<dyn SourceParser>,
    dir: &Path,
    rel: &str,
    names: &[String],
) -> BTreeMap<String, SourceFile> {
    names
        .par_iter()
        .filter(|name| name.ends_with(SOURCE_EXTENSION))
        .filter_map(|name| {
            let path = dir.join(name);
            match parser.parse_file(&path) {
                Ok(header) => Some((name.clone(), SourceFile::new(path, rel, header))),
                Err(e) => {
                    tracing::warn!("parsing source file: path={}, err={}", path.display(), e);
                    None
                }
            }
        })
        .collect()
}

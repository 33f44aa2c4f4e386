use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use indexmap::IndexMap;

use crate::error::Result;

/// Prefix of build-output symlinks at a repository root.
const OUTPUT_DIR_PREFIX: &str = "bazel-";

/// A directory to visit, with the regular files directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub path: PathBuf,
    /// Slash-separated path relative to the root; `""` for the root itself.
    pub rel: String,
    /// File names, sorted.
    pub regular_files: Vec<String>,
}

/// Lists the directories under `root` in pre-order (parents before
/// children, siblings by name). Ignore files and hidden entries are honored.
/// Unreadable entries are logged and skipped.
pub fn discover_directories(root: &Path) -> Result<Vec<Directory>> {
    if !root.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        )
        .into());
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            !(entry.depth() == 1
                && entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
                && entry.file_name().to_string_lossy().starts_with(OUTPUT_DIR_PREFIX))
        })
        .build();

    let mut dirs: IndexMap<PathBuf, Directory> = IndexMap::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("walking {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if is_dir {
            dirs.insert(
                path.to_path_buf(),
                Directory {
                    path: path.to_path_buf(),
                    rel: rel_of(root, path),
                    regular_files: Vec::new(),
                },
            );
        } else if let Some(parent) = path.parent().and_then(|p| dirs.get_mut(p)) {
            parent
                .regular_files
                .push(entry.file_name().to_string_lossy().to_string());
        }
    }

    Ok(dirs
        .into_values()
        .map(|mut dir| {
            dir.regular_files.sort();
            dir
        })
        .collect())
}

/// Regular files directly inside `dir`, sorted by name.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

fn rel_of(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_pre_order_with_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "root.cue");
        create_file(temp_dir.path(), "b/y.cue");
        create_file(temp_dir.path(), "a/z.cue");
        create_file(temp_dir.path(), "a/x.cue");
        create_file(temp_dir.path(), "a/deep/w.cue");

        let dirs = discover_directories(temp_dir.path()).unwrap();
        let rels: Vec<&str> = dirs.iter().map(|d| d.rel.as_str()).collect();
        assert_eq!(rels, vec!["", "a", "a/deep", "b"]);
        assert_eq!(dirs[0].regular_files, vec!["root.cue"]);
        assert_eq!(dirs[1].regular_files, vec!["x.cue", "z.cue"]);
    }

    #[test]
    fn test_skips_hidden_and_output_dirs() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), ".cache/a.cue");
        create_file(temp_dir.path(), "bazel-out/gen.cue");
        create_file(temp_dir.path(), "src/bazel-like/ok.cue");

        let dirs = discover_directories(temp_dir.path()).unwrap();
        let rels: Vec<&str> = dirs.iter().map(|d| d.rel.as_str()).collect();
        assert_eq!(rels, vec!["", "src", "src/bazel-like"]);
    }

    #[test]
    fn test_missing_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_directories(&temp_dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_list_files_skips_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "b.cue");
        create_file(temp_dir.path(), "a.cue");
        create_file(temp_dir.path(), "sub/c.cue");

        assert_eq!(list_files(temp_dir.path()).unwrap(), vec!["a.cue", "b.cue"]);
    }
}

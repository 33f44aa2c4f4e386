//! Per-directory configuration.
//!
//! A [`Config`] is computed for every directory by cloning the parent's
//! configuration and applying the directives found in the directory's
//! existing build file. The repository root starts from the defaults in
//! the project file (see [`project`]).

pub mod project;

use serde::{Deserialize, Serialize};

use crate::error::{CuegraphError, Result};
use crate::pathutil;

pub use project::{CollisionPolicy, ModuleIndexOptions, ProjectConfig, RepositoryEntry};

/// Default export format for exported artifacts.
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";

/// Directive keys understood by [`Config::apply_directives`].
pub const KNOWN_DIRECTIVES: &[&str] = &[
    "prefix",
    "cue_test_golden_suffix",
    "cue_test_golden_filename",
    "cue_gen_exported_instance",
    "cue_gen_exported_files",
    "cue_gen_consolidated_instance",
    "cue_output_format",
];

/// A `# gazelle:<key> <value>` line from a build file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub key: String,
    pub value: String,
}

impl Directive {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Configuration bundle in effect for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base import path for the subtree rooted at `prefix_rel`.
    pub prefix: String,
    /// Repository-relative directory where `prefix` was set.
    pub prefix_rel: String,
    /// Golden files are discovered by this filename suffix when non-empty.
    pub golden_suffix: String,
    /// Exact golden filename; implies exported instances.
    pub golden_filename: String,
    pub gen_exported_instance: bool,
    pub gen_exported_files: bool,
    pub gen_consolidated_instance: bool,
    pub output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            prefix_rel: String::new(),
            golden_suffix: String::new(),
            golden_filename: String::new(),
            gen_exported_instance: false,
            gen_exported_files: false,
            gen_consolidated_instance: true,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// Derives the configuration of directory `rel` from its parent's.
    pub fn for_directory(parent: &Config, rel: &str, directives: &[Directive]) -> Self {
        let mut conf = parent.clone();

        // vendored trees start their own import namespace
        if pathutil::base(rel) == "vendor" {
            conf.prefix.clear();
            conf.prefix_rel = rel.to_string();
        }

        conf.apply_directives(rel, directives);
        conf
    }

    /// Applies directives in order. An invalid directive is logged and skipped,
    /// leaving the previous value in place.
    pub fn apply_directives(&mut self, rel: &str, directives: &[Directive]) {
        for d in directives {
            match d.key.as_str() {
                "prefix" => {
                    if let Err(e) = check_prefix(&d.value) {
                        tracing::warn!("{}: {}", if rel.is_empty() { "." } else { rel }, e);
                        continue;
                    }
                    self.prefix = d.value.clone();
                    self.prefix_rel = rel.to_string();
                }
                "cue_test_golden_suffix" => {
                    self.golden_suffix = d.value.clone();
                    // golden tests compare against an exported instance
                    self.gen_exported_instance = true;
                }
                "cue_test_golden_filename" => {
                    self.gen_exported_instance = true;
                    self.golden_filename = d.value.clone();
                    self.golden_suffix =
                        pathutil::ext(&d.value).trim_start_matches('.').to_string();
                }
                "cue_gen_exported_instance" => self.gen_exported_instance = true,
                "cue_gen_exported_files" => self.gen_exported_files = true,
                "cue_gen_consolidated_instance" => match parse_bool(&d.value) {
                    Some(enabled) => self.gen_consolidated_instance = enabled,
                    None => tracing::warn!(
                        "{}: invalid value for {}: {:?}",
                        if rel.is_empty() { "." } else { rel },
                        d.key,
                        d.value
                    ),
                },
                "cue_output_format" => self.output_format = d.value.clone(),
                key if key.starts_with("cue_") && !KNOWN_DIRECTIVES.contains(&key) => {
                    tracing::warn!(
                        "{}: unknown directive {}",
                        if rel.is_empty() { "." } else { rel },
                        key
                    );
                }
                _ => {}
            }
        }
    }

    /// Whether golden-file discovery is configured.
    pub fn golden_enabled(&self) -> bool {
        !self.golden_suffix.is_empty() || !self.golden_filename.is_empty()
    }
}

/// Rejects prefixes that are absolute or local (relative) import paths.
/// The empty prefix is allowed.
pub fn check_prefix(prefix: &str) -> Result<()> {
    if prefix.starts_with('/') || is_local_import(prefix) {
        return Err(CuegraphError::Config(format!("invalid prefix: {:?}", prefix)));
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "" | "true" | "on" | "1" => Some(true),
        "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn is_local_import(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_format_is_json() {
        assert_eq!(Config::default().output_format, "json");
    }

    #[test]
    fn test_prefix_directive_sets_prefix_rel() {
        let conf = Config::for_directory(
            &Config::default(),
            "configs",
            &[Directive::new("prefix", "example.com/configs")],
        );
        assert_eq!(conf.prefix, "example.com/configs");
        assert_eq!(conf.prefix_rel, "configs");
    }

    #[test]
    fn test_invalid_prefix_keeps_previous_value() {
        let mut parent = Config::default();
        parent.prefix = "example.com".to_string();

        let conf = Config::for_directory(
            &parent,
            "sub",
            &[
                Directive::new("prefix", "./relative"),
                Directive::new("cue_output_format", "yaml"),
            ],
        );
        assert_eq!(conf.prefix, "example.com");
        assert_eq!(conf.prefix_rel, "");
        // later directives still apply
        assert_eq!(conf.output_format, "yaml");
    }

    #[test]
    fn test_check_prefix() {
        assert!(check_prefix("").is_ok());
        assert!(check_prefix("example.com/x").is_ok());
        assert!(check_prefix("/abs").is_err());
        assert!(check_prefix("..").is_err());
        assert!(check_prefix("../up").is_err());
    }

    #[test]
    fn test_golden_filename_derives_suffix() {
        let conf = Config::for_directory(
            &Config::default(),
            "",
            &[Directive::new("cue_test_golden_filename", "main.gen.yaml")],
        );
        assert_eq!(conf.golden_suffix, "yaml");
        assert_eq!(conf.golden_filename, "main.gen.yaml");
        assert!(conf.gen_exported_instance);
    }

    #[test]
    fn test_golden_suffix_enables_exported_instance() {
        let conf = Config::for_directory(
            &Config::default(),
            "",
            &[Directive::new("cue_test_golden_suffix", "-gen.json")],
        );
        assert!(conf.gen_exported_instance);
        assert!(conf.golden_enabled());
    }

    #[test]
    fn test_consolidation_toggle() {
        assert!(Config::default().gen_consolidated_instance);

        let off = Config::for_directory(
            &Config::default(),
            "",
            &[Directive::new("cue_gen_consolidated_instance", "false")],
        );
        assert!(!off.gen_consolidated_instance);

        let bogus = Config::for_directory(
            &off,
            "a",
            &[Directive::new("cue_gen_consolidated_instance", "maybe")],
        );
        assert!(!bogus.gen_consolidated_instance);
    }

    #[test]
    fn test_vendor_resets_prefix() {
        let mut parent = Config::default();
        parent.prefix = "example.com".to_string();
        let conf = Config::for_directory(&parent, "third_party/vendor", &[]);
        assert_eq!(conf.prefix, "");
        assert_eq!(conf.prefix_rel, "third_party/vendor");
    }

    #[test]
    fn test_child_inherits_parent() {
        let parent = Config::for_directory(
            &Config::default(),
            "",
            &[Directive::new("cue_output_format", "text")],
        );
        let child = Config::for_directory(&parent, "a/b", &[]);
        assert_eq!(child.output_format, "text");
    }
}

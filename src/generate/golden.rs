//! Golden-file discovery.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::rule::{Rule, RuleKind};
use crate::target;

/// A checked-in expected output a test compares an export against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoldenFile {
    pub name: String,
    pub path: PathBuf,
}

impl GoldenFile {
    pub fn rule_name(&self) -> String {
        target::golden_rule_name(&self.name)
    }

    /// Fixture rule exposing the file to tests.
    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(RuleKind::CueGenGolden, self.rule_name());
        rule.set_attr("srcs", vec![self.name.clone()]);
        rule
    }

    /// Whether the file's extension is the given output format.
    pub fn matches_format(&self, output_format: &str) -> bool {
        self.name.ends_with(&format!(".{}", output_format))
    }
}

/// Finds the golden file of a directory.
///
/// A directory holds at most one golden file. With an exact golden filename
/// configured only that name qualifies; otherwise any regular file ending in
/// the golden suffix does, and the last one in name order wins.
pub fn discover_golden(
    config: &Config,
    dir: &Path,
    regular_files: &[String],
) -> Option<GoldenFile> {
    if !config.golden_enabled() {
        return None;
    }

    let mut names: Vec<&String> = regular_files.iter().collect();
    names.sort();

    let found = if !config.golden_filename.is_empty() {
        names.into_iter().rfind(|name| **name == config.golden_filename)
    } else {
        names.into_iter().rfind(|name| name.ends_with(config.golden_suffix.as_str()))
    };

    found.map(|name| GoldenFile {
        name: name.clone(),
        path: dir.join(name),
    })
}

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::error::{CuegraphError, Result};
use crate::rule::{AttrValue, ExistingRule, Rule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
            ReportFormat::Yaml => "yaml",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "yaml" | "yml" => Some(ReportFormat::Yaml),
            _ => None,
        }
    }
}

/// Outcome of one directory pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryUpdate {
    pub rel: String,
    #[serde(skip)]
    pub config: Config,
    #[serde(skip)]
    pub existing: Vec<ExistingRule>,
    pub gen: Vec<Rule>,
    pub empty: Vec<ExistingRule>,
}

impl DirectoryUpdate {
    pub fn is_unchanged(&self) -> bool {
        self.gen.is_empty() && self.empty.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub root: PathBuf,
    /// Directories with generated or obsolete rules, in traversal order.
    pub directories: Vec<DirectoryUpdate>,
}

impl UpdateReport {
    pub fn new(root: PathBuf, updates: Vec<DirectoryUpdate>) -> Self {
        Self {
            root,
            directories: updates.into_iter().filter(|u| !u.is_unchanged()).collect(),
        }
    }

    pub fn directory(&self, rel: &str) -> Option<&DirectoryUpdate> {
        self.directories.iter().find(|d| d.rel == rel)
    }

    pub fn rule_count(&self) -> usize {
        self.directories.iter().map(|d| d.gen.len()).sum()
    }

    pub fn empty_count(&self) -> usize {
        self.directories.iter().map(|d| d.empty.len()).sum()
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ReportFormat::Yaml => Ok(serde_yaml::to_string(self)?),
            ReportFormat::Text => self.render_text(),
        }
    }

    fn render_text(&self) -> Result<String> {
        let mut out = String::new();
        for dir in &self.directories {
            let rel = if dir.rel.is_empty() { "." } else { dir.rel.as_str() };
            writeln!(out, "{}", rel).map_err(fmt_error)?;
            for rule in &dir.gen {
                writeln!(out, "  + {} {}", rule.kind, rule.name).map_err(fmt_error)?;
                for (key, value) in &rule.attrs {
                    writeln!(out, "      {} = {}", key, render_value(value)).map_err(fmt_error)?;
                }
            }
            for rule in &dir.empty {
                writeln!(out, "  - {} {}", rule.kind, rule.name).map_err(fmt_error)?;
            }
        }
        writeln!(
            out,
            "{} rules in {} directories, {} obsolete",
            self.rule_count(),
            self.directories.len(),
            self.empty_count()
        )
        .map_err(fmt_error)?;
        Ok(out)
    }
}

fn render_value(value: &AttrValue) -> String {
    match value {
        AttrValue::Str(s) => format!("{:?}", s),
        AttrValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        AttrValue::List(items) => {
            let quoted: Vec<String> = items.iter().map(|s| format!("{:?}", s)).collect();
            format!("[{}]", quoted.join(", "))
        }
    }
}

fn fmt_error(e: std::fmt::Error) -> CuegraphError {
    CuegraphError::Serialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleKind;

    fn sample() -> UpdateReport {
        let mut rule = Rule::new(RuleKind::CueInstance, "p_instance");
        rule.set_attr("srcs", vec!["a.cue".to_string()]);
        rule.set_attr("package_name", "p");

        UpdateReport::new(
            PathBuf::from("/repo"),
            vec![
                DirectoryUpdate {
                    rel: "app".to_string(),
                    config: Config::default(),
                    existing: Vec::new(),
                    gen: vec![rule],
                    empty: vec![ExistingRule::new("cue_library", "old")],
                },
                DirectoryUpdate {
                    rel: "docs".to_string(),
                    config: Config::default(),
                    existing: Vec::new(),
                    gen: Vec::new(),
                    empty: Vec::new(),
                },
            ],
        )
    }

    #[test]
    fn test_unchanged_directories_are_dropped() {
        let report = sample();
        assert_eq!(report.directories.len(), 1);
        assert!(report.directory("docs").is_none());
        assert_eq!(report.rule_count(), 1);
        assert_eq!(report.empty_count(), 1);
    }

    #[test]
    fn test_render_text() {
        let text = sample().render(ReportFormat::Text).unwrap();
        assert!(text.contains("app\n  + cue_instance p_instance\n"));
        assert!(text.contains("      srcs = [\"a.cue\"]\n"));
        assert!(text.contains("  - cue_library old\n"));
        assert!(text.ends_with("1 rules in 1 directories, 1 obsolete\n"));
    }

    #[test]
    fn test_render_json() {
        let json = sample().render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["directories"][0]["rel"], "app");
        assert_eq!(value["directories"][0]["gen"][0]["kind"], "cue_instance");
        assert_eq!(value["directories"][0]["gen"][0]["attrs"]["package_name"], "p");
        assert!(value["directories"][0].get("config").is_none());
    }

    #[test]
    fn test_render_yaml() {
        let yaml = sample().render(ReportFormat::Yaml).unwrap();
        assert!(yaml.contains("rel: app"));
        assert!(yaml.contains("kind: cue_instance"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("yml"), Some(ReportFormat::Yaml));
        assert_eq!(ReportFormat::from_str("xml"), None);
    }
}

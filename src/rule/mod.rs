//! Build-graph rule objects.
//!
//! The host build graph is an external collaborator; this module models only
//! what crosses the boundary: a rule (kind, name, attributes, unresolved
//! imports), labels addressing rules, and import specs under which a rule can
//! be found by other directories.

pub mod build_file;
pub mod index;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use build_file::{BuildFile, ExistingRule};
pub use index::{MemoryRuleIndex, RuleIndex};

/// Language tag used in import specs.
pub const LANG: &str = "cue";

/// Rule kinds this crate generates or manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    CueInstance,
    CueExportedInstance,
    CueExportedStandaloneFiles,
    CueExportedFiles,
    CueConsolidatedInstance,
    CueTest,
    CueGenGolden,
    CueModule,
    /// Deprecated; always removed from existing build files.
    CueLibrary,
    /// Deprecated; always removed from existing build files.
    CueExport,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::CueInstance => "cue_instance",
            RuleKind::CueExportedInstance => "cue_exported_instance",
            RuleKind::CueExportedStandaloneFiles => "cue_exported_standalone_files",
            RuleKind::CueExportedFiles => "cue_exported_files",
            RuleKind::CueConsolidatedInstance => "cue_consolidated_instance",
            RuleKind::CueTest => "cue_test",
            RuleKind::CueGenGolden => "cue_gen_golden",
            RuleKind::CueModule => "cue_module",
            RuleKind::CueLibrary => "cue_library",
            RuleKind::CueExport => "cue_export",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cue_instance" => Some(RuleKind::CueInstance),
            "cue_exported_instance" => Some(RuleKind::CueExportedInstance),
            "cue_exported_standalone_files" => Some(RuleKind::CueExportedStandaloneFiles),
            "cue_exported_files" => Some(RuleKind::CueExportedFiles),
            "cue_consolidated_instance" => Some(RuleKind::CueConsolidatedInstance),
            "cue_test" => Some(RuleKind::CueTest),
            "cue_gen_golden" => Some(RuleKind::CueGenGolden),
            "cue_module" => Some(RuleKind::CueModule),
            "cue_library" => Some(RuleKind::CueLibrary),
            "cue_export" => Some(RuleKind::CueExport),
            _ => None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, RuleKind::CueLibrary | RuleKind::CueExport)
    }

    /// Kinds whose dependencies are instance-shaped and can therefore take
    /// heuristically synthesized instance targets.
    pub fn consumes_instances(&self) -> bool {
        matches!(
            self,
            RuleKind::CueInstance
                | RuleKind::CueExportedInstance
                | RuleKind::CueExportedStandaloneFiles
                | RuleKind::CueExportedFiles
                | RuleKind::CueConsolidatedInstance
        )
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute values a generated rule can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Str(String),
    List(Vec<String>),
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::List(v)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// A generated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub kind: RuleKind,
    pub name: String,
    pub attrs: BTreeMap<String, AttrValue>,
    /// Unresolved import strings; consumed by resolution, never serialized
    /// into the build file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>,
}

impl Rule {
    pub fn new(kind: RuleKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attrs: BTreeMap::new(),
            imports: None,
        }
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn del_attr(&mut self, key: &str) {
        self.attrs.remove(key);
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// String attribute, or `""` when absent or not a string.
    pub fn attr_string(&self, key: &str) -> &str {
        match self.attrs.get(key) {
            Some(AttrValue::Str(s)) => s,
            _ => "",
        }
    }

    pub fn attr_list(&self, key: &str) -> &[String] {
        match self.attrs.get(key) {
            Some(AttrValue::List(v)) => v,
            _ => &[],
        }
    }

    pub fn set_imports(&mut self, imports: Vec<String>) {
        self.imports = Some(imports);
    }
}

/// Address of a rule in the build graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Label {
    pub repo: String,
    pub pkg: String,
    pub name: String,
}

impl Label {
    pub fn new(repo: impl Into<String>, pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            pkg: pkg.into(),
            name: name.into(),
        }
    }

    /// Renders the label as seen from `from_repo`/`from_pkg`: `:name` within
    /// the same package, `//pkg:name` within the same repository.
    pub fn rel_string(&self, from_repo: &str, from_pkg: &str) -> String {
        if self.repo == from_repo && self.pkg == from_pkg {
            format!(":{}", self.name)
        } else if self.repo == from_repo {
            format!("//{}:{}", self.pkg, self.name)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}//{}:{}", self.repo, self.pkg, self.name)
    }
}

/// A (language, import string) pair under which a rule is indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportSpec {
    pub lang: String,
    pub imp: String,
}

impl ImportSpec {
    pub fn new(imp: impl Into<String>) -> Self {
        Self {
            lang: LANG.to_string(),
            imp: imp.into(),
        }
    }
}

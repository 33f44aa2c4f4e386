//! Reader for a directory's existing build description.
//!
//! Only two things are extracted: configuration directives
//! (`# gazelle:<key> <value>` comment lines) and the kind and name of every
//! top-level rule call. Attribute values are not interpreted.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Directive;
use crate::error::Result;

/// Build file names, in lookup order.
pub const BUILD_FILE_NAMES: &[&str] = &["BUILD.bazel", "BUILD"];

static DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#\s*gazelle:(\S+)\s*(.*?)\s*$").expect("valid regex"));

static RULE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid regex"));

static NAME_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bname\s*=\s*"([^"]*)""#).expect("valid regex"));

/// A rule already declared in a build file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExistingRule {
    pub kind: String,
    pub name: String,
}

impl ExistingRule {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFile {
    pub path: PathBuf,
    pub directives: Vec<Directive>,
    pub rules: Vec<ExistingRule>,
}

impl BuildFile {
    /// Reads the build file of `dir`, if it has one.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        for name in BUILD_FILE_NAMES {
            let path = dir.join(name);
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                return Ok(Some(Self::parse(path, &content)));
            }
        }
        Ok(None)
    }

    pub fn parse(path: PathBuf, content: &str) -> Self {
        let directives = content
            .lines()
            .filter_map(|line| DIRECTIVE.captures(line))
            .map(|caps| Directive::new(&caps[1], &caps[2]))
            .collect();

        let mut rules = Vec::new();
        for caps in RULE_CALL.captures_iter(content) {
            let kind = &caps[1];
            if kind == "load" || kind == "package" {
                continue;
            }
            let body_start = caps.get(0).map(|m| m.end()).unwrap_or(0);
            let body = call_body(&content[body_start..]);
            if let Some(name) = NAME_ATTR.captures(body) {
                rules.push(ExistingRule::new(kind, &name[1]));
            }
        }

        Self {
            path,
            directives,
            rules,
        }
    }
}

/// Text up to the parenthesis closing the call whose `(` was just consumed.
fn call_body(text: &str) -> &str {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut prev = '\0';
    for (i, c) in text.char_indices() {
        if in_string {
            if c == '"' && prev != '\\' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return &text[..i];
                    }
                }
                _ => {}
            }
        }
        prev = c;
    }
    text
}

//! Import specs under which generated rules are indexed, and module
//! discovery from generated `cue_module` rules.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::pathutil;
use crate::rule::{ImportSpec, Rule, RuleKind};

/// Import specs other directories can use to reach `rule`, which lives in
/// directory `rel`.
///
/// Returns `None` when the rule is not importable: only instances with a
/// package name are. An instance whose package name differs from its
/// directory's base name is indexed under both `path:pkg` and `path`.
pub fn import_specs(config: &Config, rule: &Rule, rel: &str) -> Option<Vec<ImportSpec>> {
    if rule.kind != RuleKind::CueInstance {
        return None;
    }
    let package = rule.attr_string("package_name");
    if package.is_empty() {
        return None;
    }

    let import_path = instance_import_path(config, rel, package);
    let mut specs = vec![ImportSpec::new(import_path.clone())];
    if let Some(idx) = import_path.rfind(':') {
        specs.push(ImportSpec::new(&import_path[..idx]));
    }
    Some(specs)
}

/// The import string that names package `package` in directory `rel`.
pub fn instance_import_path(config: &Config, rel: &str, package: &str) -> String {
    if config.prefix.is_empty() {
        if package == pathutil::base(rel) {
            return rel.to_string();
        }
        return format!("{}:{}", rel, package);
    }

    let relative = if rel.starts_with(config.prefix_rel.as_str()) {
        rel[config.prefix_rel.len()..].trim_start_matches('/')
    } else {
        rel
    };
    let joined = pathutil::join(&[config.prefix.as_str(), relative]);
    if package == pathutil::base(relative) {
        joined
    } else {
        format!("{}:{}", joined, package)
    }
}

/// For a `cue_module` rule generated in `rel`, the module label and the
/// directory to register in the module index.
pub fn module_registration(rule: &Rule, rel: &str, root: &Path) -> Option<(String, PathBuf)> {
    if rule.kind != RuleKind::CueModule || rel.is_empty() {
        return None;
    }
    let label = format!("//{}:{}", rel, rule.name);
    Some((label, root.join(rel)))
}

//! Ancestor resolution: which enclosing instance a nested instance is scoped under.

use crate::config::Config;
use crate::pathutil;
use crate::rule::{ImportSpec, Label, Rule, RuleIndex, RuleKind};
use crate::target::MODULE_DIR_NAME;

/// Import path used to look for an ancestor of the directory `pkg`.
///
/// Empty once the walk reaches module-root territory.
pub fn label_pkg_to_import_path(config: &Config, pkg: &str) -> String {
    if pkg.contains(MODULE_DIR_NAME) {
        return String::new();
    }

    let prefix_rel = config.prefix_rel.as_str();
    if pkg == prefix_rel {
        return pathutil::join(&[config.prefix.as_str(), pathutil::base(pkg).as_str()]);
    }

    if let Some(relative) = pkg.strip_prefix(prefix_rel).and_then(|r| r.strip_prefix('/')) {
        return pathutil::join(&[config.prefix.as_str(), pathutil::dir(relative).as_str()]);
    }

    pathutil::dir(pkg)
}

/// Walks up from `from`'s directory looking for a same-named instance indexed
/// under the directory's import path. On a hit the rule's `ancestor` attribute
/// is replaced and `true` returned; otherwise the attribute is left alone.
pub fn resolve_ancestor(
    config: &Config,
    rule: &mut Rule,
    index: &dyn RuleIndex,
    from: &Label,
) -> bool {
    if rule.kind != RuleKind::CueInstance {
        return false;
    }

    let mut current = from.pkg.clone();
    loop {
        let import_path = label_pkg_to_import_path(config, &current);
        if import_path.is_empty() {
            break;
        }

        let found = index
            .find_rules_by_import(&ImportSpec::new(import_path.as_str()))
            .into_iter()
            .find(|label| label.name == from.name && label != from);
        if let Some(ancestor) = found {
            let value = ancestor.rel_string(&from.repo, "");
            tracing::debug!("ancestor of {} is {}", from, value);
            rule.set_attr("ancestor", value);
            return true;
        }

        let parent = pathutil::dir(&current);
        if parent == current {
            break;
        }
        current = parent;
    }
    false
}

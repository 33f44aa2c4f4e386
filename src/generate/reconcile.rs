//! Which previously declared rules a directory pass makes obsolete.

use std::collections::HashSet;

use crate::rule::{ExistingRule, Rule, RuleKind};

/// How an existing rule of a managed kind is judged against a fresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    /// Always obsolete.
    Deprecated,
    /// Obsolete when the pass did not produce it.
    Owned,
    /// Obsolete when the pass produced rules of the same group, but not this one.
    /// A pass that produced none of the group leaves such rules alone.
    Group(Group),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Group {
    Consolidated,
    Exported,
    ExportedFiles,
}

fn policy(kind: RuleKind) -> Policy {
    match kind {
        RuleKind::CueLibrary | RuleKind::CueExport => Policy::Deprecated,
        RuleKind::CueInstance
        | RuleKind::CueTest
        | RuleKind::CueGenGolden
        | RuleKind::CueModule => Policy::Owned,
        RuleKind::CueConsolidatedInstance => Policy::Group(Group::Consolidated),
        RuleKind::CueExportedInstance | RuleKind::CueExportedStandaloneFiles => {
            Policy::Group(Group::Exported)
        }
        RuleKind::CueExportedFiles => Policy::Group(Group::ExportedFiles),
    }
}

/// Returns the existing rules to delete, in their declaration order.
///
/// Depends only on the kinds and names of `existing` and `generated`.
/// Rules of kinds this crate does not manage are never deleted.
pub fn reconcile(existing: &[ExistingRule], generated: &[Rule]) -> Vec<ExistingRule> {
    let generated_names: HashSet<(RuleKind, &str)> =
        generated.iter().map(|r| (r.kind, r.name.as_str())).collect();
    let generated_groups: HashSet<Group> = generated
        .iter()
        .filter_map(|r| match policy(r.kind) {
            Policy::Group(group) => Some(group),
            _ => None,
        })
        .collect();

    existing
        .iter()
        .filter(|rule| {
            let Some(kind) = RuleKind::from_str(&rule.kind) else {
                return false;
            };
            let produced = generated_names.contains(&(kind, rule.name.as_str()));
            match policy(kind) {
                Policy::Deprecated => true,
                Policy::Owned => !produced,
                Policy::Group(group) => generated_groups.contains(&group) && !produced,
            }
        })
        .cloned()
        .collect()
}

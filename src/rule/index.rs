//! Reverse import index of the build graph: import spec to the rules that
//! can be imported under it.

use std::collections::HashMap;

use super::{ImportSpec, Label};

/// Lookup side of the external rule index.
pub trait RuleIndex: Send + Sync {
    /// All rules indexed under `spec`, in indexing order.
    fn find_rules_by_import(&self, spec: &ImportSpec) -> Vec<Label>;
}

/// In-memory rule index filled while generated rules are indexed.
#[derive(Debug, Default)]
pub struct MemoryRuleIndex {
    by_import: HashMap<ImportSpec, Vec<Label>>,
}

impl MemoryRuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `label` can be imported as `spec`. Re-adding a pair is a no-op.
    pub fn add(&mut self, spec: ImportSpec, label: Label) {
        let labels = self.by_import.entry(spec).or_default();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    pub fn len(&self) -> usize {
        self.by_import.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_import.is_empty()
    }
}

impl RuleIndex for MemoryRuleIndex {
    fn find_rules_by_import(&self, spec: &ImportSpec) -> Vec<Label> {
        self.by_import.get(spec).cloned().unwrap_or_default()
    }
}

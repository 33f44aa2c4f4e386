//! Import resolution.
//!
//! Every import of a generated rule is turned into zero or more dependency
//! targets by an ordered chain of [`ResolveStrategy`] implementations:
//!
//! 1. the [`ModuleIndex`] of packages vendored under `cue.mod` roots,
//! 2. the build graph's reverse import index,
//! 3. a path heuristic backed by a [`RemoteCache`].
//!
//! The first strategy that matches wins. Imports nobody matches are dropped.
//! Standard-library imports never reach the chain.

pub mod ancestor;
pub mod imports;
pub mod module_index;
pub mod remote;
pub mod stdlib;
pub mod strategy;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::Config;
use crate::rule::{Label, Rule, RuleIndex, RuleKind};

pub use ancestor::{label_pkg_to_import_path, resolve_ancestor};
pub use imports::{import_specs, instance_import_path, module_registration};
pub use module_index::{ModuleIndex, ModuleRecord, ModuleSummary};
pub use remote::{RemoteCache, StaticRemoteCache};
pub use stdlib::is_stdlib;
pub use strategy::{
    ModuleIndexStrategy, PathHeuristicStrategy, Resolution, ResolveContext, ResolveStrategy,
    RuleIndexStrategy,
};

/// Attribute receiving the resolved dependency list.
pub const DEPS_ATTR: &str = "deps";

pub struct ImportResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ImportResolver {
    /// The standard three-stage chain.
    pub fn new(modules: Arc<ModuleIndex>, remote: Arc<dyn RemoteCache>) -> Self {
        Self::with_strategies(vec![
            Box::new(ModuleIndexStrategy::new(modules)),
            Box::new(RuleIndexStrategy),
            Box::new(PathHeuristicStrategy::new(remote)),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolves one import string. An empty result means the import was dropped.
    pub fn resolve_import(&self, import: &str, ctx: &ResolveContext<'_>) -> Vec<String> {
        if is_stdlib(import) {
            return Vec::new();
        }

        for strategy in &self.strategies {
            if let Resolution::Matched(targets) = strategy.resolve(import, ctx) {
                tracing::debug!(
                    "resolved {} for {} via {}: {:?}",
                    import,
                    ctx.from,
                    strategy.name(),
                    targets
                );
                return targets;
            }
        }
        Vec::new()
    }

    /// Resolves the pending imports of `rule` generated at `from` into its
    /// `deps` attribute, then resolves its ancestor.
    ///
    /// Rules without pending imports are left untouched. The dependency list
    /// is deduplicated and sorted; an empty list leaves no `deps` attribute.
    pub fn resolve_rule(
        &self,
        config: &Config,
        rule: &mut Rule,
        index: &dyn RuleIndex,
        from: &Label,
    ) {
        let imports = match rule.imports.take() {
            Some(imports) => imports,
            None => return,
        };
        rule.del_attr(DEPS_ATTR);

        let module = module_hint(rule).map(str::to_string);
        let ctx = ResolveContext {
            rule_index: index,
            kind: rule.kind,
            module: module.as_deref(),
            from,
        };

        let deps: BTreeSet<String> = imports
            .iter()
            .flat_map(|imp| self.resolve_import(imp, &ctx))
            .collect();
        if !deps.is_empty() {
            rule.set_attr(DEPS_ATTR, deps.into_iter().collect::<Vec<_>>());
        }

        resolve_ancestor(config, rule, index, from);
    }
}

/// The owning module recorded on a rule at generation time.
fn module_hint(rule: &Rule) -> Option<&str> {
    let value = match rule.kind {
        RuleKind::CueInstance => rule.attr_string("ancestor"),
        RuleKind::CueExportedFiles => rule.attr_string("module"),
        _ => "",
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

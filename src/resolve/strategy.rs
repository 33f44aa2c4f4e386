//! Import resolution strategies.
//!
//! Each strategy either matches an import string to one or more dependency
//! targets or declines. [`super::ImportResolver`] tries them in order and
//! stops at the first match.

use std::sync::Arc;

use super::module_index::ModuleIndex;
use super::remote::RemoteCache;
use crate::pathutil;
use crate::rule::{ImportSpec, Label, RuleIndex, RuleKind};
use crate::target;

/// Outcome of one strategy for one import string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(Vec<String>),
    NoMatch,
}

/// What a strategy knows about the rule whose imports are being resolved.
pub struct ResolveContext<'a> {
    pub rule_index: &'a dyn RuleIndex,
    pub kind: RuleKind,
    /// Owning module label, when the rule carries one.
    pub module: Option<&'a str>,
    pub from: &'a Label,
}

pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, import: &str, ctx: &ResolveContext<'_>) -> Resolution;
}

/// Stage 1: the module index.
pub struct ModuleIndexStrategy {
    modules: Arc<ModuleIndex>,
}

impl ModuleIndexStrategy {
    pub fn new(modules: Arc<ModuleIndex>) -> Self {
        Self { modules }
    }
}

impl ResolveStrategy for ModuleIndexStrategy {
    fn name(&self) -> &'static str {
        "module_index"
    }

    fn resolve(&self, import: &str, ctx: &ResolveContext<'_>) -> Resolution {
        match self.modules.lookup(import, ctx.module) {
            Some(target) => Resolution::Matched(vec![target]),
            None => Resolution::NoMatch,
        }
    }
}

/// Stage 2: the build graph's own reverse import index. May yield several targets.
pub struct RuleIndexStrategy;

impl ResolveStrategy for RuleIndexStrategy {
    fn name(&self) -> &'static str {
        "rule_index"
    }

    fn resolve(&self, import: &str, ctx: &ResolveContext<'_>) -> Resolution {
        let targets: Vec<String> = ctx
            .rule_index
            .find_rules_by_import(&ImportSpec::new(import))
            .into_iter()
            .filter(|label| label != ctx.from)
            .map(|label| label.rel_string(&ctx.from.repo, &ctx.from.pkg))
            .collect();

        if targets.is_empty() {
            Resolution::NoMatch
        } else {
            Resolution::Matched(targets)
        }
    }
}

/// Stage 3: synthesize a target from the import path and its repository root.
pub struct PathHeuristicStrategy {
    remote: Arc<dyn RemoteCache>,
}

impl PathHeuristicStrategy {
    pub fn new(remote: Arc<dyn RemoteCache>) -> Self {
        Self { remote }
    }
}

impl ResolveStrategy for PathHeuristicStrategy {
    fn name(&self) -> &'static str {
        "path_heuristic"
    }

    fn resolve(&self, import: &str, ctx: &ResolveContext<'_>) -> Resolution {
        if !ctx.kind.consumes_instances() {
            return Resolution::NoMatch;
        }

        // "path/to/dir:pkg" names the package explicitly
        let (path_part, package) = match import.rfind(':') {
            Some(idx) => (&import[..idx], Some(&import[idx + 1..])),
            None => (import, None),
        };

        let (prefix, repo) = match self.remote.root(path_part) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("error resolving import {:?}: {}", path_part, e);
                return Resolution::NoMatch;
            }
        };

        let target = match package {
            Some(package) => {
                if package.is_empty() {
                    return Resolution::NoMatch;
                }
                let path = if pathutil::has_prefix(path_part, &prefix) {
                    pathutil::trim_prefix(path_part, &prefix)
                } else {
                    path_part
                };
                target::repository_target(&repo, path, package)
            }
            None => {
                if !pathutil::has_prefix(import, &prefix) {
                    return Resolution::NoMatch;
                }
                let path = pathutil::trim_prefix(import, &prefix);
                if path.is_empty() {
                    return Resolution::NoMatch;
                }
                target::repository_target(&repo, path, &pathutil::base(path))
            }
        };

        tracing::debug!("synthesized {} for import {}", target, import);
        Resolution::Matched(vec![target])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryEntry;
    use crate::resolve::remote::StaticRemoteCache;
    use crate::rule::MemoryRuleIndex;

    fn remote() -> Arc<dyn RemoteCache> {
        Arc::new(StaticRemoteCache::new(vec![RepositoryEntry {
            prefix: "example.com".to_string(),
            name: "R".to_string(),
        }]))
    }

    fn ctx<'a>(index: &'a MemoryRuleIndex, kind: RuleKind, from: &'a Label) -> ResolveContext<'a> {
        ResolveContext {
            rule_index: index,
            kind,
            module: None,
            from,
        }
    }

    #[test]
    fn test_heuristic_plain_import() {
        let index = MemoryRuleIndex::new();
        let from = Label::new("", "app", "app_instance");
        let strategy = PathHeuristicStrategy::new(remote());

        assert_eq!(
            strategy.resolve("example.com/x/y", &ctx(&index, RuleKind::CueInstance, &from)),
            Resolution::Matched(vec!["R//x/y:y_instance".to_string()])
        );
    }

    #[test]
    fn test_heuristic_colon_import() {
        let index = MemoryRuleIndex::new();
        let from = Label::new("", "app", "app_instance");
        let strategy = PathHeuristicStrategy::new(remote());

        assert_eq!(
            strategy.resolve("example.com/schemas:v1", &ctx(&index, RuleKind::CueInstance, &from)),
            Resolution::Matched(vec!["R//schemas:v1_instance".to_string()])
        );
    }

    #[test]
    fn test_heuristic_skips_non_instance_kinds() {
        let index = MemoryRuleIndex::new();
        let from = Label::new("", "app", "golden");
        let strategy = PathHeuristicStrategy::new(remote());

        assert_eq!(
            strategy.resolve("example.com/x", &ctx(&index, RuleKind::CueGenGolden, &from)),
            Resolution::NoMatch
        );
    }

    #[test]
    fn test_heuristic_drops_unknown_root() {
        let index = MemoryRuleIndex::new();
        let from = Label::new("", "app", "app_instance");
        let strategy = PathHeuristicStrategy::new(remote());

        assert_eq!(
            strategy.resolve("elsewhere.org/x", &ctx(&index, RuleKind::CueInstance, &from)),
            Resolution::NoMatch
        );
    }

    #[test]
    fn test_heuristic_import_equal_to_root_has_no_target() {
        let index = MemoryRuleIndex::new();
        let from = Label::new("", "app", "app_instance");
        let strategy = PathHeuristicStrategy::new(remote());

        assert_eq!(
            strategy.resolve("example.com", &ctx(&index, RuleKind::CueInstance, &from)),
            Resolution::NoMatch
        );
    }

    #[test]
    fn test_rule_index_returns_every_match_relative_to_caller() {
        let mut index = MemoryRuleIndex::new();
        index.add(ImportSpec::new("shared"), Label::new("", "app", "shared_instance"));
        index.add(ImportSpec::new("shared"), Label::new("", "lib/shared", "shared_instance"));
        let from = Label::new("", "app", "app_instance");

        assert_eq!(
            RuleIndexStrategy.resolve("shared", &ctx(&index, RuleKind::CueInstance, &from)),
            Resolution::Matched(vec![
                ":shared_instance".to_string(),
                "//lib/shared:shared_instance".to_string(),
            ])
        );
    }

    #[test]
    fn test_rule_index_ignores_self() {
        let mut index = MemoryRuleIndex::new();
        let from = Label::new("", "app", "app_instance");
        index.add(ImportSpec::new("app"), from.clone());

        assert_eq!(
            RuleIndexStrategy.resolve("app", &ctx(&index, RuleKind::CueInstance, &from)),
            Resolution::NoMatch
        );
    }
}

//! Rule generation for one directory.
//!
//! [`Generator::generate`] parses the directory's source files, aggregates
//! them into instances and derived artifacts, emits one rule per artifact and
//! reconciles the result against the rules already declared in the directory.

pub mod golden;
pub mod instance;
pub mod reconcile;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::pathutil;
use crate::rule::{ExistingRule, Rule, RuleKind};
use crate::source::{self, SourceFile, SourceParser};
use crate::target::{self, MODULE_DIR_NAME};

pub use golden::{discover_golden, GoldenFile};
pub use instance::{
    Aggregation, ConsolidatedInstance, ExportedFiles, ExportedInstance, Instance, TestDescriptor,
    PUBLIC_VISIBILITY,
};
pub use reconcile::reconcile;

/// Inputs of one directory pass.
#[derive(Debug, Clone, Copy)]
pub struct GenerateArgs<'a> {
    /// Absolute directory path.
    pub dir: &'a Path,
    /// Directory path relative to the repository root; `""` for the root.
    pub rel: &'a str,
    pub config: &'a Config,
    pub regular_files: &'a [String],
    pub gen_files: &'a [String],
    /// Rules declared in the directory's existing build file.
    pub existing: &'a [ExistingRule],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    pub gen: Vec<Rule>,
    pub empty: Vec<ExistingRule>,
}

pub struct Generator {
    parser: Arc<dyn SourceParser>,
}

impl Generator {
    pub fn new(parser: Arc<dyn SourceParser>) -> Self {
        Self { parser }
    }

    /// Parses the source files of a directory pass, keyed by file name.
    pub fn parse(&self, args: &GenerateArgs<'_>) -> Vec<SourceFile> {
        let names: Vec<String> = args
            .regular_files
            .iter()
            .chain(args.gen_files.iter())
            .cloned()
            .collect();
        source::parse_directory(&self.parser, args.dir, args.rel, &names)
            .into_values()
            .collect()
    }

    /// Aggregates the directory's files without emitting rules.
    pub fn aggregate(&self, args: &GenerateArgs<'_>) -> Aggregation {
        let files = self.parse(args);
        let module = find_nearest_module(args.dir, args.rel);
        Aggregation::build(args.config, module.as_deref(), &files)
    }

    pub fn generate(&self, args: &GenerateArgs<'_>) -> GenerateResult {
        let files = self.parse(args);
        let is_module_dir = pathutil::base(args.rel) == MODULE_DIR_NAME
            || args.dir.file_name().map(|n| n == MODULE_DIR_NAME).unwrap_or(false);

        if files.is_empty() && !is_module_dir {
            // nothing to generate, but stale and deprecated rules still go
            return GenerateResult {
                gen: Vec::new(),
                empty: reconcile(args.existing, &[]),
            };
        }

        let module = find_nearest_module(args.dir, args.rel);
        let agg = Aggregation::build(args.config, module.as_deref(), &files);
        let golden = if files.is_empty() {
            None
        } else {
            discover_golden(args.config, args.dir, args.regular_files)
        };

        let mut gen = Vec::new();
        if is_module_dir {
            let mut rule = Rule::new(RuleKind::CueModule, target::MODULE_RULE_NAME);
            rule.set_attr("visibility", vec![PUBLIC_VISIBILITY.to_string()]);
            gen.push(rule);
        }
        gen.extend(emit(args.config, &agg, golden.as_ref()));

        let empty = reconcile(args.existing, &gen);
        tracing::debug!(
            "{}: {} rules generated, {} obsolete",
            if args.rel.is_empty() { "." } else { args.rel },
            gen.len(),
            empty.len()
        );
        GenerateResult { gen, empty }
    }
}

/// Emits rules for an aggregated directory in a fixed order: instances,
/// exported instances, exported files, consolidated instances, tests and
/// golden fixtures.
pub fn emit(config: &Config, agg: &Aggregation, golden: Option<&GoldenFile>) -> Vec<Rule> {
    let mut exported = Vec::new();
    let mut tests = Vec::new();

    if config.gen_exported_instance {
        if let Some(golden) = golden {
            for instance in agg.instances.values() {
                let exp = ExportedInstance::for_instance(instance, &config.output_format);
                if config.golden_enabled() {
                    if let Some(test) = test_for(config, instance, &exp, golden) {
                        tests.push(test);
                    }
                }
                exported.push(exp);
            }
        }
    }

    let mut rules: Vec<Rule> = agg.instances.values().map(Instance::to_rule).collect();
    rules.extend(exported.iter().map(ExportedInstance::to_rule));
    rules.extend(agg.exported_files.values().map(ExportedFiles::to_rule));
    rules.extend(agg.consolidated.values().map(ConsolidatedInstance::to_rule));
    rules.extend(tests.iter().map(TestDescriptor::to_rule));
    if let Some(golden) = golden {
        rules.push(golden.to_rule());
    }
    rules
}

/// The golden test of `instance`, when the golden file has the export's format.
fn test_for(
    config: &Config,
    instance: &Instance,
    exported: &ExportedInstance,
    golden: &GoldenFile,
) -> Option<TestDescriptor> {
    if !golden.matches_format(&config.output_format) {
        return None;
    }
    Some(TestDescriptor {
        name: target::test_name(&instance.name),
        golden_file: golden.name.clone(),
        generated_output_file: format!("{}.{}", exported.name, config.output_format),
    })
}

/// Label of the nearest `cue.mod` directory at or above `dir`.
///
/// `rel` is `dir` relative to the repository root; the search stops there.
pub fn find_nearest_module(dir: &Path, rel: &str) -> Option<String> {
    let mut current_dir = dir.to_path_buf();
    let mut current_rel = rel.to_string();

    loop {
        if current_dir.join(MODULE_DIR_NAME).is_dir() {
            let module_rel = pathutil::join(&[current_rel.as_str(), MODULE_DIR_NAME]);
            return Some(target::module_label(&module_rel));
        }
        if current_rel.is_empty() || current_rel == "." {
            return None;
        }

        current_dir = match current_dir.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return None,
        };
        current_rel = pathutil::dir(&current_rel);
        if current_rel == "." {
            current_rel.clear();
        }
    }
}

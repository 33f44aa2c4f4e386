//! Instance aggregation and the derived artifacts built from instances.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::config::Config;
use crate::rule::{Rule, RuleKind};
use crate::source::{self, SourceFile};
use crate::target;

pub const PUBLIC_VISIBILITY: &str = "//visibility:public";

fn public() -> Vec<String> {
    vec![PUBLIC_VISIBILITY.to_string()]
}

/// One package of one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub name: String,
    pub package: String,
    pub srcs: Vec<String>,
    pub imports: BTreeSet<String>,
    /// Nearest enclosing module label, if any.
    pub module: Option<String>,
}

impl Instance {
    pub fn new(package: &str, module: Option<String>) -> Self {
        Self {
            name: target::instance_name(package),
            package: package.to_string(),
            srcs: Vec::new(),
            imports: BTreeSet::new(),
            module,
        }
    }

    pub fn add_file(&mut self, file: &SourceFile) {
        self.srcs.push(file.name.clone());
        self.imports.extend(file.imports.iter().cloned());
    }

    pub fn sorted_srcs(&self) -> Vec<String> {
        let mut srcs = self.srcs.clone();
        srcs.sort();
        srcs
    }

    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(RuleKind::CueInstance, &self.name);
        rule.set_attr("srcs", self.sorted_srcs());
        rule.set_attr("package_name", self.package.as_str());
        rule.set_attr("visibility", public());
        // replaced by the resolved ancestor later, if there is one
        if let Some(module) = &self.module {
            rule.set_attr("ancestor", module.as_str());
        }
        rule.set_imports(self.imports.iter().cloned().collect());
        rule
    }
}

/// Export of raw files, either one standalone file or all files of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFiles {
    pub name: String,
    pub module: Option<String>,
    pub srcs: Vec<String>,
    pub imports: BTreeSet<String>,
    pub output_format: String,
}

impl ExportedFiles {
    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(RuleKind::CueExportedFiles, &self.name);
        rule.set_attr("module", self.module.clone().unwrap_or_default());
        rule.set_attr("visibility", public());
        let mut srcs = self.srcs.clone();
        srcs.sort();
        rule.set_attr("srcs", srcs);
        if !self.output_format.is_empty() {
            rule.set_attr("output_format", self.output_format.as_str());
        }
        rule.set_imports(self.imports.iter().cloned().collect());
        rule
    }
}

/// Export of a compiled instance to the configured output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedInstance {
    pub name: String,
    pub instance: String,
    pub output_format: String,
}

impl ExportedInstance {
    pub fn for_instance(instance: &Instance, output_format: &str) -> Self {
        Self {
            name: target::exported_instance_name(&instance.name),
            instance: instance.name.clone(),
            output_format: output_format.to_string(),
        }
    }

    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(RuleKind::CueExportedInstance, &self.name);
        rule.set_attr("instance", format!(":{}", self.instance));
        rule.set_attr("visibility", public());
        if !self.output_format.is_empty() {
            rule.set_attr("output_format", self.output_format.as_str());
        }
        rule
    }
}

/// Merged definition of an instance, always exported as the source language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedInstance {
    pub name: String,
    pub instance: String,
}

impl ConsolidatedInstance {
    pub fn for_instance(instance: &Instance) -> Self {
        Self {
            name: target::consolidated_name(&instance.package),
            instance: instance.name.clone(),
        }
    }

    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(RuleKind::CueConsolidatedInstance, &self.name);
        rule.set_attr("instance", format!(":{}", self.instance));
        rule.set_attr("visibility", public());
        rule.set_attr("output_format", "cue");
        rule
    }
}

/// Comparison of an exported artifact against a golden file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDescriptor {
    pub name: String,
    pub golden_file: String,
    pub generated_output_file: String,
}

impl TestDescriptor {
    pub fn to_rule(&self) -> Rule {
        let mut rule = Rule::new(RuleKind::CueTest, &self.name);
        rule.set_attr("golden_file", format!(":{}", self.golden_file));
        rule.set_attr("generated_output_file", format!(":{}", self.generated_output_file));
        rule
    }
}

/// Everything one directory's source files aggregate into, keyed by rule name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Aggregation {
    pub instances: BTreeMap<String, Instance>,
    pub exported_files: BTreeMap<String, ExportedFiles>,
    pub consolidated: BTreeMap<String, ConsolidatedInstance>,
}

impl Aggregation {
    /// Folds `files` into instances and their per-file derived artifacts.
    ///
    /// The result does not depend on the order of `files`.
    pub fn build<'a>(
        config: &Config,
        module: Option<&str>,
        files: impl IntoIterator<Item = &'a SourceFile>,
    ) -> Self {
        let classified = source::classify(files);
        let mut agg = Self::default();
        for file in classified.standalone {
            agg.add_standalone_file(config, module, file);
        }
        for (package, files) in &classified.packages {
            for file in files {
                agg.add_package_file(config, module, package, file);
            }
        }
        agg
    }

    fn add_standalone_file(&mut self, config: &Config, module: Option<&str>, file: &SourceFile) {
        if !config.gen_exported_files {
            return;
        }
        let name = target::exported_files_name(&target::export_slug(&file.name));
        let exported = self.exported_files.entry(name.clone()).or_insert_with(|| ExportedFiles {
            name,
            module: module.map(String::from),
            srcs: vec![file.name.clone()],
            imports: BTreeSet::new(),
            output_format: config.output_format.clone(),
        });
        exported.imports.extend(file.imports.iter().cloned());
    }

    fn add_package_file(
        &mut self,
        config: &Config,
        module: Option<&str>,
        package: &str,
        file: &SourceFile,
    ) {
        let instance = self
            .instances
            .entry(target::instance_name(package))
            .or_insert_with(|| Instance::new(package, module.map(String::from)));
        instance.add_file(file);

        if config.gen_exported_files {
            let name = target::exported_files_name(package);
            let exported = self.exported_files.entry(name.clone()).or_insert_with(|| ExportedFiles {
                name,
                module: module.map(String::from),
                srcs: Vec::new(),
                imports: BTreeSet::new(),
                output_format: config.output_format.clone(),
            });
            exported.imports.extend(file.imports.iter().cloned());
            exported.srcs = instance.srcs.clone();
        }

        if config.gen_consolidated_instance {
            let consolidated = ConsolidatedInstance::for_instance(instance);
            self.consolidated.entry(consolidated.name.clone()).or_insert(consolidated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceHeader;
    use std::path::PathBuf;

    fn file(name: &str, package: Option<&str>, imports: &[&str]) -> SourceFile {
        SourceFile::new(
            PathBuf::from(name),
            "app",
            SourceHeader {
                package: package.map(String::from),
                imports: imports.iter().map(|s| s.to_string()).collect(),
            },
        )
    }

    #[test]
    fn test_package_files_share_one_instance() {
        let files = vec![
            file("b.cue", Some("p"), &["example.com/y"]),
            file("a.cue", Some("p"), &["strings", "example.com/x"]),
        ];
        let agg = Aggregation::build(&Config::default(), None, &files);

        assert_eq!(agg.instances.len(), 1);
        let instance = &agg.instances["p_instance"];
        assert_eq!(instance.sorted_srcs(), vec!["a.cue", "b.cue"]);
        let imports: Vec<&str> = instance.imports.iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["example.com/x", "example.com/y", "strings"]);
    }

    #[test]
    fn test_import_union_ignores_file_order() {
        let a = file("a.cue", Some("p"), &["x", "y"]);
        let b = file("b.cue", Some("p"), &["y", "z"]);
        let forward = Aggregation::build(&Config::default(), None, [&a, &b]);
        let backward = Aggregation::build(&Config::default(), None, [&b, &a]);

        assert_eq!(
            forward.instances["p_instance"].imports,
            backward.instances["p_instance"].imports
        );
        assert_eq!(
            forward.instances["p_instance"].to_rule(),
            backward.instances["p_instance"].to_rule()
        );
    }

    #[test]
    fn test_consolidated_instance_per_package() {
        let files = vec![file("a.cue", Some("p"), &[]), file("b.cue", Some("q"), &[])];
        let agg = Aggregation::build(&Config::default(), None, &files);

        let names: Vec<&str> = agg.consolidated.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["p_def", "q_def"]);

        let rule = agg.consolidated["p_def"].to_rule();
        assert_eq!(rule.attr_string("instance"), ":p_instance");
        assert_eq!(rule.attr_string("output_format"), "cue");
        assert!(rule.imports.is_none());
    }

    #[test]
    fn test_consolidation_can_be_disabled() {
        let mut conf = Config::default();
        conf.gen_consolidated_instance = false;
        let files = vec![file("a.cue", Some("p"), &[])];
        assert!(Aggregation::build(&conf, None, &files).consolidated.is_empty());
    }

    #[test]
    fn test_standalone_files_only_exported_when_enabled() {
        let files = vec![file("My-Config.cue", None, &["example.com/x"])];
        assert!(Aggregation::build(&Config::default(), None, &files).exported_files.is_empty());

        let mut conf = Config::default();
        conf.gen_exported_files = true;
        let agg = Aggregation::build(&conf, Some("//cue.mod:cue.mod"), &files);
        let exported = &agg.exported_files["my_config_exported_files"];
        assert_eq!(exported.srcs, vec!["My-Config.cue"]);

        let rule = exported.to_rule();
        assert_eq!(rule.attr_string("module"), "//cue.mod:cue.mod");
        assert_eq!(rule.attr_string("output_format"), "json");
        assert_eq!(rule.imports, Some(vec!["example.com/x".to_string()]));
    }

    #[test]
    fn test_package_exported_files_follow_instance_srcs() {
        let mut conf = Config::default();
        conf.gen_exported_files = true;
        let files = vec![file("b.cue", Some("p"), &["y"]), file("a.cue", Some("p"), &["x"])];
        let agg = Aggregation::build(&conf, None, &files);

        let rule = agg.exported_files["p_exported_files"].to_rule();
        assert_eq!(rule.attr_list("srcs"), ["a.cue".to_string(), "b.cue".to_string()]);
        assert_eq!(rule.imports, Some(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn test_instance_rule_attributes() {
        let files = vec![file("a.cue", Some("p"), &["z", "a"])];
        let agg = Aggregation::build(&Config::default(), Some("//cue.mod:cue.mod"), &files);
        let rule = agg.instances["p_instance"].to_rule();

        assert_eq!(rule.kind, RuleKind::CueInstance);
        assert_eq!(rule.attr_string("package_name"), "p");
        assert_eq!(rule.attr_string("ancestor"), "//cue.mod:cue.mod");
        assert_eq!(rule.attr_list("visibility"), [PUBLIC_VISIBILITY.to_string()]);
        assert_eq!(rule.imports, Some(vec!["a".to_string(), "z".to_string()]));
    }

    #[test]
    fn test_exported_instance_and_test_rules() {
        let instance = Instance::new("p", None);
        let exported = ExportedInstance::for_instance(&instance, "yaml");
        let rule = exported.to_rule();
        assert_eq!(rule.name, "p_instance_exported");
        assert_eq!(rule.attr_string("instance"), ":p_instance");
        assert_eq!(rule.attr_string("output_format"), "yaml");

        let test = TestDescriptor {
            name: target::test_name(&instance.name),
            golden_file: "out.yaml".to_string(),
            generated_output_file: format!("{}.yaml", exported.name),
        };
        let rule = test.to_rule();
        assert_eq!(rule.name, "p_instance_cue");
        assert_eq!(rule.attr_string("golden_file"), ":out.yaml");
        assert_eq!(rule.attr_string("generated_output_file"), ":p_instance_exported.yaml");
    }
}

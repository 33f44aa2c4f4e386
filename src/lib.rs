pub mod config;
pub mod error;
pub mod generate;
pub mod pathutil;
pub mod resolve;
pub mod rule;
pub mod source;
pub mod target;
pub mod update;

pub use config::{
    CollisionPolicy, Config, Directive, ModuleIndexOptions, ProjectConfig, RepositoryEntry,
};
pub use error::{CuegraphError, Result};
pub use generate::{
    find_nearest_module, reconcile, Aggregation, GenerateArgs, GenerateResult, Generator,
    GoldenFile, Instance,
};
pub use resolve::{
    ImportResolver, ModuleIndex, ModuleSummary, RemoteCache, Resolution, ResolveContext,
    ResolveStrategy, StaticRemoteCache,
};
pub use rule::{
    AttrValue, BuildFile, ExistingRule, ImportSpec, Label, MemoryRuleIndex, Rule, RuleIndex,
    RuleKind,
};
pub use source::{CueHeaderParser, SourceFile, SourceHeader, SourceParser};
pub use update::{DirectoryUpdate, ReportFormat, UpdateReport, Updater};

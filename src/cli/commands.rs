use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use cuegraph::error::{CuegraphError, Result};
use cuegraph::generate::Aggregation;
use cuegraph::update::{ReportFormat, Updater};

#[derive(Parser)]
#[command(name = "cuegraph")]
#[command(about = "Generates build rules for CUE source trees and resolves their imports")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Generate rules for the current repository
    cuegraph update

    # Same, as JSON
    cuegraph update ./repo --format json

    # Show how one directory aggregates
    cuegraph inspect envs/prod

    # List cue.mod roots and their index sizes
    cuegraph modules

    # Trace index insertions and resolution steps
    cuegraph --debug update
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log every module-index insertion and resolution step
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate and resolve rules for every directory
    Update {
        /// Repository root
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output format (text, json or yaml)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the instances and derived artifacts of one directory
    Inspect {
        /// Directory, relative to the repository root
        #[arg(default_value = ".")]
        dir: String,

        /// Repository root
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Output format (text, json or yaml)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List registered modules
    Modules {
        /// Repository root
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

fn parse_format(format: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(format)
        .ok_or_else(|| CuegraphError::Config(format!("unknown output format: {}", format)))
}

/// Runs a full update and prints the report.
pub fn update(root: &Path, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let updater = Updater::for_root(root)?;
    let report = updater.run(root)?;
    print!("{}", report.render(format)?);
    Ok(())
}

/// Prints how a single directory aggregates.
pub fn inspect(root: &Path, dir: &str, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let updater = Updater::for_root(root)?;
    let agg = updater.inspect(root, dir)?;

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&agg)?),
        ReportFormat::Yaml => print!("{}", serde_yaml::to_string(&agg)?),
        ReportFormat::Text => print_aggregation(dir, &agg),
    }
    Ok(())
}

fn print_aggregation(dir: &str, agg: &Aggregation) {
    if agg.instances.is_empty() && agg.exported_files.is_empty() {
        println!("No instances in {}", dir);
        return;
    }

    for instance in agg.instances.values() {
        println!("{} (package {})", instance.name, instance.package);
        println!("  Sources: {}", instance.sorted_srcs().join(", "));
        if let Some(ref module) = instance.module {
            println!("  Module: {}", module);
        }
        if !instance.imports.is_empty() {
            println!("  Imports:");
            for imp in &instance.imports {
                println!("    {}", imp);
            }
        }
    }

    if !agg.consolidated.is_empty() {
        println!();
        println!("Consolidated:");
        for consolidated in agg.consolidated.values() {
            println!("  {} <- :{}", consolidated.name, consolidated.instance);
        }
    }

    if !agg.exported_files.is_empty() {
        println!();
        println!("Exported files:");
        for exported in agg.exported_files.values() {
            println!(
                "  {} [{}] ({})",
                exported.name,
                exported.srcs.join(", "),
                exported.output_format
            );
        }
    }
}

/// Runs an update and lists the modules it registered.
pub fn modules(root: &Path) -> Result<()> {
    let updater = Updater::for_root(root)?;
    updater.run(root)?;

    let summaries = updater.module_summaries();
    if summaries.is_empty() {
        println!("No modules found");
        return Ok(());
    }

    println!("Modules ({}):", summaries.len());
    for summary in summaries {
        println!(
            "  {} - {} import entries ({})",
            summary.label,
            summary.entries,
            summary.dir.display()
        );
    }
    Ok(())
}

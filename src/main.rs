mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "cuegraph=debug" } else { "cuegraph=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Update { root, format } => {
            cli::update(&root, &format)?;
        }
        Commands::Inspect { dir, root, format } => {
            cli::inspect(&root, &dir, &format)?;
        }
        Commands::Modules { root } => {
            cli::modules(&root)?;
        }
    }

    Ok(())
}

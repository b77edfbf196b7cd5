use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lg_sources::config::Config;
use lg_sources::logger::{self, LogTag};
use lg_sources::SourceRegistry;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lg-sources")]
#[command(about = "Query BGP route servers through their looking-glass backends", long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "lg-sources.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route server status; all route servers if none is given
    Status { source: Option<String> },

    /// Neighbors of a route server
    Neighbors {
        source: String,

        /// Skip per-neighbor route lookups
        #[arg(long)]
        summary: bool,
    },

    /// Session state of all neighbors
    NeighborsStatus { source: String },

    /// Routes learnt from one neighbor
    Routes {
        source: String,
        neighbor: String,

        #[arg(long, conflicts_with_all = ["filtered", "not_exported"])]
        received: bool,

        #[arg(long, conflicts_with = "not_exported")]
        filtered: bool,

        #[arg(long)]
        not_exported: bool,
    },

    /// Full RIB of a route server
    AllRoutes { source: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init();

    let config = Config::load_from_path(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let registry = SourceRegistry::from_config(&config)?;

    logger::debug(
        LogTag::System,
        &format!("{} route servers configured", registry.len()),
    );

    match args.command {
        Command::Status { source: Some(id) } => {
            print_json(&registry.require(&id)?.status().await?)?;
        }
        Command::Status { source: None } => {
            for source in registry.iter() {
                match source.status().await {
                    Ok(status) => print_json(&status)?,
                    Err(e) => logger::error(
                        LogTag::System,
                        &format!("{}: {} ({})", source.id(), e, e.kind()),
                    ),
                }
            }
        }
        Command::Neighbors { source, summary } => {
            let source = registry.require(&source)?;
            let response = if summary {
                source.neighbors_summary().await?
            } else {
                source.neighbors().await?
            };
            print_json(&response)?;
        }
        Command::NeighborsStatus { source } => {
            print_json(&registry.require(&source)?.neighbors_status().await?)?;
        }
        Command::Routes {
            source,
            neighbor,
            received,
            filtered,
            not_exported,
        } => {
            let source = registry.require(&source)?;
            let response = if received {
                source.routes_received(&neighbor).await?
            } else if filtered {
                source.routes_filtered(&neighbor).await?
            } else if not_exported {
                source.routes_not_exported(&neighbor).await?
            } else {
                source.routes(&neighbor).await?
            };
            print_json(&response)?;
        }
        Command::AllRoutes { source } => {
            print_json(&registry.require(&source)?.all_routes().await?)?;
        }
    }

    Ok(())
}

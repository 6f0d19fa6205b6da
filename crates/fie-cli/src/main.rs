//! fie CLI - Bank statement transaction reconstruction
//!
//! Usage:
//!   fie parse june.json            Parse dumps, print transactions as JSON
//!   fie ingest statements/         Parse and store (skips known transactions)
//!   fie list --sort amount         List stored transactions

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let layout = commands::load_layout(cli.layout.as_deref())?;

    match cli.command {
        Commands::Parse { files } => commands::cmd_parse(&layout, &files),
        Commands::Ingest { path } => {
            let store = commands::open_store(cli.data.as_deref())?;
            commands::cmd_ingest(&store, layout, &path).await
        }
        Commands::List {
            sort,
            dir,
            mode,
            scope,
            since,
            limit,
        } => {
            let store = commands::open_store(cli.data.as_deref())?;
            let filter = commands::ListFilter::parse(
                dir.as_deref(),
                mode.as_deref(),
                scope.as_deref(),
                since.as_deref(),
            )?;
            commands::cmd_list(&store, &filter, sort, limit)
        }
    }
}

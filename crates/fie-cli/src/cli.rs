//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// fie - Reconstruct transactions from bank statements
#[derive(Parser)]
#[command(name = "fie")]
#[command(about = "Bank statement transaction reconstruction", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Transaction store path (defaults to ~/.local/share/fie/transactions.json)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Statement layout file (defaults to the data-dir override or built-in Canara layout)
    #[arg(long, global = true)]
    pub layout: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse fragment dumps and print the transactions as JSON
    Parse {
        /// Word-coordinate dump files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Parse dumps and add new transactions to the store
    Ingest {
        /// A dump file, or a directory of *.json dumps
        path: PathBuf,
    },

    /// List stored transactions
    List {
        /// Sort order
        #[arg(long, value_enum, default_value_t = SortKey::Date)]
        sort: SortKey,

        /// Only this direction (debit, credit)
        #[arg(long)]
        dir: Option<String>,

        /// Only this payment mode (UPI, IMPS, CASH, SETTLEMENT, UNKNOWN)
        #[arg(long)]
        mode: Option<String>,

        /// Only this scope (unknown, personal, family, education, shared)
        #[arg(long)]
        scope: Option<String>,

        /// Only transactions on or after this date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// Maximum number to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Date,
    Amount,
    Counterparty,
}

//! CLI definition using clap

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

use plategate_types::OutputFormat;

#[derive(Parser)]
#[command(name = "plategate")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "License plate gate: entry logging and payment-checked exit")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the user config directory)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format (json, table)
    #[arg(long, short = 'f', global = true, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the entry station until Ctrl-C or `q`
    Entry,

    /// Run the exit station until Ctrl-C or `q`
    Exit,

    /// Inspect or update the visit ledger
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a config file with default values
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand)]
pub enum LedgerAction {
    /// List recorded visits
    Show {
        /// Only this plate
        #[arg(long, short = 'p')]
        plate: Option<String>,

        /// Only vehicles still inside
        #[arg(long)]
        open: bool,
    },

    /// Record a payment for a vehicle that is inside
    Pay {
        /// Plate number (e.g., "RAB123C")
        plate: String,

        /// Amount paid
        #[arg(long, short = 'a')]
        amount: Decimal,
    },
}

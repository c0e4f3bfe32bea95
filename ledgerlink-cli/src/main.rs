//! Ledgerlink CLI - reconcile bank statements against Firefly III

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;
mod prompt;

use commands::{convert, fetch, link, reconcile, version, ApiArgs};

/// Exit status after Ctrl-C, as a shell reports SIGINT
const EXIT_INTERRUPTED: u8 = 130;

/// Ledgerlink - reconcile bank statements against Firefly III
#[derive(Parser)]
#[command(name = "ledgerlink", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    api: ApiArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match statement rows against ledger transactions
    Match(reconcile::MatchArgs),

    /// Link reimbursements named in transaction notes
    Link {
        /// Search query selecting the transactions with notes
        #[arg(short, long)]
        query: String,
    },

    /// Send a raw request to the Firefly III API
    Fetch {
        /// Path under api/v1, e.g. accounts
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE")]
        query: Vec<String>,
        /// HTTP method to use
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },

    /// Show the Firefly III version
    Version,

    /// Convert statement exports to CSV
    Convert {
        #[command(subcommand)]
        command: convert::ConvertCommands,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            match e.downcast_ref::<ledgerlink_core::Error>() {
                Some(ledgerlink_core::Error::Interrupted) => ExitCode::from(EXIT_INTERRUPTED),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Match(args) => reconcile::run(&cli.api, args),
        Commands::Link { query } => link::run(&cli.api, &query),
        Commands::Fetch { path, query, method } => fetch::run(&cli.api, &path, &query, &method),
        Commands::Version => version::run(&cli.api),
        Commands::Convert { command } => convert::run(command),
    }
}

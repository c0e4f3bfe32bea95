//! Match command - reconcile a statement file against the ledger

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use colored::Colorize;

use ledgerlink_core::adapters::CsvStatementSource;
use ledgerlink_core::config::{DEFAULT_DATE_FORMAT, DEFAULT_TAG};
use ledgerlink_core::{AccountMapping, ColumnLayout, MatchConfig, ReconcileService};

use super::{get_ledgerlink_dir, ApiArgs};
use crate::output;
use crate::prompt::DialoguerPrompter;

#[derive(Args)]
pub struct MatchArgs {
    /// Ledger id of the account the statement belongs to
    #[arg(short, long)]
    account_id: u64,

    /// Statement CSV file
    #[arg(short, long)]
    file: PathBuf,

    /// First row to process (1-based)
    #[arg(short, long, default_value_t = 0)]
    start: usize,

    /// Ids of your own asset accounts; new transactions between two of them
    /// are transfers
    #[arg(long, value_delimiter = ',')]
    assets: Vec<u64>,

    /// Keep stored descriptions; `false` asks before replacing one that differs
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    keep_description: bool,

    /// Tag marking reconciled transactions
    #[arg(long, default_value = DEFAULT_TAG)]
    tag: String,

    /// Column holding the date (1-based)
    #[arg(long)]
    col_date: usize,

    /// chrono format of the date column
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Column holding the description (1-based)
    #[arg(long)]
    col_description: usize,

    /// Column holding the amount, or receipts when --col-withdrawal is set
    #[arg(long)]
    col_amount: usize,

    /// Column holding payments, for statements that split directions
    #[arg(long)]
    col_withdrawal: Option<usize>,

    /// Description prefix of transfers whose posting day varies
    #[arg(long)]
    approx_transfer: Option<String>,

    /// Field delimiter of the statement file
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Account mapping file (default: $LEDGERLINK_DIR/mappings.json)
    #[arg(long)]
    mapping: Option<PathBuf>,
}

pub fn run(api: &ApiArgs, args: MatchArgs) -> Result<()> {
    if atty::isnt(atty::Stream::Stdin) || atty::isnt(atty::Stream::Stderr) {
        anyhow::bail!("match is interactive and needs a terminal");
    }
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    let layout = ColumnLayout {
        date: args.col_date,
        description: args.col_description,
        amount: args.col_amount,
        withdrawal: args.col_withdrawal,
        date_format: args.date_format,
    };
    let mut config = MatchConfig::new(args.account_id, layout);
    config.asset_ids = args.assets;
    config.keep_description = args.keep_description;
    config.tag = args.tag;
    config.approx_transfer = args.approx_transfer;
    config.start = args.start;

    let mapping_path = match args.mapping {
        Some(path) => path,
        None => get_ledgerlink_dir()?.join("mappings.json"),
    };
    let mapping = AccountMapping::load(&mapping_path)
        .with_context(|| format!("Failed to load account mapping: {:?}", mapping_path))?;
    tracing::info!(path = ?mapping_path, rules = mapping.len(), "loaded account mapping");

    let service = ReconcileService::new(api.client()?, config, mapping)?;
    let rows = CsvStatementSource::from_path(&args.file, args.delimiter as u8)?;

    let stdout = std::io::stdout();
    let mut audit = stdout.lock();
    let summary = service.run(rows, &mut DialoguerPrompter, &mut audit)?;

    eprintln!();
    eprintln!("{}", "Reconciliation Summary".bold());
    output::counts(&[
        ("Rows", summary.rows),
        ("Skipped", summary.skipped),
        ("Already reconciled", summary.reconciled),
        ("Created", summary.created),
        ("Updated", summary.updated),
        ("Split (not handled)", summary.split_rejected),
    ]);
    if summary.split_rejected > 0 {
        output::warning("Split transactions were left alone; reconcile them by hand.");
    }
    output::success(&format!(
        "{} rows written to the ledger",
        summary.created + summary.updated
    ));
    Ok(())
}

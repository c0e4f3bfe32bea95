//! Convert command - turn statement exports into matchable CSV
//!
//! Output goes to stdout with the header
//! `Account,Date,Description,Payments,Receipts,Running`.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use ledgerlink_core::adapters::{barclays, reexport};

use crate::output;

#[derive(Subcommand)]
pub enum ConvertCommands {
    /// Convert pipe-delimited Barclays statement exports
    Barclays {
        /// Export files, written in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Re-format a Firefly III CSV export
    Reexport {
        /// Firefly export file
        #[arg(long = "csv")]
        file: PathBuf,
        /// Value of the Account column
        #[arg(long)]
        acc: String,
    },
}

pub fn run(command: ConvertCommands) -> Result<()> {
    let mut out = csv::Writer::from_writer(std::io::stdout());
    barclays::write_header(&mut out)?;

    match command {
        ConvertCommands::Barclays { files } => {
            for path in files {
                let file =
                    File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
                let summary = barclays::convert(file, &mut out)
                    .with_context(|| format!("Failed to convert {:?}", path))?;
                tracing::info!(
                    path = ?path,
                    written = summary.written,
                    dropped = summary.dropped,
                    "converted"
                );
            }
        }
        ConvertCommands::Reexport { file: path, acc } => {
            let file = File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
            let summary = reexport::convert(file, &acc, &mut out)?;
            out.flush()?;
            for problem in &summary.errors {
                output::warning(problem);
            }
            if !summary.errors.is_empty() {
                anyhow::bail!(
                    "{} of {} lines could not be converted",
                    summary.errors.len(),
                    summary.errors.len() + summary.written
                );
            }
        }
    }

    out.flush()?;
    Ok(())
}

//! Link command - link reimbursements named in transaction notes

use anyhow::Result;
use colored::Colorize;

use ledgerlink_core::LinkService;

use super::ApiArgs;
use crate::output;

pub fn run(api: &ApiArgs, query: &str) -> Result<()> {
    let service = LinkService::new(api.client()?);
    let summary = service.link(query)?;

    eprintln!("{}", "Link Summary".bold());
    output::counts(&[
        ("Transactions with targets", summary.transactions),
        ("Links created", summary.created),
        ("Targets not found", summary.not_found),
        ("Links failed", summary.failed),
    ]);
    if summary.not_found + summary.failed > 0 {
        output::warning("Some links were not created; see the log above.");
    }
    Ok(())
}

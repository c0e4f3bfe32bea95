//! Version command - show the Firefly III version

use anyhow::Result;

use ledgerlink_core::Ledger;

use super::ApiArgs;

pub fn run(api: &ApiArgs) -> Result<()> {
    let about = api.client()?.about()?;
    tracing::info!(version = %about.version, api_version = %about.api_version, "about");
    println!("{}", serde_json::to_string_pretty(&about)?);
    Ok(())
}

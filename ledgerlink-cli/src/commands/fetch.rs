//! Fetch command - raw request against the Firefly III API

use anyhow::{Context, Result};

use ledgerlink_core::Ledger;

use super::ApiArgs;

pub fn run(api: &ApiArgs, path: &str, query: &[String], method: &str) -> Result<()> {
    let pairs = parse_pairs(query)?;
    let client = api.client()?;
    let value = client
        .raw(method, path, &pairs)
        .with_context(|| format!("{} {}", method.to_uppercase(), path))?;
    if value.is_null() {
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Split `key=value` arguments
fn parse_pairs(query: &[String]) -> Result<Vec<(String, String)>> {
    query
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("query parameter {:?} is not key=value", pair))?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

//! Ledger port - the remote bookkeeping service

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::result::Result;
use crate::domain::{LedgerEntry, LedgerTransaction, TransactionLink};

/// Server information from `GET about`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AboutInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub os: String,
}

/// Query and command protocol of the ledger
///
/// Every call blocks until the ledger answers. Errors are transport or
/// protocol failures; an empty search is not an error.
pub trait Ledger {
    /// Run a search-language query, returning matching entries in order
    fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<LedgerEntry>>;

    /// Fetch one entry by id
    fn get(&self, id: u64) -> Result<LedgerEntry>;

    /// Create a new entry holding a single split
    fn create(&self, transaction: &LedgerTransaction) -> Result<LedgerEntry>;

    /// Replace the split of entry `id`
    fn update(&self, id: u64, transaction: &LedgerTransaction) -> Result<LedgerEntry>;

    /// Relate two transaction journals
    fn create_link(&self, link: &TransactionLink) -> Result<JsonValue>;

    /// Server version information
    fn about(&self) -> Result<AboutInfo>;

    /// Untyped request against any API path, for inspection
    fn raw(&self, method: &str, path: &str, query: &[(String, String)]) -> Result<JsonValue>;
}

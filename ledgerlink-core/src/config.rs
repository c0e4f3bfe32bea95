//! Configuration management
//!
//! Run settings come from the command line; the account mapping table lives
//! in a JSON file in the ledgerlink directory (`mappings.json`), either as an
//! object:
//! ```json
//! { "TESCO": 42, "SAINSBURY": 43 }
//! ```
//! or, when the match order matters, as a list:
//! ```json
//! [ { "pattern": "TFL TRAVEL", "account_id": 51 }, { "pattern": "TFL", "account_id": 50 } ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result};

/// Default idempotency tag
pub const DEFAULT_TAG: &str = "gdpr";

/// Default statement date format (`01 Jan 24`)
pub const DEFAULT_DATE_FORMAT: &str = "%d %b %y";

/// Where each field lives in a statement row (1-based columns)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    pub date: usize,
    pub description: usize,
    /// Signed amount, or receipts when a withdrawal column is set
    pub amount: usize,
    /// Payments column, if the statement splits directions
    #[serde(default)]
    pub withdrawal: Option<usize>,
    /// chrono format string for the date column
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl ColumnLayout {
    /// Reject column numbers that cannot address a field
    pub fn validate(&self) -> Result<()> {
        let columns = [
            ("date", Some(self.date)),
            ("description", Some(self.description)),
            ("amount", Some(self.amount)),
            ("withdrawal", self.withdrawal),
        ];
        for (name, column) in columns {
            if column == Some(0) {
                return Err(Error::config(format!(
                    "{} column must be one-indexed, got 0",
                    name
                )));
            }
        }
        if self.date_format.trim().is_empty() {
            return Err(Error::config("date format cannot be empty"));
        }
        Ok(())
    }
}

/// Settings for one reconciliation run
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Ledger id of the account the statement belongs to
    pub account_id: u64,
    /// Accounts owned by the same person; a new transaction between two of
    /// them is a transfer
    pub asset_ids: Vec<u64>,
    /// Keep stored descriptions instead of asking for a replacement
    pub keep_description: bool,
    /// Idempotency tag applied to every write and excluded from searches
    pub tag: String,
    pub layout: ColumnLayout,
    /// Description prefix of transfers that land on an unpredictable day
    pub approx_transfer: Option<String>,
    /// First row to process (1-based)
    pub start: usize,
}

impl MatchConfig {
    pub fn new(account_id: u64, layout: ColumnLayout) -> Self {
        Self {
            account_id,
            asset_ids: Vec::new(),
            keep_description: true,
            tag: DEFAULT_TAG.to_string(),
            layout,
            approx_transfer: None,
            start: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        if self.tag.trim().is_empty() {
            return Err(Error::config("tag cannot be empty"));
        }
        if self.tag.contains(char::is_whitespace) {
            return Err(Error::config(format!(
                "tag {:?} cannot contain whitespace",
                self.tag
            )));
        }
        Ok(())
    }
}

/// Firefly III connection settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub endpoint: Url,
    pub token: String,
}

impl ApiConfig {
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| Error::config(format!("Invalid URL: {}", e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::config("Firefly URL must use http or https"));
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::config("Access token cannot be empty"));
        }
        Ok(Self {
            endpoint,
            token: token.to_string(),
        })
    }
}

/// Raw mapping file: an object or an ordered list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Ordered(Vec<MappingRule>),
    Keyed(BTreeMap<String, u64>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub pattern: String,
    pub account_id: u64,
}

/// Description substring → counterparty account id
///
/// Consulted before asking the operator for a counterparty. Read-only for
/// the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountMapping {
    rules: Vec<MappingRule>,
}

impl AccountMapping {
    /// Load the mapping file; a missing file is an empty mapping
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let rules = match serde_json::from_str::<MappingFile>(content)? {
            MappingFile::Ordered(rules) => rules,
            MappingFile::Keyed(map) => map
                .into_iter()
                .map(|(pattern, account_id)| MappingRule { pattern, account_id })
                .collect(),
        };
        if rules.iter().any(|r| r.pattern.is_empty()) {
            return Err(Error::config("mapping patterns cannot be empty"));
        }
        Ok(Self { rules })
    }

    /// First rule whose pattern the description contains
    pub fn lookup(&self, description: &str) -> Option<u64> {
        self.rules
            .iter()
            .find(|r| description.contains(&r.pattern))
            .map(|r| r.account_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ColumnLayout {
        ColumnLayout {
            date: 2,
            description: 3,
            amount: 5,
            withdrawal: Some(4),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    #[test]
    fn test_mapping_from_object() {
        let mapping = AccountMapping::from_json(r#"{"TESCO": 42, "SAINSBURY": 43}"#).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.lookup("TESCO STORES 1234"), Some(42));
        assert_eq!(mapping.lookup("AMAZON"), None);
    }

    #[test]
    fn test_mapping_list_keeps_order() {
        let mapping = AccountMapping::from_json(
            r#"[{"pattern": "TFL TRAVEL", "account_id": 51}, {"pattern": "TFL", "account_id": 50}]"#,
        )
        .unwrap();
        assert_eq!(mapping.lookup("TFL TRAVEL CH"), Some(51));
        assert_eq!(mapping.lookup("TFL CYCLE HIRE"), Some(50));
    }

    #[test]
    fn test_mapping_rejects_empty_pattern() {
        assert!(AccountMapping::from_json(r#"{"": 1}"#).is_err());
    }

    #[test]
    fn test_missing_mapping_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = AccountMapping::load(&dir.path().join("mappings.json")).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_mapping_file_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, r#"{"TESCO": 42}"#).unwrap();
        let mapping = AccountMapping::load(&path).unwrap();
        assert_eq!(mapping.lookup("TESCO"), Some(42));
    }

    #[test]
    fn test_layout_rejects_zero_column() {
        let mut layout = layout();
        assert!(layout.validate().is_ok());
        layout.withdrawal = Some(0);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_match_config_defaults() {
        let config = MatchConfig::new(7, layout());
        assert_eq!(config.tag, "gdpr");
        assert!(config.keep_description);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_match_config_rejects_bad_tag() {
        let mut config = MatchConfig::new(7, layout());
        config.tag = "two words".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_config() {
        assert!(ApiConfig::new("https://firefly.example.com", "token").is_ok());
        assert!(ApiConfig::new("ftp://firefly.example.com", "token").is_err());
        assert!(ApiConfig::new("https://firefly.example.com", "  ").is_err());
        assert!(ApiConfig::new("not a url", "token").is_err());
    }
}

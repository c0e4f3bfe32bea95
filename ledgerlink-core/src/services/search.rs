//! Candidate search - find ledger entries that may be a statement row
//!
//! Queries use the Firefly search language:
//!
//! ```text
//! account_id:7 date_on:2024-01-01 amount:12.50 -tag_is:gdpr
//! ```
//!
//! The `-tag_is` clause hides everything a previous run already reconciled,
//! so a row is matched against an entry at most once.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::MatchConfig;
use crate::domain::result::Result;
use crate::domain::{LedgerEntry, StatementRecord};
use crate::ports::Ledger;

/// Builds and runs candidate queries for one tracked account
#[derive(Debug, Clone)]
pub struct CandidateSearch {
    account_id: u64,
    tag: String,
    approx_transfer: Option<String>,
}

impl CandidateSearch {
    pub fn new(account_id: u64, tag: impl Into<String>, approx_transfer: Option<String>) -> Self {
        Self {
            account_id,
            tag: tag.into(),
            approx_transfer: approx_transfer.filter(|p| !p.is_empty()),
        }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.account_id, &config.tag, config.approx_transfer.clone())
    }

    /// True when the row is a transfer whose posting day is unpredictable
    pub fn is_approx_transfer(&self, record: &StatementRecord) -> bool {
        self.approx_transfer
            .as_deref()
            .is_some_and(|prefix| record.description.starts_with(prefix))
    }

    /// Query text for one date
    pub fn query(&self, date: NaiveDate, amount: &Decimal, approx: bool) -> String {
        let date = if approx {
            format!("{} type:\"Transfer\"", date.format("%Y-%m-xx"))
        } else {
            date.format("%Y-%m-%d").to_string()
        };
        format!(
            "account_id:{} date_on:{} amount:{} -tag_is:{}",
            self.account_id, date, amount, self.tag
        )
    }

    /// Search at the record's date, then once more at its fallback date
    ///
    /// Any ledger error is returned as is; nothing found is an empty list.
    pub fn find(&self, ledger: &dyn Ledger, record: &StatementRecord) -> Result<Vec<LedgerEntry>> {
        let approx = self.is_approx_transfer(record);
        let query = self.query(record.date, &record.amount, approx);
        let entries = ledger.search(&query, None)?;
        if !entries.is_empty() {
            return Ok(entries);
        }

        match record.fallback_date() {
            Some(fallback) => {
                info!(
                    date = %record.date,
                    fallback = %fallback,
                    "no transactions found, retrying with payment date"
                );
                let query = self.query(fallback, &record.amount, false);
                ledger.search(&query, None)
            }
            None => Ok(entries),
        }
    }

    /// Query text for tagged entries a run wrote for a row paid on `payment_date`
    pub fn reconciled_query(&self, payment_date: NaiveDate, amount: &Decimal) -> String {
        format!(
            "account_id:{} payment_date_on:{} amount:{} tag_is:{}",
            self.account_id,
            payment_date.format("%Y-%m-%d"),
            amount,
            self.tag
        )
    }

    /// Count tagged entries that were written for a row like this one
    ///
    /// Every write stamps the row's payment date, so the count only sees
    /// entries written for rows paid that day, whatever their booking date.
    pub fn count_reconciled(&self, ledger: &dyn Ledger, record: &StatementRecord) -> Result<usize> {
        let query = self.reconciled_query(record.payment_date, &record.amount);
        Ok(ledger.search(&query, None)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_query_excludes_tag() {
        let search = CandidateSearch::new(7, "gdpr", None);
        assert_eq!(
            search.query(ymd(2024, 1, 1), &Decimal::new(1250, 2), false),
            "account_id:7 date_on:2024-01-01 amount:12.50 -tag_is:gdpr"
        );
    }

    #[test]
    fn test_reconciled_query_uses_payment_date() {
        let search = CandidateSearch::new(7, "gdpr", Some("TRANSFER FROM".to_string()));
        assert_eq!(
            search.reconciled_query(ymd(2024, 3, 4), &Decimal::new(320, 2)),
            "account_id:7 payment_date_on:2024-03-04 amount:3.20 tag_is:gdpr"
        );
    }

    #[test]
    fn test_approx_transfer_query_shape() {
        let search = CandidateSearch::new(7, "gdpr", Some("TRANSFER FROM".to_string()));
        assert_eq!(
            search.query(ymd(2024, 3, 20), &Decimal::new(50000, 2), true),
            "account_id:7 date_on:2024-03-xx type:\"Transfer\" amount:500.00 -tag_is:gdpr"
        );
    }

    #[test]
    fn test_empty_approx_prefix_is_disabled() {
        let search = CandidateSearch::new(7, "gdpr", Some(String::new()));
        assert!(search.approx_transfer.is_none());
    }
}

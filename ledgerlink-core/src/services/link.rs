//! Link service - relate reimbursements to the transactions they repay
//!
//! A transaction whose notes read `<share> <ext>|<ext>...` was (partly)
//! reimbursed by the transactions with those external ids. Each pair becomes
//! a "Reimburses" link in the ledger.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::domain::result::Result;
use crate::domain::transaction::LINK_TYPE_REIMBURSES;
use crate::domain::{LedgerTransaction, TransactionLink};
use crate::ports::Ledger;

/// Search page size; large enough to take every note-bearing transaction at once
const SEARCH_LIMIT: u32 = 65536;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    /// Transactions whose notes named at least one external id
    pub transactions: usize,
    pub created: usize,
    /// External ids with no transaction in the ledger
    pub not_found: usize,
    pub failed: usize,
}

pub struct LinkService {
    ledger: Arc<dyn Ledger>,
}

impl LinkService {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Link every transaction matched by `query` to the external ids in its
    /// notes
    ///
    /// Search failures are fatal; a missing target or a rejected link is
    /// logged and counted.
    pub fn link(&self, query: &str) -> Result<LinkSummary> {
        let mut summary = LinkSummary::default();
        let entries = self.ledger.search(query, Some(SEARCH_LIMIT))?;

        for transaction in entries.into_iter().flat_map(|e| e.into_splits()) {
            let Some((share, targets)) = parse_notes(&transaction) else {
                continue;
            };
            let Some(journal_id) = transaction.journal_id else {
                warn!(notes = ?transaction.notes, "transaction without journal id");
                continue;
            };
            if share == "0.0" {
                warn!(id = journal_id, targets, "expected 0% split");
            }
            summary.transactions += 1;

            for external in targets.split('|').map(str::trim).filter(|s| !s.is_empty()) {
                info!(id = journal_id, external, "link");
                self.link_one(journal_id, external, &mut summary)?;
            }
        }

        Ok(summary)
    }

    fn link_one(&self, journal_id: u64, external: &str, summary: &mut LinkSummary) -> Result<()> {
        let query = format!("external_id_is:{}", external);
        let found = self
            .ledger
            .search(&query, Some(1))?
            .into_iter()
            .flat_map(|e| e.into_splits())
            .find_map(|t| t.journal_id);
        let Some(inward_id) = found else {
            error!(id = journal_id, external, "no transaction found");
            summary.not_found += 1;
            return Ok(());
        };

        let link = TransactionLink {
            link_type: LINK_TYPE_REIMBURSES,
            inward_id,
            outward_id: journal_id,
        };
        info!(inward_id, outward_id = journal_id, "creating link");
        match self.ledger.create_link(&link) {
            Ok(_) => summary.created += 1,
            Err(e) => {
                error!(id = journal_id, error = %e, "failed to create link");
                summary.failed += 1;
            }
        }
        Ok(())
    }
}

/// Split notes into the share and the external id list
fn parse_notes(transaction: &LedgerTransaction) -> Option<(&str, &str)> {
    let notes = transaction.notes.as_deref()?;
    let (share, targets) = notes.split_once(' ')?;
    Some((share, targets.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;
    use crate::domain::{EntryAttributes, LedgerEntry, TransactionType};
    use crate::ports::AboutInfo;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::{json, Value as JsonValue};
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct Notes {
        reimbursed: Vec<LedgerEntry>,
        by_external: HashMap<String, u64>,
        reject: Option<u64>,
        links: RefCell<Vec<TransactionLink>>,
    }

    fn entry(journal_id: u64, notes: Option<&str>) -> LedgerEntry {
        let mut t = LedgerTransaction::new(
            TransactionType::Withdrawal,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "dinner",
            Decimal::new(6000, 2),
        );
        t.journal_id = Some(journal_id);
        t.notes = notes.map(str::to_string);
        LedgerEntry {
            id: journal_id,
            attributes: EntryAttributes {
                group_title: None,
                transactions: vec![t],
            },
        }
    }

    impl Ledger for Notes {
        fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<LedgerEntry>> {
            match query.strip_prefix("external_id_is:") {
                Some(external) => {
                    assert_eq!(limit, Some(1));
                    Ok(self
                        .by_external
                        .get(external)
                        .map(|id| vec![entry(*id, None)])
                        .unwrap_or_default())
                }
                None => {
                    assert_eq!(limit, Some(SEARCH_LIMIT));
                    Ok(self.reimbursed.clone())
                }
            }
        }
        fn get(&self, _id: u64) -> Result<LedgerEntry> {
            unimplemented!()
        }
        fn create(&self, _t: &LedgerTransaction) -> Result<LedgerEntry> {
            unimplemented!()
        }
        fn update(&self, _id: u64, _t: &LedgerTransaction) -> Result<LedgerEntry> {
            unimplemented!()
        }
        fn create_link(&self, link: &TransactionLink) -> Result<JsonValue> {
            if Some(link.inward_id) == self.reject {
                return Err(Error::Ledger {
                    status: 422,
                    body: "duplicate link".to_string(),
                });
            }
            self.links.borrow_mut().push(link.clone());
            Ok(json!({"id": "1"}))
        }
        fn about(&self) -> Result<AboutInfo> {
            unimplemented!()
        }
        fn raw(&self, _m: &str, _p: &str, _q: &[(String, String)]) -> Result<JsonValue> {
            unimplemented!()
        }
    }

    #[test]
    fn test_links_each_external_id() {
        let ledger = Arc::new(Notes {
            reimbursed: vec![entry(10, Some("0.5 ext-a|ext-b")), entry(11, None)],
            by_external: HashMap::from([("ext-a".to_string(), 20), ("ext-b".to_string(), 21)]),
            reject: None,
            links: RefCell::new(Vec::new()),
        });
        let summary = LinkService::new(ledger.clone()).link("has_any_notes:true").unwrap();
        assert_eq!(summary.transactions, 1);
        assert_eq!(summary.created, 2);

        let links = ledger.links.borrow();
        assert_eq!(
            links[0],
            TransactionLink {
                link_type: 3,
                inward_id: 20,
                outward_id: 10
            }
        );
        assert_eq!(links[1].inward_id, 21);
    }

    #[test]
    fn test_missing_target_and_rejected_link_continue() {
        let ledger = Arc::new(Notes {
            reimbursed: vec![entry(10, Some("0.0 ext-a|ext-missing|ext-c"))],
            by_external: HashMap::from([("ext-a".to_string(), 20), ("ext-c".to_string(), 22)]),
            reject: Some(20),
            links: RefCell::new(Vec::new()),
        });
        let summary = LinkService::new(ledger.clone()).link("has_any_notes:true").unwrap();
        assert_eq!(
            summary,
            LinkSummary {
                transactions: 1,
                created: 1,
                not_found: 1,
                failed: 1
            }
        );
        assert_eq!(ledger.links.borrow()[0].inward_id, 22);
    }
}

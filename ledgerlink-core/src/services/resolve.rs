//! Disambiguation resolver
//!
//! Turns a [`MatchOutcome`] into the transaction to write. The mapping table
//! is tried first; the operator is only asked when it has no answer.

use tracing::{debug, info};

use crate::config::{AccountMapping, MatchConfig};
use crate::domain::result::{Error, Result};
use crate::domain::{classify_single, LedgerTransaction, MatchOutcome, StatementRecord, TransactionType};
use crate::ports::{Ledger, Prompter};

/// What to do with a row once every question is answered
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Update this ledger transaction; `top_id` is set
    Existing(LedgerTransaction),
    /// Create this transaction
    New(LedgerTransaction),
    /// The target is a split entry; leave the row alone
    SplitRejected { top_id: u64 },
}

pub struct Resolver {
    account_id: u64,
    asset_ids: Vec<u64>,
    mapping: AccountMapping,
}

impl Resolver {
    pub fn new(account_id: u64, asset_ids: Vec<u64>, mapping: AccountMapping) -> Self {
        Self {
            account_id,
            asset_ids,
            mapping,
        }
    }

    pub fn from_config(config: &MatchConfig, mapping: AccountMapping) -> Self {
        Self::new(config.account_id, config.asset_ids.clone(), mapping)
    }

    /// Resolve one classified row
    pub fn resolve(
        &self,
        outcome: MatchOutcome,
        record: &StatementRecord,
        ledger: &dyn Ledger,
        prompter: &mut dyn Prompter,
    ) -> Result<Resolution> {
        match outcome {
            MatchOutcome::ExactMatch(transaction) => Ok(Resolution::Existing(transaction)),
            MatchOutcome::SplitRejected { top_id } => Ok(Resolution::SplitRejected { top_id }),
            MatchOutcome::NoMatch => self.resolve_no_match(record, ledger, prompter),
            MatchOutcome::AmbiguousMatch(candidates) => {
                self.resolve_ambiguous(candidates, record, prompter)
            }
        }
    }

    fn resolve_no_match(
        &self,
        record: &StatementRecord,
        ledger: &dyn Ledger,
        prompter: &mut dyn Prompter,
    ) -> Result<Resolution> {
        if let Some(counterparty) = self.mapping.lookup(&record.description) {
            info!(counterparty, "counterparty found in mapping");
            return Ok(Resolution::New(self.new_transaction(record, counterparty)));
        }

        let title = record.title();
        let existing = prompter.ask_integer(
            &format!("{}: no match, link to an existing transaction?", title),
            "transaction id, empty to create a new one",
        )?;
        if let Some(id) = existing.filter(|&id| id != 0) {
            debug!(id, "fetching transaction named by operator");
            let entry = ledger.get(id)?;
            return match classify_single(entry) {
                MatchOutcome::ExactMatch(transaction) => Ok(Resolution::Existing(transaction)),
                MatchOutcome::SplitRejected { top_id } => Ok(Resolution::SplitRejected { top_id }),
                _ => Err(Error::decode(format!("transaction {} has no splits", id))),
            };
        }

        self.ask_counterparty(record, prompter)
    }

    fn resolve_ambiguous(
        &self,
        candidates: Vec<LedgerTransaction>,
        record: &StatementRecord,
        prompter: &mut dyn Prompter,
    ) -> Result<Resolution> {
        let labels: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        let picked = prompter.pick_one(
            &format!("{}: several transactions match", record.title()),
            &labels,
        )?;
        match picked.and_then(|index| candidates.into_iter().nth(index)) {
            Some(transaction) => Ok(Resolution::Existing(transaction)),
            None => self.ask_counterparty(record, prompter),
        }
    }

    fn ask_counterparty(
        &self,
        record: &StatementRecord,
        prompter: &mut dyn Prompter,
    ) -> Result<Resolution> {
        let counterparty = prompter
            .ask_integer(
                &format!("{}: new transaction", record.title()),
                "opposing account id",
            )?
            .filter(|&id| id != 0)
            .ok_or(Error::Cancelled)?;
        Ok(Resolution::New(self.new_transaction(record, counterparty)))
    }

    /// Build a new transaction between the tracked account and `counterparty`
    ///
    /// Money leaving the tracked account is a withdrawal to the
    /// counterparty, anything else a deposit from it. Between two asset
    /// accounts it is a transfer either way.
    pub fn new_transaction(&self, record: &StatementRecord, counterparty: u64) -> LedgerTransaction {
        let (source, destination, kind) = if record.is_payment {
            (self.account_id, counterparty, TransactionType::Withdrawal)
        } else {
            (counterparty, self.account_id, TransactionType::Deposit)
        };
        let kind = if self.is_asset(source) && self.is_asset(destination) {
            TransactionType::Transfer
        } else {
            kind
        };

        let mut transaction =
            LedgerTransaction::new(kind, record.date, &record.description, record.amount);
        transaction.source_id = Some(source);
        transaction.destination_id = Some(destination);
        transaction
    }

    fn is_asset(&self, account_id: u64) -> bool {
        self.asset_ids.contains(&account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryAttributes, LedgerEntry, TransactionLink};
    use crate::ports::AboutInfo;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::Value as JsonValue;
    use std::collections::VecDeque;

    /// Prompter replaying canned answers in order
    #[derive(Default)]
    struct Script {
        picks: VecDeque<Option<usize>>,
        integers: VecDeque<Option<u64>>,
        titles: Vec<String>,
    }

    impl Prompter for Script {
        fn pick_one(&mut self, title: &str, _labels: &[String]) -> Result<Option<usize>> {
            self.titles.push(title.to_string());
            Ok(self.picks.pop_front().expect("unexpected pick"))
        }

        fn ask_integer(&mut self, title: &str, _placeholder: &str) -> Result<Option<u64>> {
            self.titles.push(title.to_string());
            Ok(self.integers.pop_front().expect("unexpected integer prompt"))
        }

        fn ask_text(&mut self, _title: &str, _prefill: &str) -> Result<Option<String>> {
            panic!("unexpected text prompt")
        }
    }

    /// Ledger that only knows how to `get` one entry
    struct OneEntry(Option<LedgerEntry>);

    impl Ledger for OneEntry {
        fn search(&self, _query: &str, _limit: Option<u32>) -> Result<Vec<LedgerEntry>> {
            Ok(Vec::new())
        }
        fn get(&self, id: u64) -> Result<LedgerEntry> {
            self.0.clone().ok_or(Error::Ledger {
                status: 404,
                body: format!("no transaction {}", id),
            })
        }
        fn create(&self, _t: &LedgerTransaction) -> Result<LedgerEntry> {
            unimplemented!()
        }
        fn update(&self, _id: u64, _t: &LedgerTransaction) -> Result<LedgerEntry> {
            unimplemented!()
        }
        fn create_link(&self, _link: &TransactionLink) -> Result<JsonValue> {
            unimplemented!()
        }
        fn about(&self) -> Result<AboutInfo> {
            unimplemented!()
        }
        fn raw(&self, _m: &str, _p: &str, _q: &[(String, String)]) -> Result<JsonValue> {
            unimplemented!()
        }
    }

    fn record(description: &str, is_payment: bool) -> StatementRecord {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        StatementRecord {
            row: 3,
            raw_date: "01 Jan 24".to_string(),
            date,
            process_date: date,
            payment_date: date,
            posted_date: date,
            description: description.to_string(),
            amount: Decimal::new(1250, 2),
            is_payment,
        }
    }

    fn candidate(top_id: u64, journal_id: u64) -> LedgerTransaction {
        let mut t = LedgerTransaction::new(
            TransactionType::Withdrawal,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "candidate",
            Decimal::new(1250, 2),
        );
        t.journal_id = Some(journal_id);
        t.top_id = Some(top_id);
        t
    }

    fn resolver(mapping: &str) -> Resolver {
        Resolver::new(7, vec![7, 8], AccountMapping::from_json(mapping).unwrap())
    }

    #[test]
    fn test_mapping_hit_needs_no_prompt() {
        let mut script = Script::default();
        let resolution = resolver(r#"{"TESCO": 42}"#)
            .resolve(MatchOutcome::NoMatch, &record("TESCO STORES", true), &OneEntry(None), &mut script)
            .unwrap();
        match resolution {
            Resolution::New(t) => {
                assert_eq!(t.kind, TransactionType::Withdrawal);
                assert_eq!(t.source_id, Some(7));
                assert_eq!(t.destination_id, Some(42));
                assert_eq!(t.amount, Decimal::new(1250, 2));
            }
            other => panic!("expected new transaction, got {:?}", other),
        }
        assert!(script.titles.is_empty());
    }

    #[test]
    fn test_deposit_reverses_direction() {
        let mut script = Script::default();
        script.integers.extend([None, Some(99)]);
        let resolution = resolver("{}")
            .resolve(MatchOutcome::NoMatch, &record("REFUND", false), &OneEntry(None), &mut script)
            .unwrap();
        match resolution {
            Resolution::New(t) => {
                assert_eq!(t.kind, TransactionType::Deposit);
                assert_eq!(t.source_id, Some(99));
                assert_eq!(t.destination_id, Some(7));
            }
            other => panic!("expected new transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_between_assets_is_transfer() {
        let t = resolver("{}").new_transaction(&record("SAVINGS", true), 8);
        assert_eq!(t.kind, TransactionType::Transfer);
        assert_eq!(t.source_id, Some(7));
        assert_eq!(t.destination_id, Some(8));
    }

    #[test]
    fn test_empty_counterparty_cancels() {
        let mut script = Script::default();
        script.integers.extend([None, None]);
        let err = resolver("{}")
            .resolve(MatchOutcome::NoMatch, &record("UNKNOWN", true), &OneEntry(None), &mut script)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_zero_is_an_empty_answer() {
        let mut script = Script::default();
        script.integers.extend([Some(0), Some(0)]);
        let err = resolver("{}")
            .resolve(MatchOutcome::NoMatch, &record("UNKNOWN", true), &OneEntry(None), &mut script)
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(script.titles.len(), 2);
        assert!(script.titles[1].ends_with("new transaction"));
    }

    #[test]
    fn test_operator_names_existing_transaction() {
        let mut script = Script::default();
        script.integers.push_back(Some(55));
        let entry = LedgerEntry {
            id: 55,
            attributes: EntryAttributes {
                group_title: None,
                transactions: vec![candidate(0, 550)],
            },
        };
        let resolution = resolver("{}")
            .resolve(MatchOutcome::NoMatch, &record("UNKNOWN", true), &OneEntry(Some(entry)), &mut script)
            .unwrap();
        match resolution {
            Resolution::Existing(t) => {
                assert_eq!(t.top_id, Some(55));
                assert_eq!(t.journal_id, Some(550));
            }
            other => panic!("expected existing transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_names_split_transaction() {
        let mut script = Script::default();
        script.integers.push_back(Some(55));
        let entry = LedgerEntry {
            id: 55,
            attributes: EntryAttributes {
                group_title: Some("split".to_string()),
                transactions: vec![candidate(0, 550), candidate(0, 551)],
            },
        };
        let resolution = resolver("{}")
            .resolve(MatchOutcome::NoMatch, &record("UNKNOWN", true), &OneEntry(Some(entry)), &mut script)
            .unwrap();
        assert_eq!(resolution, Resolution::SplitRejected { top_id: 55 });
    }

    #[test]
    fn test_ambiguous_pick() {
        let mut script = Script::default();
        script.picks.push_back(Some(1));
        let outcome = MatchOutcome::AmbiguousMatch(vec![candidate(10, 100), candidate(20, 200)]);
        let resolution = resolver("{}")
            .resolve(outcome, &record("TESCO", true), &OneEntry(None), &mut script)
            .unwrap();
        match resolution {
            Resolution::Existing(t) => assert_eq!(t.top_id, Some(20)),
            other => panic!("expected existing transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_none_goes_to_counterparty() {
        let mut script = Script::default();
        script.picks.push_back(None);
        script.integers.push_back(Some(42));
        let outcome = MatchOutcome::AmbiguousMatch(vec![candidate(10, 100), candidate(20, 200)]);
        let resolution = resolver(r#"{"TESCO": 43}"#)
            .resolve(outcome, &record("TESCO", true), &OneEntry(None), &mut script)
            .unwrap();
        match resolution {
            Resolution::New(t) => assert_eq!(t.destination_id, Some(42)),
            other => panic!("expected new transaction, got {:?}", other),
        }
        assert_eq!(script.titles.len(), 2);
    }
}

//! Match classification
//!
//! Turns the entries a candidate search returned into a [`MatchOutcome`].

use crate::domain::transaction::{LedgerEntry, LedgerTransaction};

/// What a search said about a statement row
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Nothing in the ledger looks like this row
    NoMatch,
    /// Exactly one unsplit entry; `top_id` is set
    ExactMatch(LedgerTransaction),
    /// Several candidates, flattened across entries, each with its `top_id`
    AmbiguousMatch(Vec<LedgerTransaction>),
    /// Exactly one entry, but it is a split and cannot be resolved safely
    SplitRejected { top_id: u64 },
}

/// Classify search results
pub fn classify(mut entries: Vec<LedgerEntry>) -> MatchOutcome {
    if entries.len() > 1 {
        return MatchOutcome::AmbiguousMatch(
            entries.into_iter().flat_map(LedgerEntry::into_splits).collect(),
        );
    }
    match entries.pop() {
        Some(entry) => classify_single(entry),
        None => MatchOutcome::NoMatch,
    }
}

/// Classify an entry that is known to be the only candidate
///
/// Also used when the operator names an entry by id.
pub fn classify_single(entry: LedgerEntry) -> MatchOutcome {
    if entry.splits().len() != 1 {
        return MatchOutcome::SplitRejected { top_id: entry.id };
    }
    match entry.into_splits().pop() {
        Some(split) => MatchOutcome::ExactMatch(split),
        None => MatchOutcome::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{EntryAttributes, TransactionType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn split(journal_id: u64) -> LedgerTransaction {
        let mut t = LedgerTransaction::new(
            TransactionType::Withdrawal,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            format!("split {}", journal_id),
            Decimal::new(1250, 2),
        );
        t.journal_id = Some(journal_id);
        t
    }

    fn entry(id: u64, journals: &[u64]) -> LedgerEntry {
        LedgerEntry {
            id,
            attributes: EntryAttributes {
                group_title: None,
                transactions: journals.iter().map(|j| split(*j)).collect(),
            },
        }
    }

    #[test]
    fn test_zero_is_no_match() {
        assert_eq!(classify(vec![]), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_single_entry_is_exact() {
        match classify(vec![entry(10, &[100])]) {
            MatchOutcome::ExactMatch(t) => {
                assert_eq!(t.journal_id, Some(100));
                assert_eq!(t.top_id, Some(10));
            }
            other => panic!("expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_single_split_entry_is_rejected() {
        assert_eq!(
            classify(vec![entry(10, &[100, 101])]),
            MatchOutcome::SplitRejected { top_id: 10 }
        );
    }

    #[test]
    fn test_empty_entry_is_rejected() {
        assert_eq!(
            classify(vec![entry(10, &[])]),
            MatchOutcome::SplitRejected { top_id: 10 }
        );
    }

    #[test]
    fn test_many_entries_flatten_with_parent_ids() {
        match classify(vec![entry(10, &[100]), entry(20, &[200, 201])]) {
            MatchOutcome::AmbiguousMatch(candidates) => {
                let ids: Vec<_> = candidates.iter().map(|c| (c.top_id, c.journal_id)).collect();
                assert_eq!(
                    ids,
                    vec![
                        (Some(10), Some(100)),
                        (Some(20), Some(200)),
                        (Some(20), Some(201)),
                    ]
                );
            }
            other => panic!("expected ambiguous match, got {:?}", other),
        }
    }
}

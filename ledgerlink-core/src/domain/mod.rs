//! Core domain entities
//!
//! Statement records, ledger transactions and match classification. Pure
//! data and pure functions - no I/O.

pub mod matching;
pub mod result;
pub mod statement;
pub mod transaction;

pub use matching::{classify, classify_single, MatchOutcome};
pub use statement::{normalize, RawRow, SkipReason, StatementRecord};
pub use transaction::{
    EntryAttributes, LedgerEntry, LedgerTransaction, TransactionLink, TransactionType,
};

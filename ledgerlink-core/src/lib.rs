//! Ledgerlink Core - reconcile bank statements against a Firefly III ledger
//!
//! This crate implements the reconciliation engine following hexagonal
//! architecture:
//!
//! - **domain**: Statement records, ledger transactions, match classification
//! - **ports**: Trait definitions for the ledger and the operator prompt
//! - **services**: Search, resolution, description reconciliation, upsert
//! - **adapters**: Concrete implementations (Firefly III, CSV statements,
//!   statement converters)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export commonly used types at crate root
pub use config::{AccountMapping, ApiConfig, ColumnLayout, MappingRule, MatchConfig};
pub use domain::result::{Error, Result};
pub use domain::{
    LedgerEntry, LedgerTransaction, MatchOutcome, RawRow, StatementRecord, TransactionLink,
    TransactionType,
};
pub use ports::{AboutInfo, Ledger, Prompter};
pub use services::{LinkService, LinkSummary, ReconcileService, RunSummary};

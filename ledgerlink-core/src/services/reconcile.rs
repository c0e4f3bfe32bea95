//! Reconciliation service - drives every statement row through search,
//! classification, resolution and the write
//!
//! Rows are handled strictly one at a time: the next row is not read until
//! the current one is written or skipped.

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, info_span, warn};

use crate::adapters::RowError;
use crate::config::{AccountMapping, MatchConfig};
use crate::domain::result::{Error, Result};
use crate::domain::{classify, normalize, RawRow, StatementRecord};
use crate::ports::{Ledger, Prompter};
use crate::services::description::reconcile_description;
use crate::services::resolve::{Resolution, Resolver};
use crate::services::search::CandidateSearch;
use crate::services::upsert::UpsertExecutor;

/// Counts for one run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Rows at or after the start row
    pub rows: usize,
    /// Malformed rows
    pub skipped: usize,
    /// Rows already reconciled by an earlier run
    pub reconciled: usize,
    pub created: usize,
    pub updated: usize,
    pub split_rejected: usize,
}

/// What happened to one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    AlreadyReconciled,
    SplitRejected,
}

/// Tagged entries per (payment date, amount) that rows of this run have
/// accounted for
type Tally = HashMap<(NaiveDate, Decimal), usize>;

pub struct ReconcileService {
    ledger: Arc<dyn Ledger>,
    config: MatchConfig,
    search: CandidateSearch,
    resolver: Resolver,
}

impl ReconcileService {
    pub fn new(ledger: Arc<dyn Ledger>, config: MatchConfig, mapping: AccountMapping) -> Result<Self> {
        config.validate()?;
        let search = CandidateSearch::from_config(&config);
        let resolver = Resolver::from_config(&config, mapping);
        Ok(Self {
            ledger,
            config,
            search,
            resolver,
        })
    }

    /// Reconcile every row the source yields
    ///
    /// Stops at the first fatal error; rows written before it stay written.
    pub fn run<I>(
        &self,
        rows: I,
        prompter: &mut dyn Prompter,
        audit: &mut dyn Write,
    ) -> Result<RunSummary>
    where
        I: IntoIterator<Item = std::result::Result<RawRow, RowError>>,
    {
        let mut summary = RunSummary::default();
        let mut tally = Tally::new();

        for item in rows {
            let raw = match item {
                Ok(raw) => raw,
                Err(RowError::FieldCount { row, expected, found }) => {
                    if row >= self.config.start {
                        warn!(row, expected, found, "skipping row with wrong number of fields");
                        summary.rows += 1;
                        summary.skipped += 1;
                    }
                    continue;
                }
                Err(RowError::Read(e)) => return Err(Error::Csv(e)),
            };
            if raw.row < self.config.start {
                continue;
            }
            summary.rows += 1;

            let record = match normalize(&raw, &self.config.layout) {
                Ok(record) => record,
                Err(reason) => {
                    warn!(row = raw.row, %reason, "skipping row");
                    summary.skipped += 1;
                    continue;
                }
            };

            let _span = info_span!("row", row = record.row).entered();
            match self.process(&record, &mut tally, prompter, audit)? {
                RowOutcome::Created => summary.created += 1,
                RowOutcome::Updated => summary.updated += 1,
                RowOutcome::AlreadyReconciled => summary.reconciled += 1,
                RowOutcome::SplitRejected => summary.split_rejected += 1,
            }
        }

        info!(
            rows = summary.rows,
            created = summary.created,
            updated = summary.updated,
            "run finished"
        );
        Ok(summary)
    }

    /// Reconcile a single normalized row
    fn process(
        &self,
        record: &StatementRecord,
        tally: &mut Tally,
        prompter: &mut dyn Prompter,
        audit: &mut dyn Write,
    ) -> Result<RowOutcome> {
        let title = record.title();
        info!(title = %title, "processing");
        let ledger = self.ledger.as_ref();
        let key = (record.payment_date, record.amount);

        let entries = self.search.find(ledger, record)?;
        if entries.is_empty() && self.consume_reconciled(record, key, tally)? {
            info!(title = %title, "already reconciled");
            return Ok(RowOutcome::AlreadyReconciled);
        }

        let outcome = classify(entries);
        let upsert = UpsertExecutor::new(ledger, &self.config.tag);
        let written = match self.resolver.resolve(outcome, record, ledger, prompter)? {
            Resolution::SplitRejected { top_id } => {
                error!(top_id, title = %title, "cannot handle split transaction");
                return Ok(RowOutcome::SplitRejected);
            }
            Resolution::Existing(mut transaction) => {
                reconcile_description(
                    &mut transaction,
                    &record.description,
                    self.config.keep_description,
                    prompter,
                    &title,
                )?;
                upsert.update(transaction, record, audit)?;
                RowOutcome::Updated
            }
            Resolution::New(transaction) => {
                upsert.create(transaction, record, audit)?;
                RowOutcome::Created
            }
        };

        *tally.entry(key).or_default() += 1;
        Ok(written)
    }

    /// True when a tagged entry for this row exists that no earlier row of
    /// this run accounts for; claims it if so
    fn consume_reconciled(
        &self,
        record: &StatementRecord,
        key: (NaiveDate, Decimal),
        tally: &mut Tally,
    ) -> Result<bool> {
        let tagged = self.search.count_reconciled(self.ledger.as_ref(), record)?;
        let claimed = tally.entry(key).or_default();
        if tagged > *claimed {
            *claimed += 1;
            return Ok(true);
        }
        Ok(false)
    }
}

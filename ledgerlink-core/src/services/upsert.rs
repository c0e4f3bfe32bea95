//! Upsert executor - the only place the engine writes to the ledger

use std::io::Write;

use serde::Serialize;
use tracing::info;

use crate::domain::result::{Error, Result};
use crate::domain::transaction::midnight;
use crate::domain::{LedgerEntry, LedgerTransaction, StatementRecord};
use crate::ports::Ledger;

/// Writes reconciled transactions and echoes each request and response as
/// one JSON line to the audit writer
pub struct UpsertExecutor<'a> {
    ledger: &'a dyn Ledger,
    tag: &'a str,
}

impl<'a> UpsertExecutor<'a> {
    pub fn new(ledger: &'a dyn Ledger, tag: &'a str) -> Self {
        Self { ledger, tag }
    }

    /// Stamp the tag and the statement's dates onto the payload
    pub fn prepare(&self, transaction: &mut LedgerTransaction, record: &StatementRecord) {
        transaction.add_tag(self.tag);
        transaction.process_date = Some(midnight(record.process_date));
        transaction.payment_date = Some(midnight(record.payment_date));
    }

    pub fn create(
        &self,
        mut transaction: LedgerTransaction,
        record: &StatementRecord,
        audit: &mut dyn Write,
    ) -> Result<LedgerEntry> {
        self.prepare(&mut transaction, record);
        write_line(audit, &transaction)?;
        let entry = self.ledger.create(&transaction)?;
        write_line(audit, &entry)?;
        info!(id = entry.id, "created transaction");
        Ok(entry)
    }

    /// Update the parent entry of `transaction`
    pub fn update(
        &self,
        mut transaction: LedgerTransaction,
        record: &StatementRecord,
        audit: &mut dyn Write,
    ) -> Result<LedgerEntry> {
        let top_id = transaction
            .top_id
            .ok_or_else(|| Error::decode("transaction to update has no parent entry id"))?;
        self.prepare(&mut transaction, record);
        write_line(audit, &transaction)?;
        let entry = self.ledger.update(top_id, &transaction)?;
        write_line(audit, &entry)?;
        info!(id = top_id, "updated transaction");
        Ok(entry)
    }
}

fn write_line<T: Serialize>(audit: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *audit, value)?;
    audit.write_all(b"\n")?;
    Ok(())
}

//! Description reconciler - decide which description an existing
//! transaction keeps

use tracing::debug;

use crate::domain::result::Result;
use crate::domain::LedgerTransaction;
use crate::ports::Prompter;

/// What Firefly stores when a transaction was created without a description
pub const EMPTY_DESCRIPTION: &str = "(empty description)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionChange {
    /// The placeholder was replaced with the statement text
    Filled,
    /// The stored description stays
    Unchanged,
    /// The operator typed a new description
    Replaced,
}

/// Reconcile the stored description with the statement's
///
/// `keep_existing` suppresses the prompt, but never keeps the placeholder.
pub fn reconcile_description(
    transaction: &mut LedgerTransaction,
    statement_description: &str,
    keep_existing: bool,
    prompter: &mut dyn Prompter,
    title: &str,
) -> Result<DescriptionChange> {
    if transaction.description == EMPTY_DESCRIPTION {
        transaction.description = statement_description.to_string();
        return Ok(DescriptionChange::Filled);
    }
    if transaction.description == statement_description || keep_existing {
        return Ok(DescriptionChange::Unchanged);
    }

    let title = format!("{} (statement says {:?})", title, statement_description);
    match prompter.ask_text(&title, &transaction.description)? {
        Some(text) if !text.trim().is_empty() && text != transaction.description => {
            debug!(from = %transaction.description, to = %text, "description replaced");
            transaction.description = text;
            Ok(DescriptionChange::Replaced)
        }
        _ => Ok(DescriptionChange::Unchanged),
    }
}

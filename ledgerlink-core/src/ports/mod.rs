//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The reconciliation
//! engine depends only on these traits: the remote ledger and the operator
//! sitting at the terminal.

mod ledger;
mod prompt;

pub use ledger::{AboutInfo, Ledger};
pub use prompt::Prompter;

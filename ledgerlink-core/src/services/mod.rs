//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The reconcile
//! service is the engine; the others are the pieces it is built from, plus
//! the link service for reimbursement bookkeeping.

pub mod description;
mod link;
mod reconcile;
pub mod resolve;
pub mod search;
pub mod upsert;

pub use description::{reconcile_description, DescriptionChange, EMPTY_DESCRIPTION};
pub use link::{LinkService, LinkSummary};
pub use reconcile::{ReconcileService, RowOutcome, RunSummary};
pub use resolve::{Resolution, Resolver};
pub use search::CandidateSearch;
pub use upsert::UpsertExecutor;

//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Everything here is fatal for a run. Row-local problems (bad dates,
/// field-count mismatches, split targets) never surface as an `Error`; the
/// engine logs them and moves on to the next row.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Ledger error: status {status}: {body}")]
    Ledger { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("cancelling")]
    Cancelled,

    #[error("interrupted")]
    Interrupted,

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

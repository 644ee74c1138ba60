//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Rejected engine configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineConfigError {
    #[error("items per round must be > 0")]
    ZeroItemsPerRound,
    #[error("distractor count must be at most {max}, got {requested}")]
    TooManyDistractors { requested: usize, max: usize },
    #[error("auto-advance delay must be between 1ms and {max_ms}ms, got {delay_ms}ms")]
    InvalidAutoAdvanceDelay { delay_ms: u128, max_ms: u128 },
    #[error("fixed round count must be > 0")]
    ZeroRounds,
    #[error("a single-pass activity must cover every item; items per round ({0}) needs repeated rounds")]
    PartialSinglePass(usize),
}

/// Errors emitted by `ProgressService` and the activity loop.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

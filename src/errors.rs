use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy for the scoring core. Validation failures are produced
/// before any store contact; store failures are surfaced as-is and never
/// retried automatically.
#[derive(Debug, Error)]
pub enum ScoreboardError {
    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid week label {0:?} (expected e.g. 2026-W06)")]
    InvalidWeek(String),

    #[error("submission batch is empty")]
    EmptyBatch,

    #[error("no entries survived validation, nothing committed")]
    NoValidEntries,

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("record {0} not found")]
    RecordNotFound(Uuid),

    #[error("unknown score type {0:?} in stored record")]
    UnknownScoreType(String),

    #[error("clear-all stopped after deleting {deleted} of {total} records")]
    PartialClear {
        deleted: usize,
        total: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("store operation failed")]
    Store(#[from] sqlx::Error),
}

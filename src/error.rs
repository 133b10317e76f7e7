use thiserror::Error;

/// Unified error type for the ingestion pipeline.
///
/// Structural parse failures (`SchemaNotFound`, `LinkFormat`,
/// `IdentityMismatch`, `PartialReport`) carry enough raw context to diagnose
/// the offending document without re-fetching it. `RateLimitExceeded` is
/// recovered internally by the fetch client and only surfaces through
/// `RateLimiter::try_acquire`.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Connection or HTTP failure. Not retried beyond the rate-limit wait.
    #[error("transport failure for {path}: {reason}")]
    Transport { path: String, reason: String },

    /// Every call slot in some window is taken; wait `retry_after` and retry.
    #[error("rate window {max_calls}/{period_secs}s saturated, retry in {retry_after:?}")]
    RateLimitExceeded {
        max_calls: u32,
        period_secs: u64,
        retry_after: std::time::Duration,
    },

    /// Expected table or header structure is absent. Fatal for the run:
    /// without a header there is no well-defined row correspondence.
    #[error("schema not found: {context}")]
    SchemaNotFound { context: String },

    /// The per-game report link is absent or its tokens do not parse.
    #[error("report link missing or malformed: {context}")]
    LinkFormat { context: String },

    /// Paired rows disagree on date or team. Fatal for that pair only.
    #[error("identity mismatch at row {row}: {detail}")]
    IdentityMismatch { row: usize, detail: String },

    /// The nested report lacks a section or column the record requires.
    /// The record is aborted rather than persisted incomplete.
    #[error("report incomplete: {context}")]
    PartialReport { context: String },

    /// A required cell failed numeric/date parsing.
    #[error("bad value in column {column:?}: {value:?}")]
    BadField { column: String, value: String },

    /// Team name not present in the injected directory.
    #[error("unknown team: {name:?}")]
    UnknownTeam { name: String },

    /// Cache file or entry unreadable. Treated as a miss by the caller.
    #[error("cache unreadable: {0}")]
    CacheCorruption(String),

    /// Output directory or file write failure.
    #[error("store failure for {path}: {reason}")]
    Store { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;

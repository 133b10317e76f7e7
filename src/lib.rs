//! Rate-limited ingestion of special-teams game statistics from
//! naturalstattrick.com: two situation tables reconciled row-by-row into one
//! record per (team, season, game), enriched from the per-game full report
//! and persisted idempotently as one JSON file per record.

pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod http_cache;
pub mod metrics;
pub mod pipeline;
pub mod rate_limit;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod store;
pub mod table;
pub mod teams;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use pipeline::{IngestSummary, run};

use scraper::Html;
use tracing::{info, warn};

use crate::config::{IngestConfig, Situation};
use crate::error::{IngestError, Result};
use crate::fetch::{FetchClient, Transport};
use crate::metrics::derive_metrics;
use crate::reconcile::{self, CandidateRecord};
use crate::record::TeamGameRecord;
use crate::report;
use crate::store::{RecordStore, record_file_name};
use crate::table::{SituationTable, extract_table};
use crate::teams::TeamDirectory;

const GAMES_TABLE_ID: &str = "teams";

/// What one run did, for the operator's summary printout.
#[derive(Debug, Default)]
pub struct IngestSummary {
    pub rows_paired: usize,
    pub stored: usize,
    pub skipped_existing: usize,
    pub failed: Vec<String>,
    pub requests_issued: u64,
}

/// Runs the whole pipeline: fetch both situation tables, reconcile, and for
/// each candidate record mine its report, derive metrics, and store.
///
/// Failures that invalidate a single record are collected into the summary
/// and the loop continues; a missing table schema aborts the run, since no
/// row correspondence can be trusted without a header.
pub fn run<T: Transport>(
    config: &IngestConfig,
    teams: &TeamDirectory,
    client: &mut FetchClient<T>,
) -> Result<IngestSummary> {
    let pp = fetch_situation_table(config, client, Situation::PowerPlay)?;
    let pk = fetch_situation_table(config, client, Situation::PenaltyKill)?;
    info!(
        pp_rows = pp.rows.len(),
        pk_rows = pk.rows.len(),
        "extracted situation tables"
    );

    let mut store = RecordStore::open(&config.out_dir)?;
    let mut summary = IngestSummary::default();

    for candidate in reconcile::reconcile(&pp, &pk, teams) {
        summary.rows_paired += 1;
        client.sweep_cache();
        match candidate {
            Ok(candidate) => match process_candidate(client, &mut store, candidate) {
                Ok(Outcome::Stored) => summary.stored += 1,
                Ok(Outcome::AlreadyStored) => summary.skipped_existing += 1,
                Err(err) => {
                    warn!(error = %err, "record aborted");
                    summary.failed.push(err.to_string());
                }
            },
            Err(err) => {
                warn!(error = %err, "pair aborted");
                summary.failed.push(err.to_string());
            }
        }
    }

    summary.requests_issued = client.requests_issued();
    Ok(summary)
}

enum Outcome {
    Stored,
    AlreadyStored,
}

fn process_candidate<T: Transport>(
    client: &mut FetchClient<T>,
    store: &mut RecordStore,
    candidate: CandidateRecord,
) -> Result<Outcome> {
    // Dedup before the report fetch; an already-stored identity must cost
    // no further network work.
    let file_name = record_file_name(&candidate.short_code, &candidate.identity);
    if store.exists(&file_name) {
        info!(file_name, "already stored, skipping");
        return Ok(Outcome::AlreadyStored);
    }
    info!(
        date = %candidate.date,
        team = %candidate.identity.team,
        game = candidate.identity.game_id,
        "analyzing"
    );

    let report_body = client.fetch(&candidate.report_path)?;
    let report_doc = Html::parse_document(&report_body);
    let mined = report::mine_report(&report_doc, &candidate.short_code)?;

    let derived = derive_metrics(
        candidate.raw.pp_gf,
        candidate.raw.pk_ga,
        mined.pp_opportunities,
    );

    let record = TeamGameRecord {
        date: candidate.date,
        identity: candidate.identity,
        raw: candidate.raw,
        pp_opp: mined.pp_opportunities,
        derived,
        players: mined.players,
    };
    let path = store.store(&file_name, &record)?;
    info!(path = %path.display(), "stored record");
    Ok(Outcome::Stored)
}

fn fetch_situation_table<T: Transport>(
    config: &IngestConfig,
    client: &mut FetchClient<T>,
    situation: Situation,
) -> Result<SituationTable> {
    let body = client.fetch(&config.games_path(situation))?;
    let doc = Html::parse_document(&body);
    extract_table(&doc, GAMES_TABLE_ID).map_err(|err| match err {
        IngestError::SchemaNotFound { context } => IngestError::SchemaNotFound {
            context: format!("{} table: {context}", situation.code()),
        },
        other => other,
    })
}

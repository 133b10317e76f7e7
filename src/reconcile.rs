use chrono::NaiveDate;
use tracing::error;

use crate::error::{IngestError, Result};
use crate::record::{GameIdentity, RawMetrics};
use crate::table::{RawTableRow, SituationTable};
use crate::teams::TeamDirectory;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A record after cross-table reconciliation: identity and raw metrics are
/// known, the nested report has not been fetched yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub identity: GameIdentity,
    pub short_code: String,
    pub date: NaiveDate,
    pub raw: RawMetrics,
    pub report_path: String,
}

/// Pairs rows by equal index up to the shorter sequence. The two tables come
/// from the same query split by situation, so position is the join key; there
/// is no value-based fallback and no re-sorting.
pub fn positional_join<'a>(
    pp_rows: &'a [RawTableRow],
    pk_rows: &'a [RawTableRow],
) -> impl Iterator<Item = (usize, &'a RawTableRow, &'a RawTableRow)> {
    pp_rows
        .iter()
        .zip(pk_rows.iter())
        .enumerate()
        .map(|(idx, (pp, pk))| (idx, pp, pk))
}

/// Reconciles the two situation tables into candidate records. Each pair
/// yields its own result: identity failures poison only that pair, and the
/// caller keeps walking the remaining rows.
pub fn reconcile(
    pp: &SituationTable,
    pk: &SituationTable,
    teams: &TeamDirectory,
) -> Vec<Result<CandidateRecord>> {
    let mut out = Vec::new();
    let mut previous_good: Option<&RawTableRow> = None;
    for (row_idx, pp_row, pk_row) in positional_join(&pp.rows, &pk.rows) {
        let candidate = reconcile_pair(pp, pk, teams, row_idx, pp_row, pk_row, previous_good);
        if candidate.is_ok() {
            previous_good = Some(pp_row);
        }
        out.push(candidate);
    }
    out
}

fn reconcile_pair(
    pp: &SituationTable,
    pk: &SituationTable,
    teams: &TeamDirectory,
    row_idx: usize,
    pp_row: &RawTableRow,
    pk_row: &RawTableRow,
    previous_good: Option<&RawTableRow>,
) -> Result<CandidateRecord> {
    let pp_date = parse_game_date(pp.field(pp_row, "Game")?)?;
    let pk_date = parse_game_date(pk.field(pk_row, "Game")?)?;
    if pp_date != pk_date {
        log_misalignment(row_idx, pp_row, pk_row, previous_good);
        return Err(IngestError::IdentityMismatch {
            row: row_idx,
            detail: format!("dates differ: pp={pp_date} pk={pk_date}"),
        });
    }

    let pp_team = pp.field(pp_row, "Team")?;
    let pk_team = pk.field(pk_row, "Team")?;
    if pp_team != pk_team {
        log_misalignment(row_idx, pp_row, pk_row, previous_good);
        return Err(IngestError::IdentityMismatch {
            row: row_idx,
            detail: format!("teams differ: pp={pp_team:?} pk={pk_team:?}"),
        });
    }

    let short_code = teams
        .short_code(pp_team)
        .ok_or_else(|| IngestError::UnknownTeam {
            name: pp_team.to_string(),
        })?
        .to_string();

    let report_path = full_report_link(pp, pp_row)?;
    let (season, game_id) = parse_report_tokens(&report_path)?;

    let raw = RawMetrics {
        pk_toi: parse_toi(pk.field(pk_row, "TOI")?)?,
        pp_cf: parse_stat(pp, pp_row, "CF")?,
        pk_ca: parse_stat(pk, pk_row, "CA")?,
        pp_sf: parse_stat(pp, pp_row, "SF")?,
        pk_sa: parse_stat(pk, pk_row, "SA")?,
        pp_gf: parse_stat(pp, pp_row, "GF")?,
        pk_ga: parse_stat(pk, pk_row, "GA")?,
        pp_shoot_pct: parse_stat(pp, pp_row, "SH%")?,
        pk_save_pct: parse_stat(pk, pk_row, "SV%")?,
    };

    Ok(CandidateRecord {
        identity: GameIdentity {
            season,
            game_id,
            team: pp_team.to_string(),
        },
        short_code,
        date: pp_date,
        raw,
        report_path,
    })
}

/// The "Game" cell reads "YYYY-MM-DD - Away Team N, Home Team M"; the date is
/// everything before the first " - ".
fn parse_game_date(game_field: &str) -> Result<NaiveDate> {
    let token = game_field
        .split_once(" - ")
        .map_or(game_field, |(date, _)| date)
        .trim();
    NaiveDate::parse_from_str(token, DATE_FORMAT).map_err(|_| IngestError::BadField {
        column: "Game".to_string(),
        value: game_field.to_string(),
    })
}

/// The report link sits in the unnamed column; among its anchors the one
/// whose text contains "Full" points at the full per-game report.
fn full_report_link(table: &SituationTable, row: &RawTableRow) -> Result<String> {
    let link_column = table.column("")?;
    row.links
        .iter()
        .find(|link| link.column == link_column && link.text.contains("Full"))
        .map(|link| link.href.clone())
        .ok_or_else(|| IngestError::LinkFormat {
            context: format!("no Full-report anchor in link cell, links: {:?}", row.links),
        })
}

/// Season and game-id tokens from the report href's key=value query pairs.
pub fn parse_report_tokens(href: &str) -> Result<(String, u64)> {
    let query = href.split_once('?').map(|(_, q)| q).unwrap_or("");
    let mut season = None;
    let mut game = None;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "season" => season = Some(value.to_string()),
            "game" => game = value.parse::<u64>().ok(),
            _ => {}
        }
    }
    match (season, game) {
        (Some(season), Some(game)) => Ok((season, game)),
        _ => Err(IngestError::LinkFormat {
            context: format!("season/game tokens missing from {href:?}"),
        }),
    }
}

fn parse_stat(table: &SituationTable, row: &RawTableRow, column: &str) -> Result<f64> {
    let raw = table.field(row, column)?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| IngestError::BadField {
            column: column.to_string(),
            value: raw.to_string(),
        })
}

/// "MM:SS" time-on-ice to decimal minutes. "0" means no time at all; a value
/// without a colon is either the sentinel or already decimal.
pub fn parse_toi(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed == "0" {
        return Ok(0.0);
    }
    let bad_field = || IngestError::BadField {
        column: "TOI".to_string(),
        value: raw.to_string(),
    };
    match trimmed.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes = minutes.parse::<f64>().map_err(|_| bad_field())?;
            let seconds = seconds.parse::<f64>().map_err(|_| bad_field())?;
            Ok(minutes + seconds / 60.0)
        }
        None => trimmed.parse::<f64>().map_err(|_| bad_field()),
    }
}

fn log_misalignment(
    row_idx: usize,
    pp_row: &RawTableRow,
    pk_row: &RawTableRow,
    previous_good: Option<&RawTableRow>,
) {
    error!(
        row = row_idx,
        pp_cells = ?pp_row.cells,
        pk_cells = ?pk_row.cells,
        previous_pp_cells = ?previous_good.map(|row| &row.cells),
        "situation tables misaligned"
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::record::MISSING_DATA;
    use crate::table::RowLink;

    fn table(columns: &[&str], rows: Vec<RawTableRow>) -> SituationTable {
        SituationTable {
            columns: columns
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.to_string(), idx))
                .collect::<HashMap<_, _>>(),
            rows,
        }
    }

    fn game_row(date: &str, team: &str, stats: &[&str], href: Option<&str>) -> RawTableRow {
        let mut cells = vec![
            String::new(),
            format!("{date} - {team} 3, Boston Bruins 2"),
            team.to_string(),
        ];
        cells.extend(stats.iter().map(|s| s.to_string()));
        let links = href
            .map(|href| {
                vec![RowLink {
                    column: 0,
                    text: "Full Report".to_string(),
                    href: href.to_string(),
                }]
            })
            .unwrap_or_default();
        RawTableRow { cells, links }
    }

    const COLUMNS: &[&str] = &[
        "", "Game", "Team", "TOI", "CF", "CA", "SF", "SA", "GF", "GA", "SH%", "SV%",
    ];
    const STATS: &[&str] = &["7:30", "10", "8", "6", "4", "1", "0", "16.7", "100"];
    const HREF: &str = "game.php?season=20232024&game=20514";

    #[test]
    fn matching_rows_reconcile() {
        let pp = table(
            COLUMNS,
            vec![game_row("2024-01-10", "Anaheim Ducks", STATS, Some(HREF))],
        );
        let pk = table(
            COLUMNS,
            vec![game_row("2024-01-10", "Anaheim Ducks", STATS, Some(HREF))],
        );
        let results = reconcile(&pp, &pk, &TeamDirectory::nhl());
        assert_eq!(results.len(), 1);
        let candidate = results[0].as_ref().expect("pair reconciles");
        assert_eq!(candidate.identity.season, "20232024");
        assert_eq!(candidate.identity.game_id, 20514);
        assert_eq!(candidate.short_code, "Ducks");
        assert_eq!(candidate.date, NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        assert!((candidate.raw.pk_toi - 7.5).abs() < 1e-9);
        assert_eq!(candidate.raw.pp_gf, 1.0);
    }

    #[test]
    fn date_mismatch_poisons_only_that_pair() {
        let pp = table(
            COLUMNS,
            vec![
                game_row("2024-01-10", "Anaheim Ducks", STATS, Some(HREF)),
                game_row("2024-01-11", "Boston Bruins", STATS, Some(HREF)),
            ],
        );
        let pk = table(
            COLUMNS,
            vec![
                game_row("2024-01-09", "Anaheim Ducks", STATS, Some(HREF)),
                game_row("2024-01-11", "Boston Bruins", STATS, Some(HREF)),
            ],
        );
        let results = reconcile(&pp, &pk, &TeamDirectory::nhl());
        assert!(matches!(
            results[0],
            Err(IngestError::IdentityMismatch { row: 0, .. })
        ));
        assert!(results[1].is_ok());
    }

    #[test]
    fn team_mismatch_is_identity_mismatch() {
        let pp = table(
            COLUMNS,
            vec![game_row("2024-01-10", "Anaheim Ducks", STATS, Some(HREF))],
        );
        let pk = table(
            COLUMNS,
            vec![game_row("2024-01-10", "Boston Bruins", STATS, Some(HREF))],
        );
        let results = reconcile(&pp, &pk, &TeamDirectory::nhl());
        assert!(matches!(
            results[0],
            Err(IngestError::IdentityMismatch { .. })
        ));
    }

    #[test]
    fn missing_full_report_anchor_is_link_format() {
        let pp = table(
            COLUMNS,
            vec![game_row("2024-01-10", "Anaheim Ducks", STATS, None)],
        );
        let pk = table(
            COLUMNS,
            vec![game_row("2024-01-10", "Anaheim Ducks", STATS, Some(HREF))],
        );
        let results = reconcile(&pp, &pk, &TeamDirectory::nhl());
        assert!(matches!(results[0], Err(IngestError::LinkFormat { .. })));
    }

    #[test]
    fn join_stops_at_the_shorter_sequence() {
        let rows = vec![
            game_row("2024-01-10", "Anaheim Ducks", STATS, Some(HREF)),
            game_row("2024-01-11", "Boston Bruins", STATS, Some(HREF)),
        ];
        let joined: Vec<_> = positional_join(&rows, &rows[..1]).collect();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].0, 0);
    }

    #[test]
    fn report_tokens_parse_from_query_pairs() {
        let (season, game) =
            parse_report_tokens("game.php?season=20232024&game=20514&view=full").unwrap();
        assert_eq!(season, "20232024");
        assert_eq!(game, 20514);

        assert!(parse_report_tokens("game.php?season=20232024").is_err());
        assert!(parse_report_tokens("game.php").is_err());
    }

    #[test]
    fn toi_parses_clock_sentinel_and_zero() {
        assert!((parse_toi("12:30").unwrap() - 12.5).abs() < 1e-9);
        assert_eq!(parse_toi("0").unwrap(), 0.0);
        assert_eq!(parse_toi("-999").unwrap(), MISSING_DATA);
        assert!(parse_toi("1:2:3").is_err());
    }
}

use scraper::Html;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::dom;
use crate::error::{IngestError, Result};
use crate::record::PlayerGameStat;
use crate::table::{self, RawTableRow, SituationTable};

/// Everything the pipeline mines out of one per-game full report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub pp_opportunities: u32,
    pub players: Vec<PlayerGameStat>,
}

/// Mines the full-report document for one team's side of a game.
///
/// Any missing section or column fails the whole record with
/// `PartialReport`: a record with guessed-at opportunity counts or dropped
/// skaters must never reach the store.
pub fn mine_report(doc: &Html, short_code: &str) -> Result<ReportData> {
    let pp_opportunities = count_power_plays(doc, short_code)?;
    let players = extract_skaters(doc, short_code)?;
    debug!(
        team = short_code,
        pp_opportunities,
        skaters = players.len(),
        "mined report"
    );
    Ok(ReportData {
        pp_opportunities,
        players,
    })
}

/// Heading elements under the "{team} - Power Plays" container, one per
/// opportunity. See `dom::heading_count` for the heuristic's assumption.
fn count_power_plays(doc: &Html, short_code: &str) -> Result<u32> {
    let label_text = format!("{short_code} - Power Plays");
    let label = dom::find_labeled_section(doc, &label_text).ok_or_else(|| {
        IngestError::PartialReport {
            context: format!("label {label_text:?} not found"),
        }
    })?;
    let container =
        dom::section_container(label).ok_or_else(|| IngestError::PartialReport {
            context: format!("no content container after label {label_text:?}"),
        })?;
    Ok(dom::heading_count(container) as u32)
}

fn extract_skaters(doc: &Html, short_code: &str) -> Result<Vec<PlayerGameStat>> {
    let label_text = format!("{short_code} - Individual");
    let label = dom::find_labeled_section(doc, &label_text).ok_or_else(|| {
        IngestError::PartialReport {
            context: format!("label {label_text:?} not found"),
        }
    })?;
    let section = dom::enclosing_div(label).ok_or_else(|| IngestError::PartialReport {
        context: format!("label {label_text:?} has no enclosing section"),
    })?;
    let data_div =
        dom::data_subcontainer(section).ok_or_else(|| IngestError::PartialReport {
            context: format!("{label_text:?}: no data sub-container"),
        })?;
    let skaters_heading =
        dom::find_h3(data_div, "Skaters").ok_or_else(|| IngestError::PartialReport {
            context: format!("{label_text:?}: no Skaters heading"),
        })?;
    let skaters_table =
        dom::next_table(skaters_heading).ok_or_else(|| IngestError::PartialReport {
            context: format!("{label_text:?}: no table after Skaters heading"),
        })?;

    let table = table::extract_table_from(skaters_table, "skaters")?;
    table
        .rows
        .iter()
        .map(|row| extract_player(&table, row))
        .collect()
}

fn extract_player(table: &SituationTable, row: &RawTableRow) -> Result<PlayerGameStat> {
    Ok(PlayerGameStat {
        name: normalize_name(player_field(table, row, "Player")?),
        toi: parse_player_stat(table, row, "TOI")?,
        points: parse_player_stat(table, row, "Total Points")?,
        icf: parse_player_stat(table, row, "iCF")?,
        iscf: parse_player_stat(table, row, "iSCF")?,
        ihdcf: parse_player_stat(table, row, "iHDCF")?,
    })
}

/// A skater row missing a required column is a data-integrity failure for
/// the record, not a soft skip.
fn player_field<'a>(table: &SituationTable, row: &'a RawTableRow, name: &str) -> Result<&'a str> {
    table
        .field(row, name)
        .map_err(|_| IngestError::PartialReport {
            context: format!("skater row missing column {name:?}: {:?}", row.cells),
        })
}

fn parse_player_stat(table: &SituationTable, row: &RawTableRow, name: &str) -> Result<f64> {
    let raw = player_field(table, row, name)?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| IngestError::PartialReport {
            context: format!("skater column {name:?} not numeric: {raw:?}"),
        })
}

/// Player names arrive with inconsistent diacritic encodings across sources;
/// NFKC puts them in one canonical composed form before comparison or output.
fn normalize_name(raw: &str) -> String {
    raw.trim().nfkc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"
        <html><body>
        <label>Ducks - Power Plays</label>
        <div>
            <h4>5v4 (2:00)</h4><table></table>
            <h4>5v4 (1:23)</h4><table></table>
            <h4>5v3 (0:41)</h4><table></table>
        </div>
        <div>
            <label>Ducks - Individual</label>
            <div class="tpp datadiv">
                <h3>Skaters</h3>
                <table>
                    <thead><tr><th>Player</th><th>TOI</th><th>Total Points</th>
                        <th>iCF</th><th>iSCF</th><th>iHDCF</th></tr></thead>
                    <tbody><tr>
                        <td>Leo Carlsson</td><td>4.5</td><td>1</td>
                        <td>3</td><td>2</td><td>1</td>
                    </tr></tbody>
                </table>
            </div>
        </div>
        </body></html>"#;

    #[test]
    fn mines_opportunities_and_skaters() {
        let doc = Html::parse_document(REPORT);
        let data = mine_report(&doc, "Ducks").expect("report mines");
        assert_eq!(data.pp_opportunities, 3);
        assert_eq!(data.players.len(), 1);
        let player = &data.players[0];
        assert_eq!(player.name, "Leo Carlsson");
        assert_eq!(player.toi, 4.5);
        assert_eq!(player.points, 1.0);
        assert_eq!(player.icf, 3.0);
    }

    #[test]
    fn missing_power_play_label_fails_the_record() {
        let doc = Html::parse_document(REPORT);
        let err = mine_report(&doc, "Bruins").expect_err("wrong team label");
        assert!(matches!(err, IngestError::PartialReport { .. }));
    }

    #[test]
    fn skater_row_missing_a_column_fails_the_record() {
        let doc = Html::parse_document(
            r#"
            <label>Ducks - Power Plays</label><div><h4>5v4</h4></div>
            <div>
                <label>Ducks - Individual</label>
                <div class="tpp datadiv">
                    <h3>Skaters</h3>
                    <table>
                        <thead><tr><th>Player</th><th>TOI</th></tr></thead>
                        <tbody><tr><td>Leo Carlsson</td><td>4.5</td></tr></tbody>
                    </table>
                </div>
            </div>"#,
        );
        let err = mine_report(&doc, "Ducks").expect_err("required columns absent");
        assert!(matches!(err, IngestError::PartialReport { .. }));
    }

    #[test]
    fn names_normalize_to_one_composed_form() {
        // Decomposed u + combining diaeresis composes to a single code point.
        assert_eq!(normalize_name("Stu\u{0308}tzle"), "St\u{00fc}tzle");
        // Compatibility spaces fold to a plain space.
        assert_eq!(normalize_name("Leo\u{2009}Carlsson"), "Leo Carlsson");
    }
}

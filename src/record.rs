use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Out-of-band stand-in for cells the site renders as a single dash.
/// Kept numeric so downstream consumers never branch on absence.
pub const MISSING_DATA: f64 = -999.0;

/// Unique key of a persisted record: one team's side of one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameIdentity {
    /// Season-range token as published, e.g. "20232024".
    pub season: String,
    pub game_id: u64,
    /// Canonical full team name, e.g. "Anaheim Ducks".
    #[serde(rename = "Team")]
    pub team: String,
}

/// Raw special-teams metrics merged from the two situation tables.
///
/// Field keys follow the source's metric codes. Every field is always
/// present; a dash in the source becomes [`MISSING_DATA`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    #[serde(rename = "PK_TOI")]
    pub pk_toi: f64,
    #[serde(rename = "PP_CF")]
    pub pp_cf: f64,
    #[serde(rename = "PK_CA")]
    pub pk_ca: f64,
    #[serde(rename = "PP_SF")]
    pub pp_sf: f64,
    #[serde(rename = "PK_SA")]
    pub pk_sa: f64,
    #[serde(rename = "PP_GF")]
    pub pp_gf: f64,
    #[serde(rename = "PK_GA")]
    pub pk_ga: f64,
    #[serde(rename = "PP_SHOOT_%")]
    pub pp_shoot_pct: f64,
    #[serde(rename = "PK_SAVE_%")]
    pub pk_save_pct: f64,
}

/// Smoothed success rates, computable only once PP_OPP is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(rename = "PP%")]
    pub pp_pct: f64,
    #[serde(rename = "PK%")]
    pub pk_pct: f64,
}

/// One skater row from the nested report. All stat fields are required;
/// a row missing any of them aborts the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStat {
    pub name: String,
    #[serde(rename = "TOI")]
    pub toi: f64,
    pub points: f64,
    #[serde(rename = "iCF")]
    pub icf: f64,
    #[serde(rename = "iSCF")]
    pub iscf: f64,
    #[serde(rename = "iHDCF")]
    pub ihdcf: f64,
}

/// The unit of output: one fully populated per-team-per-game record.
/// Either every field below is present or the record is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamGameRecord {
    #[serde(rename = "Game")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub identity: GameIdentity,
    #[serde(flatten)]
    pub raw: RawMetrics,
    #[serde(rename = "PP_OPP")]
    pub pp_opp: u32,
    #[serde(flatten)]
    pub derived: DerivedMetrics,
    pub players: Vec<PlayerGameStat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_source_metric_codes() {
        let record = TeamGameRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"),
            identity: GameIdentity {
                season: "20232024".to_string(),
                game_id: 20514,
                team: "Anaheim Ducks".to_string(),
            },
            raw: RawMetrics {
                pk_toi: 7.5,
                pp_cf: 10.0,
                pk_ca: 8.0,
                pp_sf: 6.0,
                pk_sa: 4.0,
                pp_gf: 1.0,
                pk_ga: 0.0,
                pp_shoot_pct: MISSING_DATA,
                pk_save_pct: 100.0,
            },
            pp_opp: 3,
            derived: DerivedMetrics {
                pp_pct: 50.0,
                pk_pct: 100.0,
            },
            players: vec![PlayerGameStat {
                name: "Leo Carlsson".to_string(),
                toi: 4.5,
                points: 1.0,
                icf: 3.0,
                iscf: 2.0,
                ihdcf: 1.0,
            }],
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).expect("serializable"))
                .expect("round-trips through json");
        assert_eq!(json["Game"], "2024-01-10");
        assert_eq!(json["Team"], "Anaheim Ducks");
        assert_eq!(json["season"], "20232024");
        assert_eq!(json["PK_TOI"], 7.5);
        assert_eq!(json["PP_SHOOT_%"], MISSING_DATA);
        assert_eq!(json["PP%"], 50.0);
        assert_eq!(json["players"][0]["iCF"], 3.0);
    }
}

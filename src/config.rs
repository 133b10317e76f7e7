use std::path::PathBuf;
use std::time::Duration;

use crate::rate_limit::RateWindow;

pub const DEFAULT_BASE_URL: &str = "https://www.naturalstattrick.com/";
const DEFAULT_FROM_SEASON: i32 = 2023;
const DEFAULT_THRU_SEASON: i32 = 2024;
const DEFAULT_CACHE_TTL_SECS: u64 = 900;
const CACHE_DIR: &str = "nst_ingest";
const CACHE_FILE: &str = "http_cache.json";

/// The site's four independent call ceilings, per minute up to per hour.
const DEFAULT_RATE_WINDOWS: &[(u32, u64)] = &[(8, 60), (30, 300), (70, 900), (200, 3600)];

/// Special-teams situation filter of a games query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Situation {
    PowerPlay,
    PenaltyKill,
}

impl Situation {
    pub fn code(self) -> &'static str {
        match self {
            Situation::PowerPlay => "pp",
            Situation::PenaltyKill => "pk",
        }
    }
}

/// Run configuration, resolved once in the binary from args and `NST_*` env
/// vars, then passed by reference everywhere.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub base_url: String,
    /// First season's starting year, e.g. 2023 for 2023-24.
    pub from_season: i32,
    /// Last season's ending year, e.g. 2024 for 2023-24.
    pub thru_season: i32,
    pub out_dir: PathBuf,
    pub cache_path: PathBuf,
    pub cache_ttl: Duration,
    pub windows: Vec<RateWindow>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            from_season: DEFAULT_FROM_SEASON,
            thru_season: DEFAULT_THRU_SEASON,
            out_dir: PathBuf::from("data"),
            cache_path: default_cache_path()
                .unwrap_or_else(|| PathBuf::from(CACHE_FILE)),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            windows: default_rate_windows(),
        }
    }
}

impl IngestConfig {
    /// Applies `NST_*` env overrides on top of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(year) = env_parse::<i32>("NST_FROM_SEASON") {
            config.from_season = year;
        }
        if let Some(year) = env_parse::<i32>("NST_THRU_SEASON") {
            config.thru_season = year;
        }
        if let Ok(dir) = std::env::var("NST_OUT_DIR")
            && !dir.trim().is_empty()
        {
            config.out_dir = PathBuf::from(dir.trim());
        }
        if let Ok(path) = std::env::var("NST_CACHE_PATH")
            && !path.trim().is_empty()
        {
            config.cache_path = PathBuf::from(path.trim());
        }
        if let Some(secs) = env_parse::<u64>("NST_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("NST_RATE_WINDOWS") {
            let windows = parse_rate_windows(&raw);
            if !windows.is_empty() {
                config.windows = windows;
            }
        }
        config
    }

    /// Season-range games query path for one situation.
    pub fn games_path(&self, situation: Situation) -> String {
        format!(
            "games.php?fromseason={}&thruseason={}&stype=2&sit={}&loc=B&team=All&rate=n",
            season_token(self.from_season),
            season_token(self.thru_season - 1),
            situation.code()
        )
    }
}

/// A season's 8-digit range token: 2023 -> "20232024".
pub fn season_token(start_year: i32) -> String {
    format!("{}{}", start_year, start_year + 1)
}

/// "8/60,30/300" -> windows of (max calls / period seconds).
pub fn parse_rate_windows(raw: &str) -> Vec<RateWindow> {
    raw.split(',')
        .filter_map(|part| {
            let (calls, secs) = part.trim().split_once('/')?;
            let calls = calls.trim().parse::<u32>().ok()?;
            let secs = secs.trim().parse::<u64>().ok()?;
            (calls > 0 && secs > 0).then(|| RateWindow::new(calls, Duration::from_secs(secs)))
        })
        .collect()
}

pub fn default_rate_windows() -> Vec<RateWindow> {
    DEFAULT_RATE_WINDOWS
        .iter()
        .map(|&(calls, secs)| RateWindow::new(calls, Duration::from_secs(secs)))
        .collect()
}

fn default_cache_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR).join(CACHE_FILE));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".cache")
            .join(CACHE_DIR)
            .join(CACHE_FILE),
    )
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn games_path_spans_the_season_range() {
        let config = IngestConfig {
            from_season: 2023,
            thru_season: 2024,
            ..IngestConfig::default()
        };
        assert_eq!(
            config.games_path(Situation::PowerPlay),
            "games.php?fromseason=20232024&thruseason=20232024&stype=2&sit=pp&loc=B&team=All&rate=n"
        );
        assert!(
            config
                .games_path(Situation::PenaltyKill)
                .contains("sit=pk")
        );
    }

    #[test]
    fn season_tokens_concatenate_adjacent_years() {
        assert_eq!(season_token(2023), "20232024");
        assert_eq!(season_token(1999), "19992000");
    }

    #[test]
    fn rate_window_table_parses_and_skips_junk() {
        let windows = parse_rate_windows("8/60, 30/300, nonsense, 0/10, 70/0");
        assert_eq!(
            windows,
            vec![
                RateWindow::new(8, Duration::from_secs(60)),
                RateWindow::new(30, Duration::from_secs(300)),
            ]
        );
    }
}

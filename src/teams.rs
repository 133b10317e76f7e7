use std::collections::HashMap;

/// Canonical full name -> short code, as the site renders them.
const NHL_TEAMS: &[(&str, &str)] = &[
    ("Anaheim Ducks", "Ducks"),
    ("Arizona Coyotes", "Coyotes"),
    ("Boston Bruins", "Bruins"),
    ("Buffalo Sabres", "Sabres"),
    ("Calgary Flames", "Flames"),
    ("Carolina Hurricanes", "Hurricanes"),
    ("Chicago Blackhawks", "Blackhawks"),
    ("Colorado Avalanche", "Avalanche"),
    ("Columbus Blue Jackets", "Blue Jackets"),
    ("Dallas Stars", "Stars"),
    ("Detroit Red Wings", "Red Wings"),
    ("Edmonton Oilers", "Oilers"),
    ("Florida Panthers", "Panthers"),
    ("Los Angeles Kings", "Kings"),
    ("Minnesota Wild", "Wild"),
    ("Montreal Canadiens", "Canadiens"),
    ("Nashville Predators", "Predators"),
    ("New Jersey Devils", "Devils"),
    ("New York Islanders", "Islanders"),
    ("New York Rangers", "Rangers"),
    ("Ottawa Senators", "Senators"),
    ("Philadelphia Flyers", "Flyers"),
    ("Pittsburgh Penguins", "Penguins"),
    ("San Jose Sharks", "Sharks"),
    ("Seattle Kraken", "Kraken"),
    ("St Louis Blues", "Blues"),
    ("Tampa Bay Lightning", "Lightning"),
    ("Toronto Maple Leafs", "Maple Leafs"),
    ("Vancouver Canucks", "Canucks"),
    ("Vegas Golden Knights", "Golden Knights"),
    ("Washington Capitals", "Capitals"),
    ("Winnipeg Jets", "Jets"),
];

/// Injected lookup from canonical team name to the short code used by the
/// report pages and the output file names.
#[derive(Debug, Clone)]
pub struct TeamDirectory {
    by_name: HashMap<String, String>,
}

impl TeamDirectory {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            by_name: entries.into_iter().collect(),
        }
    }

    /// The default NHL table.
    pub fn nhl() -> Self {
        Self::new(
            NHL_TEAMS
                .iter()
                .map(|(name, short)| (name.to_string(), short.to_string())),
        )
    }

    pub fn short_code(&self, full_name: &str) -> Option<&str> {
        self.by_name.get(full_name).map(String::as_str)
    }
}

/// Lower-cased short code with spaces collapsed to underscores, used as the
/// leading fragment of the output file name.
pub fn file_stem(short_code: &str) -> String {
    short_code.to_lowercase().replace(' ', "_")
}

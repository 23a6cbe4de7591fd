// Player records and position eligibility parsing.

use serde::{Deserialize, Serialize};

/// Characters that separate eligible positions in a position specifier
/// (e.g. "TOP/JUG", "MID, ADC", "SUP JUG").
const POSITION_DELIMITERS: &[char] = &['/', ','];

/// A player in the auction pool.
///
/// Everything except `position` and `cost` is fixed once the pool is loaded.
/// Both of those are written exactly once, when the player joins a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier assigned by the pool provider (e.g. "p-3").
    pub id: String,
    /// Display name.
    pub name: String,
    /// In-game account handle.
    pub ingame_name: String,
    /// Free-text skill tier label (e.g. "Diamond 2").
    pub tier: String,
    /// Position specifier. May list several eligible positions until the
    /// player is assigned, after which it holds the single final position.
    pub position: String,
    /// Most-played champion, if the pool provided one.
    #[serde(default)]
    pub most_champion: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Final sale price. Set only once the player is on a roster.
    #[serde(default)]
    pub cost: Option<u32>,
}

impl Player {
    /// Create a player with no cosmetic metadata and no sale cost.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ingame_name: impl Into<String>,
        tier: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            ingame_name: ingame_name.into(),
            tier: tier.into(),
            position: position.into(),
            most_champion: None,
            notes: None,
            cost: None,
        }
    }

    /// The eligible positions encoded in this player's position specifier.
    pub fn eligible_positions(&self) -> Vec<String> {
        eligible_positions(&self.position)
    }

    /// Whether the player may play more than one position.
    pub fn is_multi_position(&self) -> bool {
        self.eligible_positions().len() > 1
    }

    /// Copy of this player as it appears on a roster: the position collapsed
    /// to `final_position` and the sale cost recorded.
    pub fn assigned(&self, final_position: &str, cost: u32) -> Player {
        Player {
            position: final_position.to_string(),
            cost: Some(cost),
            ..self.clone()
        }
    }
}

/// Split a position specifier into its eligible positions.
///
/// Tokens are separated by `/`, `,` or any whitespace; empty tokens are
/// discarded. Tokens are returned verbatim, in their original order.
pub fn eligible_positions(spec: &str) -> Vec<String> {
    spec.split(|c: char| c.is_whitespace() || POSITION_DELIMITERS.contains(&c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first eligible position, if the specifier lists any.
pub fn primary_position(spec: &str) -> Option<String> {
    eligible_positions(spec).into_iter().next()
}

/// Look up `position` among the eligible positions of `spec`, ignoring case.
///
/// Returns the eligible token as spelled in the specifier.
pub fn match_eligible(spec: &str, position: &str) -> Option<String> {
    let wanted = position.trim();
    eligible_positions(spec)
        .into_iter()
        .find(|p| p.eq_ignore_ascii_case(wanted))
}

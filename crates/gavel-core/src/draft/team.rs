// Teams, their budgets and rosters.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::Player;

/// Number of players on a complete roster, captain included.
pub const ROSTER_SIZE: usize = 5;

/// Budget every team starts the auction with.
pub const STARTING_BUDGET: u32 = 1000;

/// Display theme for a team. Has no effect on auction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    Cyan,
    Pink,
    Emerald,
    Amber,
}

impl TeamColor {
    /// Palette assigned to teams in setup order.
    pub const PALETTE: [TeamColor; 4] = [
        TeamColor::Cyan,
        TeamColor::Pink,
        TeamColor::Emerald,
        TeamColor::Amber,
    ];

    /// Color for the team at `idx`, cycling through the palette.
    pub fn for_index(idx: usize) -> Self {
        Self::PALETTE[idx % Self::PALETTE.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TeamColor::Cyan => "cyan",
            TeamColor::Pink => "pink",
            TeamColor::Emerald => "emerald",
            TeamColor::Amber => "amber",
        }
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A team in the auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier (e.g. "team-0").
    pub id: String,
    /// Display name, derived from the captain's name.
    pub name: String,
    /// Player id of the founding captain.
    pub captain_id: String,
    /// Remaining budget.
    pub budget: u32,
    /// Players in the order they joined; the captain is always first.
    pub roster: Vec<Player>,
    pub color: TeamColor,
    /// Roster capacity. Fixed for the session.
    capacity: usize,
}

impl Team {
    /// Create a team founded by `captain`, who is already assigned
    /// `captain_position`.
    pub fn new(
        idx: usize,
        captain: &Player,
        captain_position: &str,
        budget: u32,
        capacity: usize,
    ) -> Self {
        let mut captain_entry = captain.clone();
        captain_entry.position = captain_position.to_string();

        Team {
            id: format!("team-{idx}"),
            name: format!("{} TEAM", captain.name),
            captain_id: captain.id.clone(),
            budget,
            roster: vec![captain_entry],
            color: TeamColor::for_index(idx),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the roster has reached capacity. A full team is closed and
    /// can never bid again.
    pub fn is_full(&self) -> bool {
        self.roster.len() >= self.capacity
    }

    /// Number of open roster spots.
    pub fn open_slots(&self) -> usize {
        self.capacity.saturating_sub(self.roster.len())
    }

    /// Total spent on players bought at auction (the captain costs nothing).
    pub fn spent(&self) -> u32 {
        self.roster.iter().filter_map(|p| p.cost).sum()
    }

    /// Whether the team could legally hold a bid of `amount` right now.
    pub fn can_afford(&self, amount: u32) -> bool {
        !self.is_full() && self.budget >= amount
    }

    /// Whether the given player is on this roster.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.roster.iter().any(|p| p.id == player_id)
    }
}

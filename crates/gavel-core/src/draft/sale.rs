// Completed sales.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A finalized sale: a player joined a team's roster at a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// 1-based sequence number within the session.
    pub sale_number: u32,
    pub team_id: String,
    pub team_name: String,
    pub player_id: String,
    pub player_name: String,
    /// The position the player was assigned on the roster.
    pub position: String,
    pub price: u32,
}

impl fmt::Display for Sale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}: {} ({}) -- {}",
            self.sale_number, self.team_name, self.player_name, self.position, self.price
        )
    }
}

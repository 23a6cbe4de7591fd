// Auction draft: players, teams, sale records and the session state machine.

pub mod player;
pub mod sale;
pub mod state;
pub mod team;

// Messages between the console and the app loop, and the snapshot the
// console renders from.

use std::fmt;

use chrono::{DateTime, Local};
use serde::Serialize;

use gavel_core::draft::player::Player;
use gavel_core::draft::sale::Sale;
use gavel_core::draft::state::Status;
use gavel_core::draft::team::TeamColor;

// ---------------------------------------------------------------------------
// Console -> app
// ---------------------------------------------------------------------------

/// A player named on the command line: 1-based pool number or player id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerRef {
    Number(usize),
    Id(String),
}

/// A team named on the command line: 1-based team number or team id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamRef {
    Number(usize),
    Id(String),
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerRef::Number(n) => write!(f, "#{n}"),
            PlayerRef::Id(id) => write!(f, "{id}"),
        }
    }
}

impl fmt::Display for TeamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRef::Number(n) => write!(f, "#{n}"),
            TeamRef::Id(id) => write!(f, "{id}"),
        }
    }
}

/// One captain in a `setup` command, with an optional position override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptainPick {
    pub player: PlayerRef,
    pub position: Option<String>,
}

/// Read-only listings the operator can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Status,
    WaitingList,
    Teams,
    Pool,
    History,
    /// The full snapshot as JSON, for an external display.
    Json,
}

/// Commands sent from the console to the app loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Setup { captains: Vec<CaptainPick> },
    /// Countdown length to use at setup.
    Timer(u32),
    Start,
    /// Raise the current bid by `step` (the configured step when `None`).
    Bid { team: TeamRef, step: Option<u32> },
    Sold,
    Pass,
    Pick(String),
    Subsidy(u32),
    Pause,
    Resume,
    Show(View),
    Help,
    Quit,
}

// ---------------------------------------------------------------------------
// App -> console
// ---------------------------------------------------------------------------

/// Something that happened in the auction, worth announcing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionEvent {
    SetupComplete { teams: usize, waiting: usize },
    TimerSet(u32),
    Started { player: Player },
    BidPlaced { team_name: String, amount: u32 },
    Passed { player_name: String },
    AwaitingPosition {
        team_name: String,
        player_name: String,
        eligible_positions: Vec<String>,
    },
    Sold(Sale),
    SubsidyGranted { amount: u32, teams: usize },
    Paused,
    Resumed,
    Finished,
}

/// Updates pushed from the app loop to the console.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Event(AuctionEvent),
    /// Countdown pulse while bidding.
    Tick { remaining: u32 },
    /// State after a change.
    Snapshot(Box<AuctionSnapshot>),
    /// Answer to a `Show` command.
    Show {
        view: View,
        snapshot: Box<AuctionSnapshot>,
    },
    /// A command was refused; the text says why.
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything a display needs, captured in one piece.
#[derive(Debug, Clone, Serialize)]
pub struct AuctionSnapshot {
    pub status: Status,
    pub paused: bool,
    pub timer_setting: u32,
    pub bid_step: u32,
    /// Most captains setup will accept for this pool.
    pub max_captains: usize,
    pub lot: Option<LotSnapshot>,
    pub teams: Vec<TeamSnapshot>,
    pub waiting_list: Vec<Player>,
    pub pool: Vec<Player>,
    pub history: Vec<HistoryEntry>,
    pub total_spent: u32,
}

/// The player on the block (or awaiting a position pick).
#[derive(Debug, Clone, Serialize)]
pub struct LotSnapshot {
    pub player: Player,
    pub current_bid: u32,
    pub high_bidder_id: Option<String>,
    pub high_bidder_name: Option<String>,
    /// Seconds left; `None` once bidding has closed.
    pub time_remaining: Option<u32>,
    /// Bid a `bid <team>` with the default step would place.
    pub next_bid: u32,
    pub awaiting_position: bool,
    pub eligible_positions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamSnapshot {
    pub id: String,
    pub name: String,
    pub color: TeamColor,
    pub budget: u32,
    pub spent: u32,
    pub roster: Vec<Player>,
    pub capacity: usize,
    pub is_full: bool,
    /// Whether this team could place the default-step raise right now.
    pub can_raise: bool,
}

/// A finalized sale with the local time it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub sale: Sale,
    pub sold_at: DateTime<Local>,
}

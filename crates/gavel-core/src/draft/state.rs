// Auction session state: the phase machine, bid validation, countdown and
// roster/budget bookkeeping.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::player::{self, Player};
use super::sale::Sale;
use super::team::{Team, ROSTER_SIZE, STARTING_BUDGET};

/// Fewest captains (and therefore teams) an auction can be set up with.
pub const MIN_TEAMS: usize = 2;

/// Countdown length used until setup configures one.
pub const DEFAULT_TIMER_SECONDS: u32 = 30;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Flat view of the session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Setup,
    Ready,
    Bidding,
    Selection,
    Finished,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Setup => "SETUP",
            Status::Ready => "READY",
            Status::Bidding => "BIDDING",
            Status::Selection => "SELECTION",
            Status::Finished => "FINISHED",
        }
    }

    /// Whether the session can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Finished)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The standing high bid on a lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    pub team_id: String,
    pub amount: u32,
}

/// A player on the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub player: Player,
    pub high_bid: Option<Bid>,
    /// Seconds left on the countdown.
    pub time_remaining: u32,
}

impl Lot {
    /// Current high bid amount, 0 before the first bid.
    pub fn current_bid(&self) -> u32 {
        self.high_bid.as_ref().map_or(0, |b| b.amount)
    }
}

/// A sold multi-position player waiting for the winner to pick a position.
/// No team has been charged yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSale {
    pub player: Player,
    pub team_id: String,
    pub price: u32,
    pub eligible_positions: Vec<String>,
}

/// Session phase. Each variant carries only the data meaningful in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Ready,
    Bidding(Lot),
    Selection(PendingSale),
    Finished,
}

impl Phase {
    pub fn status(&self) -> Status {
        match self {
            Phase::Setup => Status::Setup,
            Phase::Ready => Status::Ready,
            Phase::Bidding(_) => Status::Bidding,
            Phase::Selection(_) => Status::Selection,
            Phase::Finished => Status::Finished,
        }
    }
}

// ---------------------------------------------------------------------------
// Command results
// ---------------------------------------------------------------------------

/// Why a command was refused. A refused command never changes state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("`{command}` is not allowed while {status}")]
    InvalidPhase {
        command: &'static str,
        status: Status,
    },

    #[error("at least two captains are required, got {got}")]
    NotEnoughCaptains { got: usize },

    #[error("unknown player: {0}")]
    UnknownPlayer(String),

    #[error("player {0} was named captain more than once")]
    DuplicateCaptain(String),

    #[error("countdown must be at least one second")]
    ZeroTimer,

    #[error("waiting list is empty")]
    EmptyWaitingList,

    #[error("unknown team: {0}")]
    UnknownTeam(String),

    #[error("{0} has a full roster")]
    TeamFull(String),

    #[error("{team_id} cannot afford {amount} (budget {budget})")]
    InsufficientBudget {
        team_id: String,
        amount: u32,
        budget: u32,
    },

    #[error("bid {amount} does not beat the current bid of {current}")]
    BidNotIncreasing { amount: u32, current: u32 },

    #[error("no player is up for auction")]
    NoCurrentPlayer,

    #[error("no sale is waiting for a position")]
    NoPendingSale,

    #[error("{position} is not one of {eligible:?}")]
    IneligiblePosition {
        position: String,
        eligible: Vec<String>,
    },
}

/// What happened to the lot when bidding closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    /// No sale; the player went to the back of the waiting list.
    Passed { player_id: String },
    /// Sold to a multi-position player's winner, who must now pick a position.
    AwaitingPosition {
        team_id: String,
        eligible_positions: Vec<String>,
    },
    /// Sale finalized.
    Sold(Sale),
}

/// Result of advancing the countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is on the block.
    Idle,
    Running { remaining: u32 },
    /// The countdown hit zero and the lot was closed.
    Expired(EndOutcome),
}

/// A broken bookkeeping invariant. These indicate a bug, never bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("player {0} is held in more than one place")]
    PlayerDuplicated(String),

    #[error("player {0} is not in the waiting list, a roster, or on the block")]
    PlayerLost(String),

    #[error("player {0} is not part of the pool")]
    Untracked(String),

    #[error("team {team_id} holds {len} players, capacity {capacity}")]
    RosterOverflow {
        team_id: String,
        len: usize,
        capacity: usize,
    },

    #[error("high bid of {amount} held by unknown team {team_id}")]
    DanglingBidder { team_id: String, amount: u32 },

    #[error("high bid of zero")]
    ZeroBid,

    #[error("auction finished while team {0} still has room")]
    PrematureFinish(String),
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Per-session constants applied at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionRules {
    pub starting_budget: u32,
    pub roster_size: usize,
}

impl Default for AuctionRules {
    fn default() -> Self {
        AuctionRules {
            starting_budget: STARTING_BUDGET,
            roster_size: ROSTER_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// AuctionState
// ---------------------------------------------------------------------------

/// The complete state of one auction session.
///
/// All mutation goes through the command methods. Each command either
/// applies fully or returns `Err(Rejected)` and leaves the state untouched.
#[derive(Debug, Clone)]
pub struct AuctionState {
    /// Pool as loaded. Never mutated after setup.
    players: Vec<Player>,
    teams: Vec<Team>,
    /// Unsold players; the front is next on the block.
    waiting_list: VecDeque<Player>,
    phase: Phase,
    timer_setting: u32,
    rules: AuctionRules,
    sales: Vec<Sale>,
}

impl AuctionState {
    /// Create a session in `SETUP` over the given pool with default rules.
    pub fn new(players: Vec<Player>) -> Self {
        Self::with_rules(players, AuctionRules::default())
    }

    pub fn with_rules(players: Vec<Player>, rules: AuctionRules) -> Self {
        AuctionState {
            players,
            teams: Vec::new(),
            waiting_list: VecDeque::new(),
            phase: Phase::Setup,
            timer_setting: DEFAULT_TIMER_SECONDS,
            rules,
            sales: Vec::new(),
        }
    }

    // --- Read access ---

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Look up a team by ID.
    pub fn team(&self, team_id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    pub fn waiting_list(&self) -> &VecDeque<Player> {
        &self.waiting_list
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn status(&self) -> Status {
        self.phase.status()
    }

    pub fn rules(&self) -> AuctionRules {
        self.rules
    }

    pub fn timer_setting(&self) -> u32 {
        self.timer_setting
    }

    /// The player on the block or awaiting a position choice.
    pub fn current_player(&self) -> Option<&Player> {
        match &self.phase {
            Phase::Bidding(lot) => Some(&lot.player),
            Phase::Selection(pending) => Some(&pending.player),
            _ => None,
        }
    }

    /// Highest bid on the current player, 0 when there is none.
    pub fn current_bid(&self) -> u32 {
        match &self.phase {
            Phase::Bidding(lot) => lot.current_bid(),
            Phase::Selection(pending) => pending.price,
            _ => 0,
        }
    }

    pub fn high_bidder_id(&self) -> Option<&str> {
        match &self.phase {
            Phase::Bidding(lot) => lot.high_bid.as_ref().map(|b| b.team_id.as_str()),
            Phase::Selection(pending) => Some(pending.team_id.as_str()),
            _ => None,
        }
    }

    /// Seconds left on the countdown while bidding.
    pub fn current_time(&self) -> Option<u32> {
        match &self.phase {
            Phase::Bidding(lot) => Some(lot.time_remaining),
            _ => None,
        }
    }

    /// Finalized sales in order.
    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn sale_count(&self) -> usize {
        self.sales.len()
    }

    /// Total spent across all teams.
    pub fn total_spent(&self) -> u32 {
        self.sales.iter().map(|s| s.price).sum()
    }

    /// The total bid that raising the current bid by `step` would produce.
    pub fn next_bid(&self, step: u32) -> u32 {
        self.current_bid().saturating_add(step)
    }

    /// Whether `place_bid(team_id, amount)` would be accepted right now.
    pub fn can_bid(&self, team_id: &str, amount: u32) -> bool {
        self.validate_bid(team_id, amount).is_ok()
    }

    // --- Commands ---

    /// Replace the player pool. Only valid before setup.
    pub fn load_players(&mut self, players: Vec<Player>) -> Result<(), Rejected> {
        self.require(Status::Setup, "load_players")?;
        info!("Loaded {} players into the pool", players.len());
        self.players = players;
        Ok(())
    }

    /// Form the teams and queue every non-captain player.
    ///
    /// Captains found teams in the given order. A captain's roster position
    /// is their override when one is given, otherwise their first eligible
    /// position. The caller is responsible for the upper bound on the
    /// number of captains.
    pub fn setup(
        &mut self,
        captain_ids: &[String],
        position_overrides: &HashMap<String, String>,
        timer_seconds: u32,
    ) -> Result<(), Rejected> {
        self.require(Status::Setup, "setup")?;
        self.build_teams(captain_ids, position_overrides, timer_seconds)
            .inspect_err(|e| debug!("Setup rejected: {}", e))?;

        info!(
            "Auction set up: {} teams, {} players waiting, {}s timer",
            self.teams.len(),
            self.waiting_list.len(),
            self.timer_setting
        );
        self.debug_check();
        Ok(())
    }

    /// Put the player at the front of the waiting list on the block.
    pub fn start(&mut self) -> Result<Player, Rejected> {
        self.require(Status::Ready, "start")?;
        let player = self.waiting_list.pop_front().ok_or_else(|| {
            debug!("Start ignored: waiting list is empty");
            Rejected::EmptyWaitingList
        })?;

        info!("Bidding opened on {} ({})", player.name, player.id);
        self.phase = Phase::Bidding(Lot {
            player: player.clone(),
            high_bid: None,
            time_remaining: self.timer_setting,
        });
        self.debug_check();
        Ok(player)
    }

    /// Record `amount` as the new high bid for `team_id`.
    ///
    /// `amount` is the full bid, not an increment. An accepted bid restarts
    /// the countdown.
    pub fn place_bid(&mut self, team_id: &str, amount: u32) -> Result<(), Rejected> {
        self.validate_bid(team_id, amount)
            .inspect_err(|e| debug!("Bid rejected: {}", e))?;

        let timer = self.timer_setting;
        if let Phase::Bidding(lot) = &mut self.phase {
            lot.high_bid = Some(Bid {
                team_id: team_id.to_string(),
                amount,
            });
            lot.time_remaining = timer;
            info!("{} bids {} on {}", team_id, amount, lot.player.name);
        }
        self.debug_check();
        Ok(())
    }

    /// Close bidding on the current player.
    ///
    /// With `sold == false`, or with no bid on the table, the player is
    /// passed to the back of the waiting list. Otherwise the sale goes to
    /// the high bidder, pausing in `SELECTION` first if the player has
    /// several eligible positions.
    pub fn end_auction(&mut self, sold: bool) -> Result<EndOutcome, Rejected> {
        let lot = match mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Bidding(lot) => lot,
            other => {
                self.phase = other;
                debug!("End ignored: no player on the block");
                return Err(Rejected::NoCurrentPlayer);
            }
        };
        Ok(self.close_lot(lot, sold))
    }

    /// Finalize a pending sale with the winner's chosen position.
    pub fn confirm_position(&mut self, final_position: &str) -> Result<Sale, Rejected> {
        let pending = match mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Selection(pending) => pending,
            other => {
                self.phase = other;
                debug!("Position ignored: no sale pending");
                return Err(Rejected::NoPendingSale);
            }
        };

        match player::match_eligible(&pending.player.position, final_position) {
            Some(position) => Ok(self.finalize(pending, &position)),
            None => {
                let err = Rejected::IneligiblePosition {
                    position: final_position.to_string(),
                    eligible: pending.eligible_positions.clone(),
                };
                debug!("Position rejected: {}", err);
                self.phase = Phase::Selection(pending);
                Err(err)
            }
        }
    }

    /// Advance the countdown by `elapsed_seconds`.
    ///
    /// When it reaches zero the lot closes: sold to the high bidder if there
    /// is one, passed otherwise. Outside `BIDDING` this does nothing.
    pub fn tick(&mut self, elapsed_seconds: u32) -> TickOutcome {
        match mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Bidding(mut lot) => {
                lot.time_remaining = lot.time_remaining.saturating_sub(elapsed_seconds);
                if lot.time_remaining > 0 {
                    let remaining = lot.time_remaining;
                    self.phase = Phase::Bidding(lot);
                    return TickOutcome::Running { remaining };
                }
                let sold = lot.high_bid.is_some();
                info!("Timer expired on {}", lot.player.name);
                TickOutcome::Expired(self.close_lot(lot, sold))
            }
            other => {
                self.phase = other;
                TickOutcome::Idle
            }
        }
    }

    /// Add `amount` to the budget of every team that still has room.
    ///
    /// Returns the number of teams that received the grant.
    pub fn grant_subsidy(&mut self, amount: u32) -> usize {
        let mut granted = 0;
        for team in self.teams.iter_mut().filter(|t| !t.is_full()) {
            team.budget = team.budget.saturating_add(amount);
            granted += 1;
        }
        info!("Subsidy of {} granted to {} teams", amount, granted);
        self.debug_check();
        granted
    }

    // --- Invariants ---

    /// Verify the bookkeeping invariants.
    ///
    /// After setup, every pool player must be in exactly one place: the
    /// waiting list, one roster, or on the block.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for team in &self.teams {
            if team.roster.len() > team.capacity() {
                return Err(InvariantViolation::RosterOverflow {
                    team_id: team.id.clone(),
                    len: team.roster.len(),
                    capacity: team.capacity(),
                });
            }
        }

        match &self.phase {
            Phase::Setup => return Ok(()),
            Phase::Bidding(lot) => {
                if let Some(bid) = &lot.high_bid {
                    if bid.amount == 0 {
                        return Err(InvariantViolation::ZeroBid);
                    }
                    if self.team(&bid.team_id).is_none() {
                        return Err(InvariantViolation::DanglingBidder {
                            team_id: bid.team_id.clone(),
                            amount: bid.amount,
                        });
                    }
                }
            }
            Phase::Selection(pending) => {
                if self.team(&pending.team_id).is_none() {
                    return Err(InvariantViolation::DanglingBidder {
                        team_id: pending.team_id.clone(),
                        amount: pending.price,
                    });
                }
            }
            Phase::Finished => {
                if let Some(team) = self.teams.iter().find(|t| !t.is_full()) {
                    return Err(InvariantViolation::PrematureFinish(team.id.clone()));
                }
            }
            Phase::Ready => {}
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        let held = self
            .waiting_list
            .iter()
            .chain(self.teams.iter().flat_map(|t| t.roster.iter()))
            .chain(self.current_player());
        for p in held {
            *seen.entry(p.id.as_str()).or_default() += 1;
        }

        let pool_ids: HashSet<&str> = self.players.iter().map(|p| p.id.as_str()).collect();
        if let Some(id) = seen.keys().find(|id| !pool_ids.contains(*id)) {
            return Err(InvariantViolation::Untracked(id.to_string()));
        }
        for p in &self.players {
            match seen.get(p.id.as_str()) {
                None => return Err(InvariantViolation::PlayerLost(p.id.clone())),
                Some(&n) if n > 1 => return Err(InvariantViolation::PlayerDuplicated(p.id.clone())),
                Some(_) => {}
            }
        }

        Ok(())
    }

    // --- Internals ---

    fn require(&self, expected: Status, command: &'static str) -> Result<(), Rejected> {
        let status = self.status();
        if status == expected {
            Ok(())
        } else {
            debug!("`{}` ignored while {}", command, status);
            Err(Rejected::InvalidPhase { command, status })
        }
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check_invariants(), Ok(()), "auction invariant violated");
    }

    fn team_index(&self, team_id: &str) -> Option<usize> {
        self.teams.iter().position(|t| t.id == team_id)
    }

    /// Validate setup inputs and, only if all are valid, install the teams
    /// and the waiting list.
    fn build_teams(
        &mut self,
        captain_ids: &[String],
        position_overrides: &HashMap<String, String>,
        timer_seconds: u32,
    ) -> Result<(), Rejected> {
        if captain_ids.len() < MIN_TEAMS {
            return Err(Rejected::NotEnoughCaptains {
                got: captain_ids.len(),
            });
        }
        if timer_seconds == 0 {
            return Err(Rejected::ZeroTimer);
        }

        let mut captains: HashSet<&str> = HashSet::new();
        let mut teams = Vec::with_capacity(captain_ids.len());
        for (idx, captain_id) in captain_ids.iter().enumerate() {
            if !captains.insert(captain_id.as_str()) {
                return Err(Rejected::DuplicateCaptain(captain_id.clone()));
            }
            let captain = self
                .players
                .iter()
                .find(|p| &p.id == captain_id)
                .ok_or_else(|| Rejected::UnknownPlayer(captain_id.clone()))?;

            let position = position_overrides
                .get(captain_id)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| player::primary_position(&captain.position))
                .unwrap_or_else(|| captain.position.trim().to_string());

            teams.push(Team::new(
                idx,
                captain,
                &position,
                self.rules.starting_budget,
                self.rules.roster_size,
            ));
        }

        let waiting_list = self
            .players
            .iter()
            .filter(|p| !captains.contains(p.id.as_str()))
            .cloned()
            .collect();

        self.teams = teams;
        self.waiting_list = waiting_list;
        self.timer_setting = timer_seconds;
        self.phase = Phase::Ready;
        Ok(())
    }

    fn validate_bid(&self, team_id: &str, amount: u32) -> Result<(), Rejected> {
        let Phase::Bidding(lot) = &self.phase else {
            return Err(Rejected::InvalidPhase {
                command: "bid",
                status: self.status(),
            });
        };
        let team = self
            .team(team_id)
            .ok_or_else(|| Rejected::UnknownTeam(team_id.to_string()))?;
        if team.is_full() {
            return Err(Rejected::TeamFull(team_id.to_string()));
        }
        if team.budget < amount {
            return Err(Rejected::InsufficientBudget {
                team_id: team_id.to_string(),
                amount,
                budget: team.budget,
            });
        }
        let current = lot.current_bid();
        if amount <= current {
            return Err(Rejected::BidNotIncreasing { amount, current });
        }
        Ok(())
    }

    /// Pass or sell a lot that has been taken off the block.
    fn close_lot(&mut self, lot: Lot, sold: bool) -> EndOutcome {
        let bid = match lot.high_bid {
            Some(bid) if sold => bid,
            _ => {
                info!("{} passed, back to the waiting list", lot.player.name);
                let player_id = lot.player.id.clone();
                self.waiting_list.push_back(lot.player);
                self.phase = Phase::Ready;
                self.debug_check();
                return EndOutcome::Passed { player_id };
            }
        };

        let eligible = lot.player.eligible_positions();
        if eligible.len() > 1 {
            info!(
                "{} sold to {} for {}, awaiting position ({})",
                lot.player.name,
                bid.team_id,
                bid.amount,
                eligible.join("/")
            );
            let outcome = EndOutcome::AwaitingPosition {
                team_id: bid.team_id.clone(),
                eligible_positions: eligible.clone(),
            };
            self.phase = Phase::Selection(PendingSale {
                player: lot.player,
                team_id: bid.team_id,
                price: bid.amount,
                eligible_positions: eligible,
            });
            self.debug_check();
            return outcome;
        }

        // A blank specifier has no tokens; the player keeps it as-is.
        let position = eligible
            .into_iter()
            .next()
            .unwrap_or_else(|| lot.player.position.trim().to_string());
        let pending = PendingSale {
            player: lot.player,
            team_id: bid.team_id,
            price: bid.amount,
            eligible_positions: vec![position.clone()],
        };
        EndOutcome::Sold(self.finalize(pending, &position))
    }

    /// Charge the winner, add the player to their roster and move on.
    fn finalize(&mut self, pending: PendingSale, position: &str) -> Sale {
        let team_idx = self.team_index(&pending.team_id).unwrap_or_else(|| {
            panic!("high bidder {} is not a team in this auction", pending.team_id)
        });
        let team = &mut self.teams[team_idx];
        debug_assert!(team.budget >= pending.price, "bid exceeded budget");
        debug_assert!(!team.is_full(), "sold to a full team");

        team.budget = team.budget.saturating_sub(pending.price);
        team.roster.push(pending.player.assigned(position, pending.price));

        let sale = Sale {
            sale_number: self.sales.len() as u32 + 1,
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            player_id: pending.player.id.clone(),
            player_name: pending.player.name.clone(),
            position: position.to_string(),
            price: pending.price,
        };
        info!("Sale {}", sale);
        self.sales.push(sale.clone());

        self.phase = if self.teams.iter().all(Team::is_full) {
            info!("Every roster is complete, auction finished");
            Phase::Finished
        } else {
            Phase::Ready
        };
        self.debug_check();
        sale
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

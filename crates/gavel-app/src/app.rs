// Application state and the auction event loop.
//
// Owns the auction session inside a single task. Operator commands arrive on
// an mpsc channel and a one-second interval drives the countdown; every
// change is pushed to the console as UiUpdate messages.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use gavel_core::config::Config;
use gavel_core::draft::player::Player;
use gavel_core::draft::sale::Sale;
use gavel_core::draft::state::{AuctionState, EndOutcome, Phase, Status, TickOutcome};

use crate::protocol::{
    AuctionEvent, AuctionSnapshot, CaptainPick, HistoryEntry, LotSnapshot, PlayerRef, TeamRef,
    TeamSnapshot, UiUpdate, UserCommand,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Countdown resolution. Each pulse advances the auction clock one second.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub auction: AuctionState,
    /// Countdown pulses are ignored while set. The auction itself does not
    /// know about pausing.
    pub paused: bool,
    /// Countdown length handed to setup.
    pub timer_seconds: u32,
    /// Finalized sales with their wall-clock time.
    pub history: Vec<HistoryEntry>,
}

impl AppState {
    pub fn new(config: Config, pool: Vec<Player>) -> Self {
        let auction = AuctionState::with_rules(pool, config.auction.rules());
        let timer_seconds = config.auction.timer_seconds;
        AppState {
            config,
            auction,
            paused: false,
            timer_seconds,
            history: Vec::new(),
        }
    }

    /// Most captains the pool can support: every team must be able to fill
    /// its roster.
    pub fn max_captains(&self) -> usize {
        self.auction.players().len() / self.config.auction.roster_size
    }

    /// Log a finalized sale with the current local time.
    pub fn record_sale(&mut self, sale: Sale) {
        self.history.push(HistoryEntry {
            sale,
            sold_at: Local::now(),
        });
    }

    /// Build an `AuctionSnapshot` from the current state.
    pub fn build_snapshot(&self) -> AuctionSnapshot {
        let status = self.auction.status();
        let next_bid = self.auction.next_bid(self.config.auction.bid_step);

        let lot = match self.auction.phase() {
            Phase::Bidding(lot) => {
                let bidder = lot.high_bid.as_ref().map(|b| b.team_id.clone());
                Some(LotSnapshot {
                    player: lot.player.clone(),
                    current_bid: lot.current_bid(),
                    high_bidder_name: bidder.as_deref().and_then(|id| self.team_name(id)),
                    high_bidder_id: bidder,
                    time_remaining: Some(lot.time_remaining),
                    next_bid,
                    awaiting_position: false,
                    eligible_positions: lot.player.eligible_positions(),
                })
            }
            Phase::Selection(pending) => Some(LotSnapshot {
                player: pending.player.clone(),
                current_bid: pending.price,
                high_bidder_id: Some(pending.team_id.clone()),
                high_bidder_name: self.team_name(&pending.team_id),
                time_remaining: None,
                next_bid: pending.price,
                awaiting_position: true,
                eligible_positions: pending.eligible_positions.clone(),
            }),
            _ => None,
        };

        let teams = self
            .auction
            .teams()
            .iter()
            .map(|t| TeamSnapshot {
                id: t.id.clone(),
                name: t.name.clone(),
                color: t.color,
                budget: t.budget,
                spent: t.spent(),
                roster: t.roster.clone(),
                capacity: t.capacity(),
                is_full: t.is_full(),
                can_raise: self.auction.can_bid(&t.id, next_bid),
            })
            .collect();

        let timer_setting = if status == Status::Setup {
            self.timer_seconds
        } else {
            self.auction.timer_setting()
        };

        AuctionSnapshot {
            status,
            paused: self.paused,
            timer_setting,
            bid_step: self.config.auction.bid_step,
            max_captains: self.max_captains(),
            lot,
            teams,
            waiting_list: self.auction.waiting_list().iter().cloned().collect(),
            pool: self.auction.players().to_vec(),
            history: self.history.clone(),
            total_spent: self.auction.total_spent(),
        }
    }

    fn team_name(&self, team_id: &str) -> Option<String> {
        self.auction.team(team_id).map(|t| t.name.clone())
    }

    fn player_name(&self, player_id: &str) -> String {
        self.auction
            .players()
            .iter()
            .find(|p| p.id == player_id)
            .map_or_else(|| player_id.to_string(), |p| p.name.clone())
    }

    fn resolve_player(&self, player: &PlayerRef) -> Option<String> {
        let players = self.auction.players();
        match player {
            PlayerRef::Number(n) => players.get(n.checked_sub(1)?).map(|p| p.id.clone()),
            PlayerRef::Id(id) => players.iter().find(|p| &p.id == id).map(|p| p.id.clone()),
        }
    }

    fn resolve_team(&self, team: &TeamRef) -> Option<String> {
        let teams = self.auction.teams();
        match team {
            TeamRef::Number(n) => teams.get(n.checked_sub(1)?).map(|t| t.id.clone()),
            TeamRef::Id(id) => teams.iter().find(|t| &t.id == id).map(|t| t.id.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the auction loop until `Quit` arrives or the command channel closes.
///
/// Commands are always drained before a countdown pulse is handled, so a bid
/// that is already queued when the clock fires restarts the countdown before
/// expiry is checked.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Auction loop started");

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; consume it so the first pulse
    // lands one full interval later.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;

            // --- Operator commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        if handle_user_command(&mut state, cmd, &ui_tx).await {
                            ticker.reset();
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Countdown pulse ---
            _ = ticker.tick(), if !state.paused => {
                handle_tick(&mut state, &ui_tx).await;
            }
        }
    }

    Ok(())
}

/// Advance the countdown by one pulse.
async fn handle_tick(state: &mut AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    match state.auction.tick(1) {
        TickOutcome::Idle => {}
        TickOutcome::Running { remaining } => {
            let _ = ui_tx.send(UiUpdate::Tick { remaining }).await;
        }
        TickOutcome::Expired(outcome) => {
            info!("Countdown expired");
            announce_outcome(state, outcome, ui_tx).await;
            send_snapshot(state, ui_tx).await;
        }
    }
}

/// Apply one operator command.
///
/// Returns `true` when the countdown was (re)started and the pulse should
/// realign to a full second.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) -> bool {
    debug!("Command: {:?}", cmd);
    match cmd {
        UserCommand::Setup { captains } => {
            handle_setup(state, captains, ui_tx).await;
            false
        }
        UserCommand::Timer(secs) => {
            if state.auction.status() != Status::Setup {
                reject(ui_tx, "the countdown can only be changed before setup").await;
            } else if secs == 0 {
                reject(ui_tx, "countdown must be at least one second").await;
            } else {
                info!("Countdown set to {}s", secs);
                state.timer_seconds = secs;
                send_event(ui_tx, AuctionEvent::TimerSet(secs)).await;
            }
            false
        }
        UserCommand::Start => match state.auction.start() {
            Ok(player) => {
                send_event(ui_tx, AuctionEvent::Started { player }).await;
                send_snapshot(state, ui_tx).await;
                true
            }
            Err(e) => {
                reject(ui_tx, e).await;
                false
            }
        },
        UserCommand::Bid { team, step } => {
            let Some(team_id) = state.resolve_team(&team) else {
                reject(ui_tx, format!("no such team: {team}")).await;
                return false;
            };
            let step = step.unwrap_or(state.config.auction.bid_step);
            let amount = state.auction.next_bid(step);
            match state.auction.place_bid(&team_id, amount) {
                Ok(()) => {
                    let team_name = state.team_name(&team_id).unwrap_or(team_id);
                    send_event(ui_tx, AuctionEvent::BidPlaced { team_name, amount }).await;
                    send_snapshot(state, ui_tx).await;
                    true
                }
                Err(e) => {
                    reject(ui_tx, e).await;
                    false
                }
            }
        }
        UserCommand::Sold => {
            handle_end(state, true, ui_tx).await;
            false
        }
        UserCommand::Pass => {
            handle_end(state, false, ui_tx).await;
            false
        }
        UserCommand::Pick(position) => {
            match state.auction.confirm_position(&position) {
                Ok(sale) => {
                    announce_sale(state, sale, ui_tx).await;
                    send_snapshot(state, ui_tx).await;
                }
                Err(e) => reject(ui_tx, e).await,
            }
            false
        }
        UserCommand::Subsidy(amount) => {
            let teams = state.auction.grant_subsidy(amount);
            send_event(ui_tx, AuctionEvent::SubsidyGranted { amount, teams }).await;
            send_snapshot(state, ui_tx).await;
            false
        }
        UserCommand::Pause => {
            if state.paused {
                reject(ui_tx, "already paused").await;
            } else {
                info!("Countdown paused");
                state.paused = true;
                send_event(ui_tx, AuctionEvent::Paused).await;
            }
            false
        }
        UserCommand::Resume => {
            if !state.paused {
                reject(ui_tx, "not paused").await;
                return false;
            }
            info!("Countdown resumed");
            state.paused = false;
            send_event(ui_tx, AuctionEvent::Resumed).await;
            true
        }
        UserCommand::Show(view) => {
            let snapshot = Box::new(state.build_snapshot());
            let _ = ui_tx.send(UiUpdate::Show { view, snapshot }).await;
            false
        }
        UserCommand::Help | UserCommand::Quit => {
            // Help is answered by the console; Quit is handled in the main loop.
            false
        }
    }
}

async fn handle_setup(
    state: &mut AppState,
    captains: Vec<CaptainPick>,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    let max = state.max_captains();
    if state.auction.status() == Status::Setup && captains.len() > max {
        reject(
            ui_tx,
            format!(
                "at most {max} captains for a pool of {} players",
                state.auction.players().len()
            ),
        )
        .await;
        return;
    }

    let mut ids = Vec::with_capacity(captains.len());
    let mut overrides = HashMap::new();
    for pick in &captains {
        let Some(id) = state.resolve_player(&pick.player) else {
            reject(ui_tx, format!("no such player: {}", pick.player)).await;
            return;
        };
        if let Some(position) = &pick.position {
            overrides.insert(id.clone(), position.clone());
        }
        ids.push(id);
    }

    match state.auction.setup(&ids, &overrides, state.timer_seconds) {
        Ok(()) => {
            let event = AuctionEvent::SetupComplete {
                teams: state.auction.teams().len(),
                waiting: state.auction.waiting_list().len(),
            };
            send_event(ui_tx, event).await;
            send_snapshot(state, ui_tx).await;
        }
        Err(e) => reject(ui_tx, e).await,
    }
}

async fn handle_end(state: &mut AppState, sold: bool, ui_tx: &mpsc::Sender<UiUpdate>) {
    match state.auction.end_auction(sold) {
        Ok(outcome) => {
            announce_outcome(state, outcome, ui_tx).await;
            send_snapshot(state, ui_tx).await;
        }
        Err(e) => reject(ui_tx, e).await,
    }
}

/// Tell the console how a lot closed.
async fn announce_outcome(state: &mut AppState, outcome: EndOutcome, ui_tx: &mpsc::Sender<UiUpdate>) {
    match outcome {
        EndOutcome::Passed { player_id } => {
            let player_name = state.player_name(&player_id);
            send_event(ui_tx, AuctionEvent::Passed { player_name }).await;
        }
        EndOutcome::AwaitingPosition {
            team_id,
            eligible_positions,
        } => {
            let player_name = state
                .auction
                .current_player()
                .map(|p| p.name.clone())
                .unwrap_or_default();
            let team_name = state.team_name(&team_id).unwrap_or(team_id);
            let event = AuctionEvent::AwaitingPosition {
                team_name,
                player_name,
                eligible_positions,
            };
            send_event(ui_tx, event).await;
        }
        EndOutcome::Sold(sale) => announce_sale(state, sale, ui_tx).await,
    }
}

async fn announce_sale(state: &mut AppState, sale: Sale, ui_tx: &mpsc::Sender<UiUpdate>) {
    state.record_sale(sale.clone());
    send_event(ui_tx, AuctionEvent::Sold(sale)).await;
    if state.auction.status() == Status::Finished {
        info!("Auction finished after {} sales", state.history.len());
        send_event(ui_tx, AuctionEvent::Finished).await;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn send_event(ui_tx: &mpsc::Sender<UiUpdate>, event: AuctionEvent) {
    let _ = ui_tx.send(UiUpdate::Event(event)).await;
}

async fn send_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let snapshot = state.build_snapshot();
    let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
}

async fn reject(ui_tx: &mpsc::Sender<UiUpdate>, reason: impl ToString) {
    let _ = ui_tx.send(UiUpdate::Rejected(reason.to_string())).await;
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn spawn_app(
        state: AppState,
    ) -> (
        mpsc::Sender<UserCommand>,
        mpsc::Receiver<UiUpdate>,
        tokio::task::JoinHandle<anyhow::Result<()>>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, ui_rx) = mpsc::channel(256);
        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));
        (cmd_tx, ui_rx, handle)
    }

    /// Next update that is not a countdown pulse or snapshot.
    async fn next_event(ui_rx: &mut mpsc::Receiver<UiUpdate>) -> UiUpdate {
        loop {
            match ui_rx.recv().await.expect("app loop should be running") {
                UiUpdate::Tick { .. } | UiUpdate::Snapshot(_) => continue,
                other => return other,
            }
        }
    }

    async fn show_status(
        cmd_tx: &mpsc::Sender<UserCommand>,
        ui_rx: &mut mpsc::Receiver<UiUpdate>,
    ) -> AuctionSnapshot {
        cmd_tx
            .send(UserCommand::Show(crate::protocol::View::Status))
            .await
            .unwrap();
        match next_event(ui_rx).await {
            UiUpdate::Show { snapshot, .. } => *snapshot,
            other => panic!("expected Show, got {other:?}"),
        }
    }

    fn setup_cmd(numbers: &[usize]) -> UserCommand {
        UserCommand::Setup {
            captains: numbers
                .iter()
                .map(|&n| CaptainPick {
                    player: PlayerRef::Number(n),
                    position: None,
                })
                .collect(),
        }
    }

    // -- AppState --

    #[test]
    fn max_captains_follows_pool_size() {
        assert_eq!(app_state(9).max_captains(), 1);
        assert_eq!(app_state(10).max_captains(), 2);
        assert_eq!(app_state(24).max_captains(), 4);
    }

    #[test]
    fn resolve_refs() {
        let mut state = app_state(12);
        assert_eq!(state.resolve_player(&PlayerRef::Number(1)).as_deref(), Some("p-0"));
        assert_eq!(state.resolve_player(&PlayerRef::Number(13)), None);
        assert_eq!(
            state.resolve_player(&PlayerRef::Id("p-11".into())).as_deref(),
            Some("p-11")
        );
        assert_eq!(state.resolve_team(&TeamRef::Number(1)), None);

        state.setup_captains(&["p-3", "p-4"]);
        assert_eq!(state.resolve_team(&TeamRef::Number(2)).as_deref(), Some("team-1"));
        assert_eq!(
            state.resolve_team(&TeamRef::Id("team-0".into())).as_deref(),
            Some("team-0")
        );
        assert_eq!(state.resolve_team(&TeamRef::Id("team-7".into())), None);
    }

    #[test]
    fn snapshot_marks_teams_that_can_raise() {
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        state.auction.start().unwrap();
        state.auction.place_bid("team-0", 995).unwrap();

        let snap = state.build_snapshot();
        let lot = snap.lot.as_ref().unwrap();
        assert_eq!(lot.next_bid, 1005);
        assert_eq!(lot.high_bidder_name.as_deref(), Some("Player 0 TEAM"));
        assert!(!snap.teams[0].can_raise);
        assert!(!snap.teams[1].can_raise);

        state.auction.grant_subsidy(10);
        let snap = state.build_snapshot();
        assert!(snap.teams[1].can_raise);
    }

    #[test]
    fn snapshot_in_setup_shows_pending_timer() {
        let mut state = app_state(10);
        state.timer_seconds = 45;
        let snap = state.build_snapshot();
        assert_eq!(snap.status, Status::Setup);
        assert_eq!(snap.timer_setting, 45);
        assert_eq!(snap.max_captains, 2);
        assert!(snap.lot.is_none());
        assert!(snap.teams.is_empty());
    }

    // -- Event loop --

    #[tokio::test]
    async fn setup_start_and_sell() {
        tokio::time::pause();
        let (cmd_tx, mut ui_rx, handle) = spawn_app(app_state(12));

        cmd_tx.send(setup_cmd(&[1, 2])).await.unwrap();
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::SetupComplete { teams: 2, waiting: 10 })
        ));

        cmd_tx.send(UserCommand::Start).await.unwrap();
        match next_event(&mut ui_rx).await {
            UiUpdate::Event(AuctionEvent::Started { player }) => assert_eq!(player.id, "p-2"),
            other => panic!("expected Started, got {other:?}"),
        }

        cmd_tx
            .send(UserCommand::Bid {
                team: TeamRef::Number(2),
                step: Some(40),
            })
            .await
            .unwrap();
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::BidPlaced { amount: 40, .. })
        ));

        cmd_tx.send(UserCommand::Sold).await.unwrap();
        match next_event(&mut ui_rx).await {
            UiUpdate::Event(AuctionEvent::Sold(sale)) => {
                assert_eq!(sale.team_id, "team-1");
                assert_eq!(sale.price, 40);
            }
            other => panic!("expected Sold, got {other:?}"),
        }

        let snap = show_status(&cmd_tx, &mut ui_rx).await;
        assert_eq!(snap.history.len(), 1);
        assert_eq!(snap.teams[1].budget, 960);

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn countdown_expiry_sells_to_high_bidder() {
        tokio::time::pause();
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        let (cmd_tx, mut ui_rx, handle) = spawn_app(state);

        cmd_tx.send(UserCommand::Start).await.unwrap();
        cmd_tx
            .send(UserCommand::Bid {
                team: TeamRef::Id("team-0".into()),
                step: None,
            })
            .await
            .unwrap();

        // Time auto-advances while the loop waits on the interval.
        let mut last_tick = None;
        let sale = loop {
            match ui_rx.recv().await.unwrap() {
                UiUpdate::Tick { remaining } => last_tick = Some(remaining),
                UiUpdate::Event(AuctionEvent::Sold(sale)) => break sale,
                _ => {}
            }
        };
        assert_eq!(last_tick, Some(1));
        assert_eq!(sale.team_id, "team-0");
        assert_eq!(sale.price, 10);

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn queued_bid_is_applied_before_the_pulse() {
        tokio::time::pause();
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        state.auction.start().unwrap();
        state.auction.tick(29);
        assert_eq!(state.auction.current_time(), Some(1));

        // Queue the bid before the loop exists so it is waiting when the
        // first pulse becomes due.
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (ui_tx, mut ui_rx) = mpsc::channel(256);
        cmd_tx
            .send(UserCommand::Bid {
                team: TeamRef::Number(1),
                step: None,
            })
            .await
            .unwrap();
        let handle = tokio::spawn(run(cmd_rx, ui_tx, state));

        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::BidPlaced { amount: 10, .. })
        ));
        loop {
            match ui_rx.recv().await.unwrap() {
                UiUpdate::Tick { remaining } => {
                    assert_eq!(remaining, 29);
                    break;
                }
                UiUpdate::Snapshot(_) => continue,
                other => panic!("lot should still be open, got {other:?}"),
            }
        }

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn pause_freezes_the_countdown() {
        tokio::time::pause();
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        let (cmd_tx, mut ui_rx, handle) = spawn_app(state);

        cmd_tx.send(UserCommand::Start).await.unwrap();
        cmd_tx.send(UserCommand::Pause).await.unwrap();
        let _ = next_event(&mut ui_rx).await; // Started
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::Paused)
        ));

        let before = show_status(&cmd_tx, &mut ui_rx).await;
        assert!(before.paused);
        tokio::time::advance(Duration::from_secs(120)).await;
        let after = show_status(&cmd_tx, &mut ui_rx).await;
        assert_eq!(
            before.lot.unwrap().time_remaining,
            after.lot.unwrap().time_remaining
        );

        cmd_tx.send(UserCommand::Pause).await.unwrap();
        assert!(matches!(next_event(&mut ui_rx).await, UiUpdate::Rejected(_)));

        cmd_tx.send(UserCommand::Resume).await.unwrap();
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::Resumed)
        ));
        assert!(matches!(ui_rx.recv().await.unwrap(), UiUpdate::Tick { .. }));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn multi_position_sale_waits_for_pick() {
        tokio::time::pause();
        let mut pool = test_pool(12);
        pool[2].position = "TOP/JUG".into();
        let mut state = AppState::new(test_config(), pool);
        state.setup_captains(&["p-0", "p-1"]);
        let (cmd_tx, mut ui_rx, handle) = spawn_app(state);

        cmd_tx.send(UserCommand::Start).await.unwrap();
        cmd_tx
            .send(UserCommand::Bid {
                team: TeamRef::Number(1),
                step: Some(70),
            })
            .await
            .unwrap();
        cmd_tx.send(UserCommand::Sold).await.unwrap();
        let _ = next_event(&mut ui_rx).await; // Started
        let _ = next_event(&mut ui_rx).await; // BidPlaced
        match next_event(&mut ui_rx).await {
            UiUpdate::Event(AuctionEvent::AwaitingPosition {
                team_name,
                player_name,
                eligible_positions,
            }) => {
                assert_eq!(team_name, "Player 0 TEAM");
                assert_eq!(player_name, "Player 2");
                assert_eq!(eligible_positions, vec!["TOP", "JUG"]);
            }
            other => panic!("expected AwaitingPosition, got {other:?}"),
        }

        cmd_tx.send(UserCommand::Pick("MID".into())).await.unwrap();
        assert!(matches!(next_event(&mut ui_rx).await, UiUpdate::Rejected(_)));

        cmd_tx.send(UserCommand::Pick("jug".into())).await.unwrap();
        match next_event(&mut ui_rx).await {
            UiUpdate::Event(AuctionEvent::Sold(sale)) => assert_eq!(sale.position, "JUG"),
            other => panic!("expected Sold, got {other:?}"),
        }

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn rejections_are_reported() {
        tokio::time::pause();
        let (cmd_tx, mut ui_rx, handle) = spawn_app(app_state(10));

        cmd_tx
            .send(UserCommand::Bid {
                team: TeamRef::Number(1),
                step: None,
            })
            .await
            .unwrap();
        match next_event(&mut ui_rx).await {
            UiUpdate::Rejected(reason) => assert!(reason.contains("no such team")),
            other => panic!("expected Rejected, got {other:?}"),
        }

        cmd_tx.send(setup_cmd(&[1, 2, 3])).await.unwrap();
        match next_event(&mut ui_rx).await {
            UiUpdate::Rejected(reason) => assert!(reason.contains("at most 2 captains")),
            other => panic!("expected Rejected, got {other:?}"),
        }

        cmd_tx.send(setup_cmd(&[1, 11])).await.unwrap();
        match next_event(&mut ui_rx).await {
            UiUpdate::Rejected(reason) => assert_eq!(reason, "no such player: #11"),
            other => panic!("expected Rejected, got {other:?}"),
        }

        cmd_tx.send(setup_cmd(&[1])).await.unwrap();
        assert!(matches!(next_event(&mut ui_rx).await, UiUpdate::Rejected(_)));

        cmd_tx.send(UserCommand::Timer(0)).await.unwrap();
        assert!(matches!(next_event(&mut ui_rx).await, UiUpdate::Rejected(_)));

        cmd_tx.send(UserCommand::Timer(15)).await.unwrap();
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::TimerSet(15))
        ));
        cmd_tx.send(setup_cmd(&[1, 2])).await.unwrap();
        let _ = next_event(&mut ui_rx).await; // SetupComplete
        let snap = show_status(&cmd_tx, &mut ui_rx).await;
        assert_eq!(snap.timer_setting, 15);

        cmd_tx.send(UserCommand::Timer(20)).await.unwrap();
        assert!(matches!(next_event(&mut ui_rx).await, UiUpdate::Rejected(_)));

        cmd_tx.send(UserCommand::Quit).await.unwrap();
        let _ = handle.await;
    }

    #[tokio::test]
    async fn closed_command_channel_stops_the_loop() {
        let (cmd_tx, _ui_rx, handle) = spawn_app(app_state(10));
        drop(cmd_tx);
        assert!(handle.await.unwrap().is_ok());
    }
}

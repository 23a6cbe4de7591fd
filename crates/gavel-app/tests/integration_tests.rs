// Integration tests for the auction console.
//
// These run the shipped defaults (config and player list) through the app
// loop over real channels, the way the binary wires things together.

use std::path::PathBuf;

use tokio::sync::mpsc;

use gavel_app::app::{self, AppState};
use gavel_app::input::parse_command;
use gavel_app::protocol::{AuctionEvent, AuctionSnapshot, UiUpdate, UserCommand, View};
use gavel_core::config::{self, Config};
use gavel_core::draft::state::Status;
use gavel_core::pool;

// ===========================================================================
// Test helpers
// ===========================================================================

fn package_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Load the shipped defaults from a scratch copy of the config directory.
fn default_config(name: &str) -> Config {
    let base = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&base);
    std::fs::create_dir_all(base.join("config")).unwrap();
    std::fs::copy(
        package_dir().join("defaults").join("auction.toml"),
        base.join("config").join("auction.toml"),
    )
    .unwrap();

    let config = config::load_config_from(&base).expect("defaults should be valid");
    let _ = std::fs::remove_dir_all(&base);
    config
}

fn default_state(name: &str) -> AppState {
    let config = default_config(name);
    let players = pool::load_pool(&package_dir().join(&config.data.players))
        .expect("shipped player list should load");
    AppState::new(config, players)
}

fn cmd(line: &str) -> UserCommand {
    parse_command(line).unwrap().unwrap()
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

async fn show(
    cmd_tx: &mpsc::Sender<UserCommand>,
    ui_rx: &mut mpsc::Receiver<UiUpdate>,
    view: View,
) -> AuctionSnapshot {
    cmd_tx.send(UserCommand::Show(view)).await.unwrap();
    match next_event(ui_rx).await {
        UiUpdate::Show { snapshot, .. } => *snapshot,
        other => panic!("expected Show, got {other:?}"),
    }
}

// ===========================================================================
// Test: Shipped defaults
// ===========================================================================

#[test]
fn shipped_defaults_load() {
    let config = default_config("gavel_app_defaults_load");
    assert_eq!(config.auction.timer_seconds, 30);
    assert_eq!(config.auction.bid_step, 10);
    assert_eq!(config.auction.starting_budget, 1000);
    assert_eq!(config.auction.roster_size, 5);
    assert_eq!(config.data.players, "data/players.csv");

    let players = pool::load_pool(&package_dir().join(&config.data.players)).unwrap();
    assert_eq!(players.len(), 20);
    assert_eq!(players[0].name, "Faker");
    assert_eq!(players[0].most_champion.as_deref(), Some("Ahri"));
    assert_eq!(players[6].eligible_positions(), vec!["TOP", "JUG"]);
}

// ===========================================================================
// Test: Full session through the app loop
// ===========================================================================

#[tokio::test]
async fn full_session_with_shipped_pool() {
    let state = default_state("gavel_app_full_session");
    assert_eq!(state.max_captains(), 4);

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, state));

    // Faker, Zeus, Oner and Gumayusi captain; Zeus plays JUG.
    cmd_tx.send(cmd("setup 1 2:jug 3 4")).await.unwrap();
    match next_event(&mut ui_rx).await {
        UiUpdate::Event(AuctionEvent::SetupComplete { teams, waiting }) => {
            assert_eq!((teams, waiting), (4, 16));
        }
        other => panic!("expected SetupComplete, got {other:?}"),
    }

    let snap = show(&cmd_tx, &mut ui_rx, View::Teams).await;
    assert_eq!(snap.status, Status::Ready);
    assert_eq!(snap.teams[1].name, "Zeus TEAM");
    assert_eq!(snap.teams[1].roster[0].position, "JUG");

    // Round-robin: every team buys four players at the default step.
    let mut sold = 0;
    while sold < 16 {
        cmd_tx.send(cmd("next")).await.unwrap();
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::Started { .. })
        ));

        let team = sold % 4 + 1;
        cmd_tx.send(cmd(&format!("bid {team}"))).await.unwrap();
        assert!(matches!(
            next_event(&mut ui_rx).await,
            UiUpdate::Event(AuctionEvent::BidPlaced { amount: 10, .. })
        ));

        cmd_tx.send(cmd("sold")).await.unwrap();
        loop {
            match next_event(&mut ui_rx).await {
                UiUpdate::Event(AuctionEvent::AwaitingPosition {
                    eligible_positions, ..
                }) => {
                    let pick = eligible_positions.last().unwrap().to_lowercase();
                    cmd_tx.send(cmd(&format!("pick {pick}"))).await.unwrap();
                }
                UiUpdate::Event(AuctionEvent::Sold(sale)) => {
                    assert_eq!(sale.price, 10);
                    sold += 1;
                    break;
                }
                other => panic!("unexpected update {other:?}"),
            }
        }
    }
    assert!(matches!(
        next_event(&mut ui_rx).await,
        UiUpdate::Event(AuctionEvent::Finished)
    ));

    cmd_tx.send(cmd("next")).await.unwrap();
    assert!(matches!(next_event(&mut ui_rx).await, UiUpdate::Rejected(_)));

    let snap = show(&cmd_tx, &mut ui_rx, View::History).await;
    assert_eq!(snap.status, Status::Finished);
    assert_eq!(snap.history.len(), 16);
    assert_eq!(snap.total_spent, 160);
    assert!(snap.teams.iter().all(|t| t.is_full && t.budget == 960));
    assert!(snap.waiting_list.is_empty());

    // Doran went TOP/JUG; the last eligible position was picked.
    let doran = snap
        .history
        .iter()
        .find(|h| h.sale.player_name == "Doran")
        .unwrap();
    assert_eq!(doran.sale.position, "JUG");

    cmd_tx.send(cmd("quit")).await.unwrap();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn captain_limit_follows_pool_size() {
    let state = default_state("gavel_app_captain_limit");
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let handle = tokio::spawn(app::run(cmd_rx, ui_tx, state));

    cmd_tx.send(cmd("setup 1 2 3 4 5")).await.unwrap();
    match next_event(&mut ui_rx).await {
        UiUpdate::Rejected(reason) => {
            assert_eq!(reason, "at most 4 captains for a pool of 20 players");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    let snap = show(&cmd_tx, &mut ui_rx, View::Status).await;
    assert_eq!(snap.status, Status::Setup);
    assert_eq!(snap.max_captains, 4);

    drop(cmd_tx);
    assert!(handle.await.unwrap().is_ok());
}

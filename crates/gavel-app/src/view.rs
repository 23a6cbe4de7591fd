// Plain-text rendering of snapshots and events for the operator console.

use std::fmt::Write;

use gavel_core::draft::player::Player;
use gavel_core::draft::state::Status;

use crate::protocol::{AuctionEvent, AuctionSnapshot, TeamSnapshot, View};

/// Countdown values always announced, in addition to every tenth second.
const FINAL_SECONDS: u32 = 5;

pub const HELP: &str = "\
Commands:
  setup <player>[:POS] ...  form teams; player is a pool number or id,
                            :POS overrides the captain's position
  timer <secs>              countdown length (before setup)
  start | next              put the next player on the block
  bid <team> [step]         raise the current bid; team is a number or id
  sold                      close bidding and sell to the high bidder
  pass                      close bidding without a sale
  pick <POS>                choose the position for a multi-position sale
  subsidy <amount>          add budget to every team with room
  pause | resume            stop or restart the countdown
  status | list | teams | pool | history | json
  help                      this text
  quit";

/// One-line summary of where the auction stands.
pub fn status_line(s: &AuctionSnapshot) -> String {
    let mut line = format!("[{}] ", s.status);
    match (s.status, &s.lot) {
        (Status::Setup, _) => {
            let _ = write!(
                line,
                "{} players in the pool, up to {} captains, {}s timer",
                s.pool.len(),
                s.max_captains,
                s.timer_setting
            );
        }
        (Status::Bidding, Some(lot)) => {
            let _ = write!(line, "{}", player_label(&lot.player));
            match &lot.high_bidder_name {
                Some(bidder) => {
                    let _ = write!(line, " | {} by {}", lot.current_bid, bidder);
                }
                None => line.push_str(" | no bids"),
            }
            if let Some(t) = lot.time_remaining {
                let _ = write!(line, " | {t}s");
            }
        }
        (Status::Selection, Some(lot)) => {
            let _ = write!(
                line,
                "{} sold to {} for {}, pick one of {}",
                lot.player.name,
                lot.high_bidder_name.as_deref().unwrap_or("?"),
                lot.current_bid,
                lot.eligible_positions.join("/")
            );
        }
        (Status::Finished, _) => {
            let _ = write!(
                line,
                "{} sales, {} spent",
                s.history.len(),
                s.total_spent
            );
        }
        _ => {
            let _ = write!(
                line,
                "{} waiting, {} spent",
                s.waiting_list.len(),
                s.total_spent
            );
        }
    }
    if s.paused {
        line.push_str(" (paused)");
    }
    line
}

/// Announcement for an auction event.
pub fn render_event(event: &AuctionEvent) -> String {
    match event {
        AuctionEvent::SetupComplete { teams, waiting } => {
            format!("{teams} teams formed, {waiting} players waiting")
        }
        AuctionEvent::TimerSet(secs) => format!("Countdown set to {secs}s"),
        AuctionEvent::Started { player } => format!("Up next: {}", player_label(player)),
        AuctionEvent::BidPlaced { team_name, amount } => format!("{team_name} bids {amount}"),
        AuctionEvent::Passed { player_name } => {
            format!("{player_name} passed, back of the line")
        }
        AuctionEvent::AwaitingPosition {
            team_name,
            player_name,
            eligible_positions,
        } => format!(
            "{player_name} goes to {team_name}; pick a position: {}",
            eligible_positions.join(" / ")
        ),
        AuctionEvent::Sold(sale) => format!("SOLD {sale}"),
        AuctionEvent::SubsidyGranted { amount, teams } => {
            format!("Subsidy of {amount} granted to {teams} teams")
        }
        AuctionEvent::Paused => "Countdown paused".into(),
        AuctionEvent::Resumed => "Countdown resumed".into(),
        AuctionEvent::Finished => "Every roster is complete. Auction finished.".into(),
    }
}

/// Countdown announcement, if this second is worth printing.
pub fn countdown_line(remaining: u32) -> Option<String> {
    (remaining <= FINAL_SECONDS || remaining % 10 == 0).then(|| format!("  ... {remaining}s"))
}

/// Full listing for a `Show` request.
pub fn render_view(view: View, s: &AuctionSnapshot) -> String {
    match view {
        View::Status => {
            let mut out = status_line(s);
            for (i, team) in s.teams.iter().enumerate() {
                let _ = write!(out, "\n  {}", team_summary(i, team));
            }
            out
        }
        View::WaitingList => numbered_players("Waiting list", &s.waiting_list),
        View::Pool => numbered_players("Player pool", &s.pool),
        View::Teams => {
            if s.teams.is_empty() {
                return "No teams yet; run `setup` first.".into();
            }
            let mut out = String::new();
            for (i, team) in s.teams.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(&team_summary(i, team));
                for (slot, p) in team.roster.iter().enumerate() {
                    let price = match p.cost {
                        Some(cost) => cost.to_string(),
                        None if slot == 0 => "captain".into(),
                        None => "-".into(),
                    };
                    let _ = write!(out, "\n     {:<4} {:<16} {}", p.position, p.name, price);
                }
            }
            out
        }
        View::History => {
            if s.history.is_empty() {
                return "No sales yet.".into();
            }
            let mut out = format!("{} sales, {} spent", s.history.len(), s.total_spent);
            for entry in &s.history {
                let _ = write!(out, "\n  {}  {}", entry.sold_at.format("%H:%M:%S"), entry.sale);
            }
            out
        }
        View::Json => serde_json::to_string_pretty(s)
            .unwrap_or_else(|e| format!("failed to encode snapshot: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn player_label(p: &Player) -> String {
    match &p.most_champion {
        Some(champ) => format!("{} ({}, {}, {})", p.name, p.position, p.tier, champ),
        None => format!("{} ({}, {})", p.name, p.position, p.tier),
    }
}

fn team_summary(idx: usize, t: &TeamSnapshot) -> String {
    let mut line = format!(
        "{}. {} [{}] budget {}, {}/{}",
        idx + 1,
        t.name,
        t.color,
        t.budget,
        t.roster.len(),
        t.capacity
    );
    if t.is_full {
        line.push_str(" FULL");
    }
    line
}

fn numbered_players(title: &str, players: &[Player]) -> String {
    let mut out = format!("{title} ({})", players.len());
    for (i, p) in players.iter().enumerate() {
        let _ = write!(out, "\n  {:>3}. {:<6} {}", i + 1, p.id, player_label(p));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::app_state;

    #[test]
    fn setup_status_line() {
        let state = app_state(12);
        let line = status_line(&state.build_snapshot());
        assert_eq!(line, "[SETUP] 12 players in the pool, up to 2 captains, 30s timer");
    }

    #[test]
    fn bidding_status_line() {
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        state.auction.start().unwrap();
        assert_eq!(
            status_line(&state.build_snapshot()),
            "[BIDDING] Player 2 (MID, Gold) | no bids | 30s"
        );

        state.auction.place_bid("team-1", 40).unwrap();
        state.paused = true;
        assert_eq!(
            status_line(&state.build_snapshot()),
            "[BIDDING] Player 2 (MID, Gold) | 40 by Player 1 TEAM | 30s (paused)"
        );
    }

    #[test]
    fn selection_status_line() {
        let mut state = app_state(12);
        state.auction.load_players({
            let mut players = state.auction.players().to_vec();
            players[2].position = "MID/ADC".into();
            players
        })
        .unwrap();
        state.setup_captains(&["p-0", "p-1"]);
        state.auction.start().unwrap();
        state.auction.place_bid("team-0", 90).unwrap();
        state.auction.end_auction(true).unwrap();

        assert_eq!(
            status_line(&state.build_snapshot()),
            "[SELECTION] Player 2 sold to Player 0 TEAM for 90, pick one of MID/ADC"
        );
    }

    #[test]
    fn countdown_announces_tens_and_final_seconds() {
        assert!(countdown_line(30).is_some());
        assert!(countdown_line(20).is_some());
        assert!(countdown_line(17).is_none());
        assert!(countdown_line(6).is_none());
        assert_eq!(countdown_line(3).as_deref(), Some("  ... 3s"));
    }

    #[test]
    fn teams_view_lists_rosters() {
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        state.auction.start().unwrap();
        state.auction.place_bid("team-0", 75).unwrap();
        state.auction.end_auction(true).unwrap();

        let out = render_view(View::Teams, &state.build_snapshot());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "1. Player 0 TEAM [cyan] budget 925, 2/5");
        assert!(lines[1].contains("Player 0") && lines[1].ends_with("captain"));
        assert!(lines[2].contains("Player 2") && lines[2].ends_with("75"));
        assert_eq!(lines[3], "2. Player 1 TEAM [pink] budget 1000, 1/5");
    }

    #[test]
    fn teams_view_before_setup() {
        let state = app_state(12);
        let out = render_view(View::Teams, &state.build_snapshot());
        assert!(out.contains("run `setup`"));
    }

    #[test]
    fn waiting_list_is_numbered() {
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        let out = render_view(View::WaitingList, &state.build_snapshot());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Waiting list (10)");
        assert!(lines[1].trim_start().starts_with("1. p-2"));
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn history_view_shows_sales() {
        let mut state = app_state(12);
        assert_eq!(render_view(View::History, &state.build_snapshot()), "No sales yet.");

        state.setup_captains(&["p-0", "p-1"]);
        state.auction.start().unwrap();
        state.auction.place_bid("team-1", 60).unwrap();
        if let gavel_core::draft::state::EndOutcome::Sold(sale) =
            state.auction.end_auction(true).unwrap()
        {
            state.record_sale(sale);
        }

        let out = render_view(View::History, &state.build_snapshot());
        assert!(out.starts_with("1 sales, 60 spent"));
        assert!(out.contains("#1 Player 1 TEAM: Player 2 (MID) -- 60"));
    }

    #[test]
    fn json_view_is_valid_json() {
        let mut state = app_state(12);
        state.setup_captains(&["p-0", "p-1"]);
        let out = render_view(View::Json, &state.build_snapshot());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "READY");
        assert_eq!(value["teams"][0]["color"], "cyan");
        assert_eq!(value["waiting_list"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn events_render() {
        assert_eq!(
            render_event(&AuctionEvent::BidPlaced {
                team_name: "Faker TEAM".into(),
                amount: 120
            }),
            "Faker TEAM bids 120"
        );
        assert_eq!(
            render_event(&AuctionEvent::AwaitingPosition {
                team_name: "Faker TEAM".into(),
                player_name: "Doran".into(),
                eligible_positions: vec!["TOP".into(), "JUG".into()],
            }),
            "Doran goes to Faker TEAM; pick a position: TOP / JUG"
        );
    }
}

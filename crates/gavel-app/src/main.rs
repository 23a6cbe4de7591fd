// Auction console entry point.
//
// Startup sequence:
// 1. Load config (writing defaults on first run)
// 2. Initialize tracing (log to file, the terminal belongs to the console)
// 3. Load the player pool
// 4. Create mpsc channels
// 5. Spawn the auction loop
// 6. Run the console until the operator quits
// 7. Cleanup on exit

use std::path::Path;

use gavel_app::app;
use gavel_app::console;
use gavel_core::config::{self, LoggingConfig};
use gavel_core::pool;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;
    info!("Auction console starting up");
    info!(
        "Config loaded: {}s timer, bid step {}, budget {}, rosters of {}",
        config.auction.timer_seconds,
        config.auction.bid_step,
        config.auction.starting_budget,
        config.auction.roster_size
    );

    // 3. Load the player pool
    let players = pool::load_pool(Path::new(&config.data.players))
        .with_context(|| format!("failed to load player pool from {}", config.data.players))?;
    println!("Loaded {} players from {}", players.len(), config.data.players);

    // 4. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let app_state = app::AppState::new(config, players);

    // 5. Spawn the auction loop
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Auction loop error: {}", e);
        }
    });

    // 6. Run the console (blocks until the operator quits)
    if let Err(e) = console::run(ui_rx, cmd_tx).await {
        error!("Console error: {}", e);
    }

    // 7. Cleanup: wait for the auction loop to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Auction console shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file under the configured directory.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join(&logging.dir);
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gavel.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&logging.filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

// Line-oriented operator console.
//
// Reads commands from stdin and prints whatever the app loop reports. Runs
// on the main task until the operator quits or the app loop goes away.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::input::parse_command;
use crate::protocol::{UiUpdate, UserCommand};
use crate::view;

/// Run the console on stdin/stdout.
pub async fn run(
    ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    writeln!(out, "Type `help` for commands.")?;
    run_with(reader, &mut out, ui_rx, cmd_tx).await
}

/// Console loop over any line source and output sink.
///
/// Updates already queued from the app are printed before the next line is
/// read.
pub async fn run_with<R, W>(
    reader: R,
    out: &mut W,
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();

    loop {
        tokio::select! {
            biased;

            update = ui_rx.recv() => {
                match update {
                    Some(update) => print_update(out, update)?,
                    None => {
                        debug!("App loop closed the update channel");
                        break;
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    // EOF behaves like `quit`.
                    let _ = cmd_tx.send(UserCommand::Quit).await;
                    break;
                };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(UserCommand::Help)) => writeln!(out, "{}", view::HELP)?,
                    Ok(Some(UserCommand::Quit)) => {
                        let _ = cmd_tx.send(UserCommand::Quit).await;
                        break;
                    }
                    Ok(Some(cmd)) => {
                        if cmd_tx.send(cmd).await.is_err() {
                            warn!("App loop is gone, leaving the console");
                            break;
                        }
                    }
                    Err(e) => writeln!(out, "! {e}")?,
                }
            }
        }
        out.flush()?;
    }

    Ok(())
}

fn print_update<W: Write>(out: &mut W, update: UiUpdate) -> std::io::Result<()> {
    match update {
        UiUpdate::Event(event) => writeln!(out, "{}", view::render_event(&event)),
        UiUpdate::Tick { remaining } => match view::countdown_line(remaining) {
            Some(line) => writeln!(out, "{line}"),
            None => Ok(()),
        },
        UiUpdate::Snapshot(snapshot) => writeln!(out, "{}", view::status_line(&snapshot)),
        UiUpdate::Show { view, snapshot } => {
            writeln!(out, "{}", view::render_view(view, &snapshot))
        }
        UiUpdate::Rejected(reason) => writeln!(out, "! {reason}"),
    }
}

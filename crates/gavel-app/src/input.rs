// Operator command parsing.
//
// Translates a console line into a UserCommand for the app loop. Parsing is
// purely syntactic; whether the command is allowed right now is decided by
// the app and the auction engine.

use thiserror::Error;

use crate::protocol::{CaptainPick, PlayerRef, TeamRef, UserCommand, View};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("`{command}` does not take `{extra}`")]
    UnexpectedArgument { command: &'static str, extra: String },

    #[error("`{0}` is not a valid number")]
    InvalidNumber(String),

    #[error("numbering starts at 1")]
    ZeroIndex,
}

/// Parse one console line.
///
/// Returns `Ok(None)` for a blank line. Command words are case-insensitive.
pub fn parse_command(line: &str) -> Result<Option<UserCommand>, InputError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let cmd = match head.to_ascii_lowercase().as_str() {
        "setup" => parse_setup(&args)?,
        "timer" => UserCommand::Timer(single_number("timer", "a number of seconds", &args)?),
        "start" | "next" => bare("start", &args, UserCommand::Start)?,
        "bid" => parse_bid(&args)?,
        "sold" => bare("sold", &args, UserCommand::Sold)?,
        "pass" => bare("pass", &args, UserCommand::Pass)?,
        "pick" => UserCommand::Pick(single_arg("pick", "a position", &args)?.to_string()),
        "subsidy" => UserCommand::Subsidy(single_number("subsidy", "an amount", &args)?),
        "pause" => bare("pause", &args, UserCommand::Pause)?,
        "resume" => bare("resume", &args, UserCommand::Resume)?,
        "status" => bare("status", &args, UserCommand::Show(View::Status))?,
        "list" => bare("list", &args, UserCommand::Show(View::WaitingList))?,
        "teams" => bare("teams", &args, UserCommand::Show(View::Teams))?,
        "pool" => bare("pool", &args, UserCommand::Show(View::Pool))?,
        "history" => bare("history", &args, UserCommand::Show(View::History))?,
        "json" => bare("json", &args, UserCommand::Show(View::Json))?,
        "help" | "?" => UserCommand::Help,
        "quit" | "exit" => UserCommand::Quit,
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}

// ---------------------------------------------------------------------------
// Command-specific parsers
// ---------------------------------------------------------------------------

/// `setup <player>[:POS] ...`
fn parse_setup(args: &[&str]) -> Result<UserCommand, InputError> {
    if args.is_empty() {
        return Err(InputError::MissingArgument {
            command: "setup",
            what: "captains (pool numbers or player ids)",
        });
    }

    let captains = args
        .iter()
        .map(|arg| -> Result<CaptainPick, InputError> {
            let (player, position) = match arg.split_once(':') {
                Some((player, pos)) => (player, Some(pos.trim().to_uppercase())),
                None => (*arg, None),
            };
            Ok(CaptainPick {
                player: parse_player_ref(player)?,
                position: position.filter(|p| !p.is_empty()),
            })
        })
        .collect::<Result<Vec<_>, InputError>>()?;

    Ok(UserCommand::Setup { captains })
}

/// `bid <team> [step]`
fn parse_bid(args: &[&str]) -> Result<UserCommand, InputError> {
    let (team, step) = match args {
        [] => {
            return Err(InputError::MissingArgument {
                command: "bid",
                what: "a team",
            })
        }
        [team] => (team, None),
        [team, step] => (team, Some(parse_number(step)?)),
        [_, _, extra, ..] => {
            return Err(InputError::UnexpectedArgument {
                command: "bid",
                extra: extra.to_string(),
            })
        }
    };
    Ok(UserCommand::Bid {
        team: parse_team_ref(team)?,
        step,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bare(
    command: &'static str,
    args: &[&str],
    cmd: UserCommand,
) -> Result<UserCommand, InputError> {
    match args.first() {
        None => Ok(cmd),
        Some(extra) => Err(InputError::UnexpectedArgument {
            command,
            extra: extra.to_string(),
        }),
    }
}

fn single_arg<'a>(
    command: &'static str,
    what: &'static str,
    args: &[&'a str],
) -> Result<&'a str, InputError> {
    match args {
        [] => Err(InputError::MissingArgument { command, what }),
        [arg] => Ok(*arg),
        [_, extra, ..] => Err(InputError::UnexpectedArgument {
            command,
            extra: extra.to_string(),
        }),
    }
}

fn single_number(
    command: &'static str,
    what: &'static str,
    args: &[&str],
) -> Result<u32, InputError> {
    parse_number(single_arg(command, what, args)?)
}

fn parse_number(s: &str) -> Result<u32, InputError> {
    s.parse()
        .map_err(|_| InputError::InvalidNumber(s.to_string()))
}

/// A 1-based number, or else an id.
fn parse_index(s: &str) -> Result<Option<usize>, InputError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    match s.parse::<usize>() {
        Ok(0) => Err(InputError::ZeroIndex),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(InputError::InvalidNumber(s.to_string())),
    }
}

fn parse_player_ref(s: &str) -> Result<PlayerRef, InputError> {
    if s.is_empty() {
        return Err(InputError::MissingArgument {
            command: "setup",
            what: "a player before `:`",
        });
    }
    Ok(match parse_index(s)? {
        Some(n) => PlayerRef::Number(n),
        None => PlayerRef::Id(s.to_string()),
    })
}

fn parse_team_ref(s: &str) -> Result<TeamRef, InputError> {
    Ok(match parse_index(s)? {
        Some(n) => TeamRef::Number(n),
        None => TeamRef::Id(s.to_string()),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

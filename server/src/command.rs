//! Command grammar and response rendering.
//!
//! A command is whitespace-separated tokens; the first one selects the
//! operation and the second, where needed, is its argument. Extra tokens
//! are ignored.

use std::fmt;
use std::str::FromStr;

use market::{Lookup, Ticker};

/// Success.
pub const OK: &str = "0";
/// Argument missing or frame unreadable.
pub const MALFORMED: &str = "1";
/// Well-formed but refused: invalid or duplicate add, unknown delete.
pub const REJECTED: &str = "2";
pub const NO_DATA: &str = "Server has no data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Price(Lookup),
    Signal(Lookup),
    DelTicker(String),
    AddTicker(String),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    MissingArgument(&'static str),
    /// Carries the raw input for echoing back.
    Unrecognized(String),
}

impl CommandError {
    pub fn response(&self) -> String {
        match self {
            Self::MissingArgument(_) => MALFORMED.to_string(),
            Self::Unrecognized(raw) => format!("Command not recognized: \"{raw}\""),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument(cmd) => write!(f, "{cmd} needs an argument"),
            Self::Unrecognized(raw) => write!(f, "unrecognized command {raw:?}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut tokens = raw.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(CommandError::Unrecognized(raw.to_string()));
        };
        let mut arg = |name: &'static str| tokens.next().ok_or(CommandError::MissingArgument(name));

        match head {
            "--price" => Ok(Self::Price(Lookup::parse(arg("--price")?))),
            "--signal" => Ok(Self::Signal(Lookup::parse(arg("--signal")?))),
            "--del_ticker" => Ok(Self::DelTicker(arg("--del_ticker")?.to_string())),
            "--add_ticker" => Ok(Self::AddTicker(arg("--add_ticker")?.to_string())),
            "--reset" => Ok(Self::Reset),
            _ => Err(CommandError::Unrecognized(raw.to_string())),
        }
    }
}

/// One `TICKER value` line per entry, `TICKER No Data` where the value is
/// missing, or [`NO_DATA`] if nothing matched at all.
pub fn render_report<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a Ticker, Option<String>)>,
{
    let entries: Vec<_> = entries.into_iter().collect();
    if entries.iter().all(|(_, value)| value.is_none()) {
        return NO_DATA.to_string();
    }

    entries
        .into_iter()
        .map(|(ticker, value)| match value {
            Some(value) => format!("{ticker} {value}"),
            None => format!("{ticker} No Data"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn status(accepted: bool) -> String {
    (if accepted { OK } else { REJECTED }).to_string()
}

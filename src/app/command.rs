//! User commands.
//!
//! Every keypress handler and the `:` command line end up producing a [Command], which is
//! the only input the [crate::app::Session] understands.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 1-based index into the current window.
    Select(usize),
    Next,
    Prev,
    /// `None` clears the filter.
    Filter(Option<String>),
    Reset,
    /// An empty query is a no-op.
    Search(String),
    Back,
    Open,
    Copy,
    Download,
    Hash,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("select a single index only")]
    MultiSelect,

    #[error("'{0}' is not a valid index")]
    BadIndex(String),

    #[error("unknown command '{0}'")]
    Unknown(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }

        if line.starts_with(|c: char| c.is_ascii_digit()) {
            return parse_index(line).map(Command::Select);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((w, r)) => (w, r.trim()),
            None => (line, ""),
        };
        let arg = || Some(rest.to_string()).filter(|s| !s.is_empty());

        let cmd = match word.to_ascii_lowercase().as_str() {
            "n" | "next" => Command::Next,
            "p" | "prev" | "previous" => Command::Prev,
            "f" | "filter" => Command::Filter(arg()),
            "r" | "reset" => Command::Reset,
            "s" | "search" => Command::Search(rest.to_string()),
            "b" | "back" => Command::Back,
            "o" | "open" => Command::Open,
            "c" | "copy" => Command::Copy,
            "d" | "download" => Command::Download,
            "h" | "hash" => Command::Hash,
            "q" | "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(line.to_string())),
        };
        Ok(cmd)
    }
}

/// Parses a selection. Lists and ranges are rejected, one file or item at a time.
pub fn parse_index(raw: &str) -> Result<usize, CommandError> {
    let raw = raw.trim();
    if raw.contains([',', '-', ' ']) {
        return Err(CommandError::MultiSelect);
    }
    match raw.parse::<usize>() {
        Ok(0) | Err(_) => Err(CommandError::BadIndex(raw.to_string())),
        Ok(n) => Ok(n),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Select(k) => write!(f, "select {}", k),
            Command::Next => f.write_str("next"),
            Command::Prev => f.write_str("prev"),
            Command::Filter(Some(term)) => write!(f, "filter {}", term),
            Command::Filter(None) => f.write_str("filter"),
            Command::Reset => f.write_str("reset"),
            Command::Search(q) => write!(f, "search {}", q),
            Command::Back => f.write_str("back"),
            Command::Open => f.write_str("open"),
            Command::Copy => f.write_str("copy"),
            Command::Download => f.write_str("download"),
            Command::Hash => f.write_str("hash"),
            Command::Quit => f.write_str("quit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_words_and_aliases() {
        assert_eq!("n".parse::<Command>(), Ok(Command::Next));
        assert_eq!("previous".parse::<Command>(), Ok(Command::Prev));
        assert_eq!("  Q ".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("d".parse::<Command>(), Ok(Command::Download));
    }

    #[test]
    fn filter_and_search_take_the_rest_of_the_line() {
        assert_eq!(
            "f  disc one ".parse::<Command>(),
            Ok(Command::Filter(Some("disc one".into())))
        );
        assert_eq!("filter".parse::<Command>(), Ok(Command::Filter(None)));
        assert_eq!(
            "s ubuntu 22.04".parse::<Command>(),
            Ok(Command::Search("ubuntu 22.04".into()))
        );
        assert_eq!("search".parse::<Command>(), Ok(Command::Search(String::new())));
    }

    #[test]
    fn selection_is_single_and_one_based() {
        assert_eq!("3".parse::<Command>(), Ok(Command::Select(3)));
        assert_eq!("1,2".parse::<Command>(), Err(CommandError::MultiSelect));
        assert_eq!("1-4".parse::<Command>(), Err(CommandError::MultiSelect));
        assert!(matches!(
            "0".parse::<Command>(),
            Err(CommandError::BadIndex(_))
        ));
        assert!(matches!(
            "3x".parse::<Command>(),
            Err(CommandError::BadIndex(_))
        ));
    }

    #[test]
    fn unknown_and_empty_are_errors() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert!(matches!(
            "frobnicate".parse::<Command>(),
            Err(CommandError::Unknown(_))
        ));
    }
}

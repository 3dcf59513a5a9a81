use std::str::FromStr;

use thiserror::Error;

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `source [key]`; no key clears the route parameter
    Source(Option<String>),
    /// `sort <field> [1|-1]`
    Sort { field: String, direction: i64 },
    /// `filter [pattern...]`; the rest of the line, may be empty
    Filter(String),
    Sources,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub const HELP: &str = "\
commands:
  source [key]          switch source (no key: default source)
  sort <Time|Votes> [1|-1]
                        sort newest/most voted first (1) or reverse (-1)
  filter [pattern]      case-insensitive title regex (empty: show all)
  sources               list available sources
  show                  print the current list
  help                  this text
  quit";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "source" => Ok(Command::Source(
                (!rest.is_empty()).then(|| rest.to_string()),
            )),
            "sort" => {
                let mut args = rest.split_whitespace();
                let field = args
                    .next()
                    .ok_or(CommandError::Usage("sort <Time|Votes> [1|-1]"))?
                    .to_string();
                let direction = match args.next() {
                    Some(d) => d
                        .parse()
                        .map_err(|_| CommandError::Usage("sort <Time|Votes> [1|-1]"))?,
                    None => 1,
                };
                Ok(Command::Sort { field, direction })
            }
            "filter" => Ok(Command::Filter(rest.to_string())),
            "sources" => Ok(Command::Sources),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

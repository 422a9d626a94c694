//! Console move source.
//!
//! Lines typed at the terminal become [`ConsoleCommand`]s; the driver
//! turns those into coordinator calls.

use std::io::BufRead;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

/// A command typed by the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ConsoleCommand {
    /// `move <row> <col>` or just `<row> <col>`.
    #[display("move {row} {col}")]
    Move {
        /// Row, 0 at the top.
        row: usize,
        /// Column, 0 at the left.
        col: usize,
    },
    /// `restart`
    #[display("restart")]
    Restart,
    /// `board`
    #[display("board")]
    Board,
    /// `leave` or `quit`
    #[display("leave")]
    Leave,
}

/// Why a line could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CommandError {
    /// Nothing but whitespace.
    #[display("Empty command")]
    Empty,
    /// Not a known command word.
    #[display("Unknown command '{_0}'")]
    Unknown(#[error(not(source))] String),
    /// Move without two numeric coordinates.
    #[display("Expected two numbers, as in `move 1 2`")]
    BadCoordinates,
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => Err(CommandError::Empty),
            ["restart"] => Ok(ConsoleCommand::Restart),
            ["board"] => Ok(ConsoleCommand::Board),
            ["leave"] | ["quit"] => Ok(ConsoleCommand::Leave),
            ["move", row, col] | [row, col] => parse_move(row, col),
            ["move", ..] => Err(CommandError::BadCoordinates),
            [word, ..] => Err(CommandError::Unknown(word.to_string())),
        }
    }
}

fn parse_move(row: &str, col: &str) -> Result<ConsoleCommand, CommandError> {
    let row = row.parse().map_err(|_| CommandError::BadCoordinates)?;
    let col = col.parse().map_err(|_| CommandError::BadCoordinates)?;
    Ok(ConsoleCommand::Move { row, col })
}

/// Reads `input` line by line, forwarding parsed commands.
///
/// Blocking. Unparseable lines are reported and skipped. Returns when the
/// input ends or the receiver is dropped.
#[instrument(skip_all)]
pub fn read_commands(input: impl BufRead, commands: mpsc::UnboundedSender<ConsoleCommand>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read input");
                return;
            }
        };

        match line.parse::<ConsoleCommand>() {
            Ok(command) => {
                if commands.send(command).is_err() {
                    return;
                }
            }
            Err(CommandError::Empty) => {}
            Err(e) => println!("{e}"),
        }
    }
    debug!("Input closed");
}

/// Reads stdin on a dedicated thread and returns the command stream.
pub fn spawn_stdin() -> mpsc::UnboundedReceiver<ConsoleCommand> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_commands(std::io::stdin().lock(), tx));
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_moves() {
        assert_eq!(
            "move 1 2".parse::<ConsoleCommand>(),
            Ok(ConsoleCommand::Move { row: 1, col: 2 })
        );
        assert_eq!("  0 0 ".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Move { row: 0, col: 0 }));
    }

    #[test]
    fn test_parse_words() {
        assert_eq!("restart".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Restart));
        assert_eq!("board".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Board));
        assert_eq!("quit".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Leave));
        assert_eq!("leave".parse::<ConsoleCommand>(), Ok(ConsoleCommand::Leave));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<ConsoleCommand>(), Err(CommandError::Empty));
        assert_eq!(
            "move a 1".parse::<ConsoleCommand>(),
            Err(CommandError::BadCoordinates)
        );
        assert_eq!("move 1".parse::<ConsoleCommand>(), Err(CommandError::BadCoordinates));
        assert_eq!(
            "dance".parse::<ConsoleCommand>(),
            Err(CommandError::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn test_move_display() {
        assert_eq!(ConsoleCommand::Move { row: 2, col: 1 }.to_string(), "move 2 1");
    }

    #[test]
    fn test_read_commands_skips_bad_lines() {
        let input = std::io::Cursor::new("1 1\n\nnonsense\nrestart\nquit\n");
        let (tx, mut rx) = mpsc::unbounded_channel();
        read_commands(input, tx);

        assert_eq!(rx.try_recv(), Ok(ConsoleCommand::Move { row: 1, col: 1 }));
        assert_eq!(rx.try_recv(), Ok(ConsoleCommand::Restart));
        assert_eq!(rx.try_recv(), Ok(ConsoleCommand::Leave));
        assert!(rx.try_recv().is_err());
    }
}

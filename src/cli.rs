/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use anyhow::{anyhow, Error};
use clap::Parser;
use uci_parser::{UciCommand, UciParseError};

use crate::Square;

/// Command-line arguments given to the engine on startup.
#[derive(Debug, Clone, Default, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Commands to execute before reading from `stdin`, exactly as they would be typed.
    ///
    /// Separate multiple commands with `;`, such as `newt "position kiwipete; perft 4"`.
    /// If any are given, the engine exits once they have all run.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub commands: Vec<String>,
}

impl Cli {
    /// Splits the arguments into individual command lines.
    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .join(" ")
            .split(';')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }
}

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND> | <UCI COMMAND>")
)]
pub enum EngineCommand {
    /// Run a fixed-depth search on a set of positions, printing the total nodes searched.
    Bench {
        /// If set, the benchmarking results will be printed in a well-formatted table.
        #[arg(short, long, default_value = "false")]
        pretty: bool,

        /// Override the default benchmark depth.
        #[arg(short, long, required = false)]
        depth: Option<usize>,
    },

    /// Print the FEN, Zobrist key, and side to move of the current position.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position, from White's perspective.
    Eval {
        /// If set, a breakdown of the evaluation will be printed as well.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Quit the engine.
    Exit {
        /// If set, the engine will await the completion of any search threads before exiting.
        #[arg(short, long, default_value = "false")]
        cleanup: bool,
    },

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Display information about the transposition table.
    #[command(aliases = ["tt", "ttable"])]
    HashInfo,

    /// Shows all legal moves in the current position, or only those of the piece on `square`.
    Moves {
        square: Option<Square>,

        /// If set, moves will be sorted in alphabetical order.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Display the current value of the specified option.
    Option {
        name: Vec<String>, // Multi-word options are allowed by UCI
    },

    /// Performs a perft on the current position at the supplied depth, printing total node count.
    Perft { depth: usize },

    /// Performs a split perft on the current position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Wrapper over UCI commands sent to the engine.
    #[command(skip)]
    Uci { cmd: UciCommand },
}

impl FromStr for EngineCommand {
    type Err = Error;

    /// Attempt to parse an [`EngineCommand`] from a line of input.
    ///
    /// UCI commands are tried first, since they are the primary use case of the engine.
    /// If the input is not a UCI command at all, it is parsed as one of the engine's own commands.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match UciCommand::new(s) {
            Ok(cmd) => Ok(Self::Uci { cmd }),

            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
                Self::try_parse_from(s.split_ascii_whitespace()).map_err(|e| anyhow!("{e}"))
            }

            // It was a UCI command, but a malformed one
            Err(uci_err) => Err(anyhow!("{uci_err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uci_commands() {
        let cmd: EngineCommand = "position startpos moves e2e4".parse().unwrap();
        assert!(matches!(cmd, EngineCommand::Uci { .. }), "{cmd:?}");

        let cmd: EngineCommand = "go depth 3".parse().unwrap();
        assert!(matches!(cmd, EngineCommand::Uci { .. }), "{cmd:?}");
    }

    #[test]
    fn test_parse_engine_commands() {
        let cmd: EngineCommand = "perft 3".parse().unwrap();
        assert!(matches!(cmd, EngineCommand::Perft { depth: 3 }), "{cmd:?}");

        let cmd: EngineCommand = "d".parse().unwrap();
        assert!(matches!(cmd, EngineCommand::Display), "{cmd:?}");

        let cmd: EngineCommand = "moves e2".parse().unwrap();
        assert!(
            matches!(cmd, EngineCommand::Moves { square: Some(Square::E2), sort: false }),
            "{cmd:?}"
        );

        let cmd: EngineCommand = "bench -d 2".parse().unwrap();
        assert!(
            matches!(cmd, EngineCommand::Bench { depth: Some(2), pretty: false }),
            "{cmd:?}"
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!("flarp".parse::<EngineCommand>().is_err());
        assert!("perft deep".parse::<EngineCommand>().is_err());
        assert!("moves z9".parse::<EngineCommand>().is_err());
    }

    #[test]
    fn test_cli_splits_commands() {
        let cli = Cli::try_parse_from(["newt", "position", "kiwipete;", "perft", "2"]).unwrap();
        assert_eq!(cli.command_lines(), ["position kiwipete", "perft 2"]);

        let cli = Cli::try_parse_from(["newt"]).unwrap();
        assert!(cli.command_lines().is_empty());
    }
}

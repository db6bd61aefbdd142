// This file is part of swiss-pairing.
//
// swiss-pairing is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// swiss-pairing is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::{io::Write as _, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use swiss_pairing::{
    COPYRIGHT, DraftId, LONG_VERSION, MatchId, PlayerId, RoundId, TournamentId, UserId,
};

/// Swiss Pairing
///
/// Pairs the rounds of tournament drafts and ranks their players.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Swiss Pairing")]
pub(crate) struct Args {
    /// The RON file holding drafts, players, rounds and matches
    ///
    /// [default: the data directory's swiss-pairing/store.ron]
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// A RON file with pairing settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create a draft with its players and empty rounds
    Draft {
        #[arg(long)]
        id: DraftId,

        #[arg(long)]
        tournament: TournamentId,

        /// How many players enroll
        #[arg(long)]
        players: u64,

        /// How many rounds to create
        #[arg(default_value_t = 3, long)]
        rounds: u32,

        #[arg(default_value_t = 1, long)]
        first_table: u32,

        #[arg(long)]
        last_table: Option<u32>,
    },

    /// Seat the players of a draft in a random order
    Seat {
        #[arg(long)]
        draft: DraftId,
    },

    /// Pair the next round of a draft
    Pair {
        #[arg(long)]
        draft: DraftId,
    },

    /// Report the game wins of a match
    Report {
        #[arg(long)]
        r#match: MatchId,

        #[arg(long)]
        user: UserId,

        /// Report as an administrator
        #[arg(long)]
        admin: bool,

        /// Game wins of player 1
        wins1: u8,

        /// Game wins of player 2
        wins2: u8,

        /// Fail if the match changed since this version
        #[arg(long)]
        version: Option<u64>,
    },

    /// Confirm a reported result
    Confirm {
        #[arg(long)]
        r#match: MatchId,

        #[arg(long)]
        user: UserId,

        #[arg(long)]
        admin: bool,

        #[arg(long)]
        version: Option<u64>,
    },

    /// Finish a round whose matches are all confirmed
    Finish {
        #[arg(long)]
        round: RoundId,
    },

    /// Drop a player from the rest of their draft
    Drop {
        #[arg(long)]
        player: PlayerId,
    },

    /// Show the matches being played in a draft
    Ongoing {
        #[arg(long)]
        draft: DraftId,

        /// Only show this player's match
        #[arg(long)]
        player: Option<PlayerId>,
    },

    /// Show the standings of a tournament
    Standings {
        #[arg(long)]
        tournament: TournamentId,
    },
}

impl Args {
    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command().name("swiss-pairing").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-19");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("swiss-pairing.1", buffer)?;
        Ok(())
    }
}

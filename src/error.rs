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

use thiserror::Error;

use crate::{DraftId, MatchId, PlayerId, RoundId, TournamentId, UserId};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("pair: there are no players to pair")]
    NoPlayersToPair,
    #[error("pair: there is no table number after {0}")]
    OutOfTables(u32),
    #[error("pair: found no round to pair")]
    NoEligibleRound,
    #[error("report: user {0} is not authorized to update this match")]
    UnauthorizedReport(UserId),
    #[error("report: the result of this match is already confirmed")]
    AlreadyConfirmed,
    #[error("report: the match was updated by someone else, reload it")]
    StaleMatch,
    #[error("report: a match can't have more than {max} game wins, got {got}")]
    InvalidScore { got: u8, max: u8 },
    #[error("confirm: the match has no reported result")]
    NotReported,
    #[error("round: the round has already been started")]
    RoundAlreadyStarted,
    #[error("round: the round hasn't been started")]
    RoundNotStarted,
    #[error("round: {0} matches still need a confirmed result")]
    UnconfirmedMatches(usize),
    #[error("seat: there are no players to seat")]
    NoPlayersToSeat,
    #[error("store: unknown draft {0}")]
    UnknownDraft(DraftId),
    #[error("store: unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("store: unknown match {0}")]
    UnknownMatch(MatchId),
    #[error("store: unknown round {0}")]
    UnknownRound(RoundId),
    #[error("store: unknown tournament {0}")]
    UnknownTournament(TournamentId),
}

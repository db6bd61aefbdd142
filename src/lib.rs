//! Swiss round pairing and tie-break standings for multiplayer tournament drafts.
//!
//! The crate takes players and their match history as plain data and produces:
//!
//! * standings: points, match and game win rates, and opponent win rate
//!   tie-breakers for every player ([`scorecard`]),
//! * the next round's pairings: players are grouped into point brackets
//!   ([`bracket`]), each bracket is paired with a minimum-cost assignment that
//!   excludes repeat pairings ([`matcher`]), and the round is assembled with
//!   sequential tables and byes ([`pairing`]).
//!
//! Storage is reached only through the repository traits in [`store`].
//! [`service`] wires the pieces together into the operations a tournament
//! service calls.
//!
//! ## Feature Flags
//!
//! * bench - enable the criterion benchmarks

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

#![deny(clippy::panic)]

pub mod blossom;
pub mod bracket;
pub mod config;
pub mod draft;
pub mod error;
pub mod matcher;
pub mod matches;
pub mod pairing;
pub mod player;
pub mod round;
pub mod scorecard;
pub mod service;
pub mod store;
pub mod utils;

pub use error::Error;

pub type DraftId = u64;
pub type EnrollmentId = u64;
pub type MatchId = u64;
pub type PlayerId = u64;
pub type RoundId = u64;
pub type TournamentId = u64;
pub type UserId = u64;

pub const HOME: &str = "swiss-pairing";

/// The largest number of players put into one point bracket.
pub const MAX_BRACKET_SIZE: usize = 25;

/// The lowest match or game win rate a player is credited with.
pub const RATE_FLOOR: f64 = 0.33;

/// Game wins that decide a best of three match.
pub const GAMES_TO_WIN: u8 = 2;

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2025-2026 Developers of the swiss-pairing project

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2025 Developers of the swiss-pairing project
Licensed under the AGPLv3"
);

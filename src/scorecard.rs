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

//! Points and tie-breakers computed from a match history.
//!
//! A match win is worth 3 points, a draw 1 and a loss 0. Ties on points are
//! broken by, in order:
//!
//! * `omw`: the mean match win rate of the distinct opponents faced,
//! * `pgw`: the player's own game win rate,
//! * `ogw`: the mean game win rate of the distinct opponents faced.
//!
//! Win rates are floored, so one early loss doesn't sink the tie-breakers of
//! everyone who later plays that player.

use std::{fmt, hash::Hash};

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

pub const POINTS_WIN: u32 = 3;
pub const POINTS_DRAW: u32 = 1;

/// The game wins of one finished match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchResult<K> {
    pub player1: K,
    pub player2: K,
    pub player1_wins: u8,
    pub player2_wins: u8,
}

impl<K> MatchResult<K> {
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.player1_wins == self.player2_wins
    }

    /// Maps the player keys, for example from draft players to enrollments.
    pub fn map<L, F: FnMut(K) -> L>(self, mut f: F) -> MatchResult<L> {
        MatchResult {
            player1: f(self.player1),
            player2: f(self.player2),
            player1_wins: self.player1_wins,
            player2_wins: self.player2_wins,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scorecard<K> {
    pub player: K,
    pub points: u32,
    pub matches_played: u32,
    pub matches_won: u32,
    pub matches_drawn: u32,
    pub games_played: u32,
    pub games_won: u32,
    /// Every opponent faced, most recent first when the history is ordered
    /// that way. Repeat pairings show up more than once.
    pub opponents: Vec<K>,
    pub pmw: f64,
    pub pgw: f64,
    pub omw: f64,
    pub ogw: f64,
}

impl<K: Copy + Eq> Scorecard<K> {
    #[must_use]
    pub fn new(player: K) -> Self {
        Self {
            player,
            points: 0,
            matches_played: 0,
            matches_won: 0,
            matches_drawn: 0,
            games_played: 0,
            games_won: 0,
            opponents: Vec::new(),
            pmw: 0.0,
            pgw: 0.0,
            omw: 0.0,
            ogw: 0.0,
        }
    }

    #[must_use]
    pub fn has_played(&self, opponent: K) -> bool {
        self.opponents.contains(&opponent)
    }

    fn record(&mut self, opponent: K, wins: u8, losses: u8) {
        self.opponents.push(opponent);
        self.matches_played += 1;
        self.games_played += u32::from(wins) + u32::from(losses);
        self.games_won += u32::from(wins);

        match wins.cmp(&losses) {
            std::cmp::Ordering::Greater => {
                self.matches_won += 1;
                self.points += POINTS_WIN;
            }
            std::cmp::Ordering::Equal => {
                self.matches_drawn += 1;
                self.points += POINTS_DRAW;
            }
            std::cmp::Ordering::Less => {}
        }
    }
}

impl<K: fmt::Display> fmt::Display for Scorecard<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-{}-{} omw={:.2} pgw={:.2} ogw={:.2}",
            self.player,
            self.points,
            self.matches_won,
            self.matches_played - self.matches_won - self.matches_drawn,
            self.matches_drawn,
            self.omw,
            self.pgw,
            self.ogw,
        )
    }
}

/// Builds one scorecard per player of the roster, in roster order.
///
/// Results involving a player outside the roster still count for the player
/// inside it, but the outsider is left out of the opponent tie-breakers.
#[must_use]
pub fn compute_scorecards<K>(
    roster: &[K],
    results: &[MatchResult<K>],
    rate_floor: f64,
) -> Vec<Scorecard<K>>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    let mut index = FxHashMap::default();
    let mut cards = Vec::with_capacity(roster.len());

    for player in roster {
        if !index.contains_key(player) {
            index.insert(*player, cards.len());
            cards.push(Scorecard::new(*player));
        }
    }

    for result in results {
        if result.player1 == result.player2 {
            continue;
        }

        if let Some(&i) = index.get(&result.player1)
            && let Some(card) = cards.get_mut(i)
        {
            card.record(result.player2, result.player1_wins, result.player2_wins);
        }
        if let Some(&i) = index.get(&result.player2)
            && let Some(card) = cards.get_mut(i)
        {
            card.record(result.player1, result.player2_wins, result.player1_wins);
        }
    }

    for card in &mut cards {
        if card.matches_played == 0 {
            debug!("{:?} has no match history, using the baseline rates", card.player);
        }

        card.pmw = rate(card.matches_won, card.matches_played, rate_floor);
        card.pgw = rate(card.games_won, card.games_played, rate_floor);
    }

    let rates: Vec<(f64, f64)> = cards.iter().map(|card| (card.pmw, card.pgw)).collect();

    for card in &mut cards {
        let mut seen = FxHashSet::default();
        let mut count = 0u32;
        let mut omw_total = 0.0;
        let mut ogw_total = 0.0;

        for opponent in &card.opponents {
            if !seen.insert(*opponent) {
                continue;
            }

            if let Some((pmw, pgw)) = index.get(opponent).and_then(|&i| rates.get(i)) {
                count += 1;
                omw_total += pmw;
                ogw_total += pgw;
            }
        }

        if count > 0 {
            let count = f64::from(count);
            card.omw = round_hundredths((omw_total / count).max(rate_floor));
            card.ogw = round_hundredths((ogw_total / count).max(rate_floor));
        }
    }

    cards
}

/// Sorts scorecards by points, then `omw`, `pgw` and `ogw`, all descending.
///
/// The sort is stable: players that tie on everything keep their order.
pub fn sort_standings<K>(cards: &mut [Scorecard<K>]) {
    cards.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.omw.total_cmp(&a.omw))
            .then_with(|| b.pgw.total_cmp(&a.pgw))
            .then_with(|| b.ogw.total_cmp(&a.ogw))
    });
}

#[must_use]
pub fn standings<K>(roster: &[K], results: &[MatchResult<K>], rate_floor: f64) -> Vec<Scorecard<K>>
where
    K: Copy + Eq + Hash + fmt::Debug,
{
    let mut cards = compute_scorecards(roster, results, rate_floor);
    sort_standings(&mut cards);
    cards
}

fn rate(won: u32, played: u32, floor: f64) -> f64 {
    if played == 0 {
        floor
    } else {
        (f64::from(won) / f64::from(played)).max(floor)
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

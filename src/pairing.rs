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

use std::fmt;

use log::{debug, info, warn};
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    Error, PlayerId, RoundId,
    bracket::Brackets,
    config::PairingConfig,
    draft::Draft,
    matcher::{AssignmentSolver, BracketPairing, ByeSlot, Entrant, Hungarian, Matcher, Policy, Repeats},
    player::Player,
    round::Round,
    scorecard::Scorecard,
};

/// Hands out consecutive table numbers for one round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableCounter {
    /// `None` once `u32::MAX` was handed out.
    next: Option<u32>,
}

impl TableCounter {
    #[must_use]
    pub fn new(first: u32) -> Self {
        Self { next: Some(first) }
    }

    /// # Errors
    ///
    /// If the last table handed out was `u32::MAX`.
    pub fn next_table(&mut self) -> Result<u32, Error> {
        let table = self.next.ok_or(Error::OutOfTables(u32::MAX))?;
        self.next = table.checked_add(1);

        Ok(table)
    }
}

/// A match the round assembler wants created.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewMatch {
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub table: u32,
}

/// Everything pairing a round changes, computed before anything is written.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundPlan {
    pub round_id: RoundId,
    pub round_index: u32,
    pub matches: Vec<NewMatch>,
    pub byes: Vec<PlayerId>,
    /// Matches between players who already met, made because nothing else
    /// was possible.
    pub repeats: Vec<(PlayerId, PlayerId)>,
}

impl RoundPlan {
    #[must_use]
    pub fn tables(&self) -> Vec<u32> {
        self.matches.iter().map(|game| game.table).collect()
    }
}

impl fmt::Display for RoundPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for game in &self.matches {
            writeln!(f, "table {}: {} vs {}", game.table, game.player1, game.player2)?;
        }
        for player in &self.byes {
            writeln!(f, "bye: {player}")?;
        }

        Ok(())
    }
}

/// Turns standings into the next round's matches and byes.
pub struct RoundAssembler<'a, S: AssignmentSolver + ?Sized = Hungarian> {
    matcher: Matcher<'a, S>,
    config: &'a PairingConfig,
}

impl<'a, S: AssignmentSolver + ?Sized> RoundAssembler<'a, S> {
    #[must_use]
    pub fn new(solver: &'a S, config: &'a PairingConfig) -> Self {
        Self {
            matcher: Matcher::new(solver, config),
            config,
        }
    }

    /// Pairs every player of `players` who hasn't dropped.
    ///
    /// Brackets are paired from the most points to the least. Players left
    /// over in a bracket join the next one; whoever is left in the last
    /// bracket gets a bye.
    ///
    /// # Errors
    ///
    /// If there is nobody to pair, or the table numbers run out.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        draft: &Draft,
        round: &Round,
        standings: &[Scorecard<PlayerId>],
        players: &[Player],
        rng: &mut R,
    ) -> Result<RoundPlan, Error> {
        let active: FxHashMap<PlayerId, &Player> = players
            .iter()
            .filter(|player| !player.dropped)
            .map(|player| (player.id, player))
            .collect();

        let standings: Vec<Scorecard<PlayerId>> = standings
            .iter()
            .filter(|card| active.contains_key(&card.player))
            .cloned()
            .collect();

        if standings.is_empty() {
            return Err(Error::NoPlayersToPair);
        }

        let mut entrants: FxHashMap<PlayerId, Entrant> = standings
            .iter()
            .map(|card| {
                let entrant = Entrant {
                    player: card.player,
                    points: card.points,
                    opponents: card.opponents.iter().copied().collect(),
                    had_bye: active.get(&card.player).is_some_and(|player| player.had_bye),
                };
                (card.player, entrant)
            })
            .collect();

        let mut brackets = Brackets::build(&standings, self.config.max_bracket_size);
        let keys = brackets.keys();
        let mut tables = TableCounter::new(draft.table_first);
        let mut carried: Vec<PlayerId> = Vec::new();
        let mut plan = RoundPlan {
            round_id: round.id,
            round_index: round.index,
            ..RoundPlan::default()
        };

        for (i, key) in keys.iter().enumerate() {
            let mut worklist = std::mem::take(&mut carried);
            worklist.extend(brackets.remove(key));

            let bracket: Vec<Entrant> = worklist
                .iter()
                .filter_map(|player| entrants.remove(player))
                .collect();

            let lowest = i + 1 == keys.len();
            let pairing = if lowest {
                self.pair_lowest(&bracket, key.points, rng)
            } else {
                self.matcher
                    .pair_bracket(&bracket, key.points, Policy::strict(), rng)
            };

            debug!(
                "bracket {key}: {} players, {} pairs, {} left over",
                bracket.len(),
                pairing.pairs.len(),
                pairing.unpaired.len()
            );

            for (player1, player2) in pairing.pairs {
                let table = tables.next_table()?;
                if !draft.has_table(table) {
                    warn!("draft {}: table {table} is past the last table", draft.id);
                }
                plan.matches.push(NewMatch {
                    player1,
                    player2,
                    table,
                });
            }

            for (player1, player2) in pairing.repeats {
                warn!("round {}: {player1} and {player2} play each other again", round.index);
                plan.repeats.push((player1, player2));
            }

            plan.byes.extend(pairing.bye);

            // Put the left over players back so the next bracket can take them.
            for player in &pairing.unpaired {
                if let Some(entrant) = bracket.iter().find(|entrant| entrant.player == *player) {
                    entrants.insert(*player, entrant.clone());
                }
            }

            if lowest {
                plan.byes.extend(pairing.unpaired);
            } else {
                carried = pairing.unpaired;
            }
        }

        info!(
            "round {}: paired {} matches with {} byes",
            round.index,
            plan.matches.len(),
            plan.byes.len()
        );

        Ok(plan)
    }

    /// The last bracket has nowhere to pass players to, so it relaxes its
    /// rules until everyone is paired or has the bye.
    fn pair_lowest<R: Rng + ?Sized>(
        &self,
        bracket: &[Entrant],
        points: u32,
        rng: &mut R,
    ) -> BracketPairing {
        let odd = bracket.len() % 2 == 1;
        let (first_bye, any_bye) = match (odd, self.config.avoid_repeat_byes) {
            (false, _) => (ByeSlot::None, ByeSlot::None),
            (true, true) => (ByeSlot::FirstByeOnly, ByeSlot::Anyone),
            (true, false) => (ByeSlot::Anyone, ByeSlot::Anyone),
        };

        let tiers = [
            Policy {
                repeats: Repeats::Excluded,
                bye: first_bye,
            },
            Policy {
                repeats: Repeats::Excluded,
                bye: any_bye,
            },
            Policy {
                repeats: Repeats::Penalized,
                bye: any_bye,
            },
        ];

        let mut pairing = BracketPairing::default();
        let mut previous = None;

        for policy in tiers {
            if previous == Some(policy) {
                continue;
            }
            previous = Some(policy);

            pairing = self.matcher.pair_bracket(bracket, points, policy, rng);
            if pairing.unpaired.is_empty() {
                break;
            }

            debug!(
                "bracket {points}: {} players can't be paired with {policy:?}",
                pairing.unpaired.len()
            );
        }

        pairing
    }
}

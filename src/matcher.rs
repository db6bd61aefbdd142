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

//! Pairs the players of one bracket.
//!
//! Every bracket becomes a weighted graph: an edge joins two players who may
//! be paired, and players who already met have no edge unless repeats are
//! explicitly allowed. Weights are random tie-breaks, except edges touching a
//! player from another bracket which get a fixed high weight so that player
//! is paired rather than passed on again.
//!
//! The graph is written as a square [`CostMatrix`] (cost = -weight) and
//! handed to an [`AssignmentSolver`]. A symmetric assignment made only of
//! swaps is already the heaviest pairing. Anything else, an odd cycle or a
//! player assigned to itself, goes to the blossom matcher, which pairs as
//! many players as possible and then maximizes the weight.

use pathfinding::{kuhn_munkres::kuhn_munkres_min, matrix::Matrix};
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::{PlayerId, blossom::max_weight_matching, config::PairingConfig};

/// What the solver pays for a forbidden cell. Large enough that no
/// assignment using one is ever cheaper than one that doesn't.
const FORBIDDEN_COST: i64 = 1 << 40;

/// A player taking part in the pairing of one bracket.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Entrant {
    pub player: PlayerId,
    pub points: u32,
    pub opponents: FxHashSet<PlayerId>,
    pub had_bye: bool,
}

impl Entrant {
    #[must_use]
    pub fn has_played(&self, other: &Entrant) -> bool {
        self.opponents.contains(&other.player) || other.opponents.contains(&self.player)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Repeats {
    /// Players who already met have no edge.
    Excluded,
    /// Players who already met have an edge weighed down so far that a
    /// pairing uses as few of them as it can.
    Penalized,
}

/// Whether the graph gets an extra vertex standing for the bye.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ByeSlot {
    None,
    /// Only players who never had a bye may take it.
    FirstByeOnly,
    /// Anyone may take it, players who had one are discouraged.
    Anyone,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Policy {
    pub repeats: Repeats,
    pub bye: ByeSlot,
}

impl Policy {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            repeats: Repeats::Excluded,
            bye: ByeSlot::None,
        }
    }
}

/// Square matrix of pairing costs, `None` marks a pair that must not play.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CostMatrix {
    size: usize,
    cells: Vec<Option<i64>>,
}

impl CostMatrix {
    /// A matrix where nothing is allowed yet.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Builds the pairing graph of a bracket worth `nominal_points`. With a
    /// bye slot, the last row and column stand for the bye.
    #[must_use]
    pub fn build<R: Rng + ?Sized>(
        entrants: &[Entrant],
        nominal_points: u32,
        policy: Policy,
        config: &PairingConfig,
        rng: &mut R,
    ) -> Self {
        let players = entrants.len();
        let size = if policy.bye == ByeSlot::None {
            players
        } else {
            players + 1
        };
        let mut matrix = Self::new(size);
        let tie_break = config.min_tie_break..=config.max_tie_break.max(config.min_tie_break);

        // A single repeat must weigh more than every other pair together.
        let heaviest = config.promoted_weight.max(config.max_tie_break).max(0);
        let pairs = i64::try_from(size / 2 + 1).unwrap_or(i64::MAX);
        let penalty = config
            .repeat_weight
            .min(heaviest.saturating_mul(pairs).saturating_neg());

        for (i, entrant) in entrants.iter().enumerate() {
            for (j, other) in entrants.iter().enumerate().skip(i + 1) {
                let weight = if entrant.has_played(other) {
                    match policy.repeats {
                        Repeats::Excluded => continue,
                        Repeats::Penalized => penalty,
                    }
                } else if entrant.points != nominal_points || other.points != nominal_points {
                    config.promoted_weight
                } else {
                    rng.random_range(tie_break.clone())
                };

                matrix.set_weight(i, j, weight);
            }
        }

        if policy.bye != ByeSlot::None {
            for (i, entrant) in entrants.iter().enumerate() {
                let weight = if entrant.had_bye {
                    if policy.bye == ByeSlot::FirstByeOnly {
                        continue;
                    }
                    penalty
                } else if entrant.points != nominal_points {
                    0
                } else {
                    rng.random_range(tie_break.clone())
                };

                matrix.set_weight(i, players, weight);
            }
        }

        matrix
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn cost(&self, row: usize, column: usize) -> Option<i64> {
        if row < self.size && column < self.size {
            self.cells[row * self.size + column]
        } else {
            None
        }
    }

    #[must_use]
    pub fn weight(&self, row: usize, column: usize) -> Option<i64> {
        self.cost(row, column).map(|cost| -cost)
    }

    #[must_use]
    pub fn is_allowed(&self, row: usize, column: usize) -> bool {
        self.cost(row, column).is_some()
    }

    /// Sets one cell. Diagonal cells are never allowed.
    pub fn set_cost(&mut self, row: usize, column: usize, cost: i64) {
        if row != column && row < self.size && column < self.size {
            self.cells[row * self.size + column] = Some(cost);
        }
    }

    /// Allows the pair both ways with cost `-weight`.
    pub fn set_weight(&mut self, a: usize, b: usize, weight: i64) {
        self.set_cost(a, b, -weight);
        self.set_cost(b, a, -weight);
    }

    fn solver_cost(&self, row: usize, column: usize) -> i64 {
        self.cost(row, column).unwrap_or(FORBIDDEN_COST)
    }

    /// The pairs allowed both ways, as `(a, b, weight)` with `a < b`.
    fn edges(&self) -> Vec<(usize, usize, i64)> {
        (0..self.size)
            .flat_map(|a| (a + 1..self.size).map(move |b| (a, b)))
            .filter_map(|(a, b)| match (self.weight(a, b), self.weight(b, a)) {
                (Some(weight), Some(_)) => Some((a, b, weight)),
                _ => None,
            })
            .collect()
    }
}

/// Solves the assignment problem: every row gets a distinct column so the sum
/// of the costs is minimal.
pub trait AssignmentSolver {
    /// Returns the column assigned to each row.
    fn solve(&self, matrix: &CostMatrix) -> Vec<usize>;
}

/// The Hungarian method, `O(n³)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hungarian;

impl AssignmentSolver for Hungarian {
    fn solve(&self, matrix: &CostMatrix) -> Vec<usize> {
        let n = matrix.size();
        if n == 0 {
            return Vec::new();
        }

        let costs = Matrix::from_fn(n, n, |(row, column)| matrix.solver_cost(row, column));
        let (_, assignment) = kuhn_munkres_min(&costs);

        assignment
    }
}

/// Pairs vertices of a symmetric matrix using `solver`, returning
/// `(row, column)` pairs with `row < column`.
///
/// The result never contains a forbidden cell, has as many pairs as the
/// allowed cells permit, and of those pairings has the greatest weight.
#[must_use]
pub fn solve_assignment<S: AssignmentSolver + ?Sized>(
    solver: &S,
    matrix: &CostMatrix,
) -> Vec<(usize, usize)> {
    let assignment = solver.solve(matrix);
    if let Some(pairs) = swaps(&assignment, matrix) {
        return pairs;
    }

    max_weight_matching(matrix.size(), &matrix.edges())
        .iter()
        .enumerate()
        .filter_map(|(a, b)| b.filter(|&b| a < b).map(|b| (a, b)))
        .collect()
}

/// The pairs of an assignment where every row and its column swap places.
///
/// Every pairing of all the rows is such an assignment, so a cheapest one
/// made only of allowed swaps is a heaviest pairing.
fn swaps(assignment: &[usize], matrix: &CostMatrix) -> Option<Vec<(usize, usize)>> {
    if assignment.len() != matrix.size() {
        return None;
    }

    let mut pairs = Vec::new();
    for (row, &column) in assignment.iter().enumerate() {
        if assignment.get(column) != Some(&row) || !matrix.is_allowed(row, column) {
            return None;
        }
        if row < column {
            pairs.push((row, column));
        }
    }

    Some(pairs)
}

/// The pairs of one bracket.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BracketPairing {
    pub pairs: Vec<(PlayerId, PlayerId)>,
    /// The player matched with the bye slot, if the graph had one.
    pub bye: Option<PlayerId>,
    /// Players nobody could be paired with, in bracket order.
    pub unpaired: Vec<PlayerId>,
    /// Pairs of players who already met.
    pub repeats: Vec<(PlayerId, PlayerId)>,
}

/// Pairs brackets with a swappable assignment solver.
pub struct Matcher<'a, S: AssignmentSolver + ?Sized = Hungarian> {
    solver: &'a S,
    config: &'a PairingConfig,
}

impl<'a, S: AssignmentSolver + ?Sized> Matcher<'a, S> {
    #[must_use]
    pub fn new(solver: &'a S, config: &'a PairingConfig) -> Self {
        Self { solver, config }
    }

    #[must_use]
    pub fn pair_bracket<R: Rng + ?Sized>(
        &self,
        entrants: &[Entrant],
        nominal_points: u32,
        policy: Policy,
        rng: &mut R,
    ) -> BracketPairing {
        let matrix = CostMatrix::build(entrants, nominal_points, policy, self.config, rng);
        let mut paired = vec![false; entrants.len()];
        let mut pairing = BracketPairing::default();

        for (a, b) in solve_assignment(self.solver, &matrix) {
            match (entrants.get(a), entrants.get(b)) {
                (Some(first), Some(second)) => {
                    if first.has_played(second) {
                        pairing.repeats.push((first.player, second.player));
                    }
                    pairing.pairs.push((first.player, second.player));
                    paired[a] = true;
                    paired[b] = true;
                }
                (Some(entrant), None) | (None, Some(entrant)) => {
                    pairing.bye = Some(entrant.player);
                    paired[a.min(b)] = true;
                }
                (None, None) => {}
            }
        }

        pairing.unpaired = entrants
            .iter()
            .zip(&paired)
            .filter(|(_, paired)| !**paired)
            .map(|(entrant, _)| entrant.player)
            .collect();

        pairing
    }
}

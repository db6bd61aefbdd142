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

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use rustc_hash::FxHashMap;

use crate::scorecard::Scorecard;

/// Identifies a point bracket. Brackets with too many players are split into
/// several brackets with the same points and increasing indexes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BracketKey {
    pub points: u32,
    pub index: u32,
}

impl Ord for BracketKey {
    /// Highest points first, then lowest index first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .points
            .cmp(&self.points)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for BracketKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BracketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} points #{}", self.points, self.index)
    }
}

/// Players grouped by points, iterated from the highest bracket to the lowest.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Brackets<K>(pub BTreeMap<BracketKey, Vec<K>>);

impl<K: Copy> Brackets<K> {
    /// Groups players by points keeping the order of `standings` inside each
    /// bracket. No bracket gets more than `max_size` players.
    #[must_use]
    pub fn build(standings: &[Scorecard<K>], max_size: usize) -> Self {
        let max_size = max_size.max(1);
        let mut brackets: BTreeMap<BracketKey, Vec<K>> = BTreeMap::new();
        let mut open: FxHashMap<u32, u32> = FxHashMap::default();

        for card in standings {
            let index = open.entry(card.points).or_insert(0);
            let mut key = BracketKey {
                points: card.points,
                index: *index,
            };

            if brackets.get(&key).is_some_and(|players| players.len() >= max_size) {
                *index += 1;
                key.index = *index;
            }

            brackets.entry(key).or_default().push(card.player);
        }

        Self(brackets)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<BracketKey> {
        self.0.keys().copied().collect()
    }

    pub fn remove(&mut self, key: &BracketKey) -> Vec<K> {
        self.0.remove(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(points: &[u32]) -> Vec<Scorecard<u64>> {
        points
            .iter()
            .zip(1..)
            .map(|(points, player)| Scorecard {
                points: *points,
                ..Scorecard::new(player)
            })
            .collect()
    }

    #[test]
    fn brackets_go_from_high_to_low() {
        let brackets = Brackets::build(&cards(&[3, 0, 6, 3, 0, 1]), 25);
        let keys: Vec<u32> = brackets.keys().iter().map(|key| key.points).collect();

        assert_eq!(keys, vec![6, 3, 1, 0]);
        assert_eq!(
            brackets.0.get(&BracketKey {
                points: 3,
                index: 0
            }),
            Some(&vec![1, 4])
        );
    }

    #[test]
    fn full_brackets_overflow() {
        let brackets = Brackets::build(&cards(&[0; 60]), 25);
        let sizes: Vec<(BracketKey, usize)> = brackets
            .0
            .iter()
            .map(|(key, players)| (*key, players.len()))
            .collect();

        assert_eq!(
            sizes,
            vec![
                (BracketKey { points: 0, index: 0 }, 25),
                (BracketKey { points: 0, index: 1 }, 25),
                (BracketKey { points: 0, index: 2 }, 10),
            ]
        );
    }

    #[test]
    fn overflow_keeps_point_order() {
        let mut points = vec![3; 4];
        points.extend([0; 3]);
        let keys = Brackets::build(&cards(&points), 2).keys();

        assert_eq!(
            keys,
            vec![
                BracketKey { points: 3, index: 0 },
                BracketKey { points: 3, index: 1 },
                BracketKey { points: 0, index: 0 },
                BracketKey { points: 0, index: 1 },
            ]
        );
    }
}

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

#[cfg(feature = "bench")]
use std::time::Duration;

#[cfg(feature = "bench")]
use criterion::{Criterion, criterion_group, criterion_main};

#[cfg(feature = "bench")]
use rand::{Rng, SeedableRng, rngs::StdRng};

#[cfg(feature = "bench")]
use swiss_pairing::{
    PlayerId, RATE_FLOOR,
    config::PairingConfig,
    draft::Draft,
    matcher::Hungarian,
    pairing::RoundAssembler,
    player::Player,
    round::Round,
    scorecard::{MatchResult, Scorecard, standings},
};

/// Standings of `players` players after a few rounds of random results.
#[cfg(feature = "bench")]
fn history(players: u64, rounds: u64) -> (Vec<Player>, Vec<Scorecard<PlayerId>>) {
    let mut rng = StdRng::seed_from_u64(players);
    let roster: Vec<PlayerId> = (1..=players).collect();
    let mut results = Vec::new();

    for round in 0..rounds {
        for player in (1..players).step_by(2) {
            let opponent = (player + round * 2) % players + 1;
            if opponent != player {
                results.push(MatchResult {
                    player1: player,
                    player2: opponent,
                    player1_wins: rng.random_range(0..=2),
                    player2_wins: rng.random_range(0..=2),
                });
            }
        }
    }

    let players = roster.iter().map(|id| Player::new(*id, 1)).collect();
    (players, standings(&roster, &results, RATE_FLOOR))
}

#[cfg(feature = "bench")]
fn pair_round(c: &mut Criterion) {
    let config = PairingConfig::default();
    let draft = Draft::new(1, 1, 1);
    let round = Round::new(1, 1, 3);

    for size in [32, 128, 512] {
        let (players, cards) = history(size, 3);
        let mut rng = StdRng::seed_from_u64(size);

        c.bench_function(&format!("pair_round_{size}"), |b| {
            b.iter(|| {
                RoundAssembler::new(&Hungarian, &config)
                    .plan(&draft, &round, &cards, &players, &mut rng)
            });
        });
    }
}

#[cfg(feature = "bench")]
criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = pair_round
}

#[cfg(feature = "bench")]
criterion_main!(benches);

#[cfg(not(feature = "bench"))]
fn main() {
    eprintln!("You must enable pass `--features=bench`");
}

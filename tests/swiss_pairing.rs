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

use std::io::Cursor;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use swiss_pairing::{
    DraftId, Error, MatchId, PlayerId, RoundId, TournamentId, UserId,
    config::PairingConfig,
    draft::Draft,
    matches::{Actor, Match},
    pairing::NewMatch,
    player::Player,
    round::Round,
    scorecard::{POINTS_DRAW, POINTS_WIN},
    service,
    store::{DraftRepository, MatchRepository, MemoryStore, PlayerRepository, RoundRepository},
};

#[derive(Debug, Deserialize)]
struct Record {
    round: u32,
    player1: PlayerId,
    player2: PlayerId,
    wins1: u8,
    wins2: u8,
}

fn records(string: &str) -> anyhow::Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(string));

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        records.push(result?);
    }

    Ok(records)
}

fn new_draft(players: u64, rounds: u32, first_table: u32) -> MemoryStore {
    let mut store = MemoryStore::default();
    store.add_draft(Draft::new(1, 1, first_table));
    for id in 1..=players {
        store.add_player(Player::new(id, 1));
    }
    for index in 0..rounds {
        store.add_round(Round::new(u64::from(index) + 1, 1, index));
    }
    store
}

/// A draft of eight players who played the fixture's first two rounds.
fn played_draft() -> anyhow::Result<MemoryStore> {
    let mut store = new_draft(8, 3, 1);
    let records = records(include_str!("draft.csv"))?;
    let admin = Actor::admin(100);

    for round in store.rounds(1).into_iter().take(2) {
        store.mark_started(round.id)?;

        let new_matches: Vec<NewMatch> = records
            .iter()
            .filter(|record| record.round == round.index)
            .zip(1..)
            .map(|(record, table)| NewMatch {
                player1: record.player1,
                player2: record.player2,
                table,
            })
            .collect();

        for (game, record) in store
            .insert_matches(round.id, &new_matches)?
            .iter()
            .zip(records.iter().filter(|record| record.round == round.index))
        {
            service::report_result(&mut store, game.id, &admin, record.wins1, record.wins2, None)?;
        }

        service::finish_round(&mut store, round.id)?;
    }

    Ok(store)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn standings_from_the_fixture() -> anyhow::Result<()> {
    let store = played_draft()?;
    let standings = service::compute_standings(&store, 1, &PairingConfig::default())?;

    let order: Vec<u64> = standings.iter().map(|card| card.player).collect();
    assert_eq!(order, vec![1, 8, 3, 2, 5, 7, 4, 6]);

    let points: Vec<u32> = standings.iter().map(|card| card.points).collect();
    assert_eq!(points, vec![6, 6, 3, 3, 1, 1, 1, 1]);

    let first = &standings[0];
    assert!(close(first.pmw, 1.0));
    assert!(close(first.pgw, 0.8));
    assert!(close(first.omw, 0.5));
    assert!(close(first.ogw, 0.45));

    let second = &standings[1];
    assert!(close(second.omw, 0.33));
    assert!(close(second.pgw, 1.0));

    for card in &standings {
        assert!(card.pmw >= 0.33 && card.pmw <= 1.0);
        assert!(card.pgw >= 0.33 && card.pgw <= 1.0);
    }

    Ok(())
}

#[test]
fn third_round_of_the_fixture() -> anyhow::Result<()> {
    let mut store = played_draft()?;
    let mut rng = StdRng::seed_from_u64(3);

    let paired = service::pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng)?;

    assert_eq!(paired.round.index, 2);
    assert_eq!(paired.matches.len(), 4);
    assert!(paired.byes.is_empty());
    assert!(paired.repeats.is_empty());

    let tables: Vec<u32> = paired.matches.iter().map(|game| game.table).collect();
    assert_eq!(tables, vec![1, 2, 3, 4]);

    let top = &paired.matches[0];
    assert_eq!(
        (top.player1.min(top.player2), top.player1.max(top.player2)),
        (1, 8)
    );
    let next = &paired.matches[1];
    assert_eq!(
        (next.player1.min(next.player2), next.player1.max(next.player2)),
        (2, 3)
    );

    Ok(())
}

fn pair_key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
    (a.min(b), a.max(b))
}

fn play_out(store: &mut MemoryStore, matches: &[Match], rng: &mut StdRng) -> anyhow::Result<()> {
    for game in matches {
        let (wins1, wins2) = match rng.random_range(0..5) {
            0 => (1, 1),
            1 => (2, 1),
            2 => (2, 0),
            3 => (1, 2),
            _ => (0, 2),
        };

        let actor = Actor::player(game.player1, game.player1);
        let reported = service::report_result(store, game.id, &actor, wins1, wins2, None)?;

        let opponent = Actor::player(game.player2, game.player2);
        service::confirm_result(store, game.id, &opponent, Some(reported.version))?;
    }

    Ok(())
}

#[test]
fn every_round_pairs_everyone_once() -> anyhow::Result<()> {
    let config = PairingConfig::default();

    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let players = rng.random_range(2..=30);
        let first_table = rng.random_range(1..=20);
        let mut store = new_draft(players, 5, first_table);
        let mut met = FxHashSet::default();
        let mut decisive = 0;
        let mut drawn = 0;

        for index in 0..5 {
            if index == 3 {
                for _ in 0..players / 4 {
                    let id = rng.random_range(1..=players);
                    if let Some(player) = store.players.get_mut(&id) {
                        player.dropped = true;
                    }
                }
            }

            let had_bye: FxHashSet<PlayerId> = store
                .players(1)
                .iter()
                .filter(|player| player.had_bye)
                .map(|player| player.id)
                .collect();

            let paired = service::pair_next_round(&mut store, 1, &config, &mut rng)?;

            let mut seen = FxHashSet::default();
            for game in &paired.matches {
                assert!(seen.insert(game.player1));
                assert!(seen.insert(game.player2));

                let key = pair_key(game.player1, game.player2);
                let listed = paired
                    .repeats
                    .iter()
                    .any(|(a, b)| pair_key(*a, *b) == key);
                assert_eq!(met.contains(&key), listed);
            }
            for player in &paired.byes {
                assert!(seen.insert(*player));
            }

            let active: FxHashSet<PlayerId> = store
                .active_players(1)
                .iter()
                .map(|player| player.id)
                .collect();
            assert_eq!(seen, active);

            let tables: Vec<u32> = paired.matches.iter().map(|game| game.table).collect();
            let expected: Vec<u32> = (first_table..).take(tables.len()).collect();
            assert_eq!(tables, expected);

            for player in store.players(1) {
                assert_eq!(player.bye, paired.byes.contains(&player.id));
                if had_bye.contains(&player.id) {
                    assert!(player.had_bye);
                }
            }

            play_out(&mut store, &paired.matches, &mut rng)?;
            service::finish_round(&mut store, paired.round.id)?;

            for game in &paired.matches {
                met.insert(pair_key(game.player1, game.player2));
            }
        }

        for game in store.matches_of_draft(1, true) {
            if game.player1_wins == game.player2_wins {
                drawn += 1;
            } else {
                decisive += 1;
            }
        }

        let points: u32 = service::compute_standings(&store, 1, &config)?
            .iter()
            .map(|card| card.points)
            .sum();
        assert_eq!(points, POINTS_WIN * decisive + 2 * POINTS_DRAW * drawn);
    }

    Ok(())
}

/// Another pairing run starts the round between reading and writing.
struct Racing {
    inner: MemoryStore,
}

impl DraftRepository for Racing {
    fn draft(&self, draft_id: DraftId) -> Result<Draft, Error> {
        self.inner.draft(draft_id)
    }

    fn drafts_of_tournament(&self, tournament_id: TournamentId) -> Result<Vec<Draft>, Error> {
        self.inner.drafts_of_tournament(tournament_id)
    }

    fn mark_seated(&mut self, draft_id: DraftId) -> Result<(), Error> {
        self.inner.mark_seated(draft_id)
    }
}

impl PlayerRepository for Racing {
    fn players(&self, draft_id: DraftId) -> Vec<Player> {
        self.inner.players(draft_id)
    }

    fn player_of_user(&self, draft_id: DraftId, user_id: UserId) -> Option<Player> {
        self.inner.player_of_user(draft_id, user_id)
    }

    fn update_byes(&mut self, draft_id: DraftId, byes: &[PlayerId]) -> Result<(), Error> {
        self.inner.update_byes(draft_id, byes)
    }

    fn update_seats(&mut self, seats: &[(PlayerId, u32)]) -> Result<(), Error> {
        self.inner.update_seats(seats)
    }
}

impl MatchRepository for Racing {
    fn matches_of_draft(&self, draft_id: DraftId, confirmed_only: bool) -> Vec<Match> {
        self.inner.matches_of_draft(draft_id, confirmed_only)
    }

    fn matches_of_tournament(
        &self,
        tournament_id: TournamentId,
        confirmed_only: bool,
    ) -> Vec<Match> {
        self.inner.matches_of_tournament(tournament_id, confirmed_only)
    }

    fn get_match(&self, match_id: MatchId) -> Result<Match, Error> {
        self.inner.get_match(match_id)
    }

    fn insert_matches(
        &mut self,
        round_id: RoundId,
        matches: &[NewMatch],
    ) -> Result<Vec<Match>, Error> {
        self.inner.insert_matches(round_id, matches)
    }

    fn update_match(&mut self, game: &Match, expected_version: u64) -> Result<(), Error> {
        self.inner.update_match(game, expected_version)
    }
}

impl RoundRepository for Racing {
    fn round(&self, round_id: RoundId) -> Result<Round, Error> {
        self.inner.round(round_id)
    }

    fn rounds(&self, draft_id: DraftId) -> Vec<Round> {
        self.inner.rounds(draft_id)
    }

    fn mark_started(&mut self, round_id: RoundId) -> Result<Round, Error> {
        self.inner.mark_started(round_id)?;
        self.inner.mark_started(round_id)
    }

    fn update_round(&mut self, round: &Round) -> Result<(), Error> {
        self.inner.update_round(round)
    }
}

#[test]
fn a_round_is_only_paired_once() {
    let mut store = Racing {
        inner: new_draft(5, 1, 1),
    };
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(
        service::pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng),
        Err(Error::RoundAlreadyStarted)
    );
    assert!(store.inner.matches.is_empty());
    assert!(store.inner.players.values().all(|player| !player.bye));
}

#[test]
fn admins_correct_confirmed_results() -> anyhow::Result<()> {
    let mut store = new_draft(2, 1, 1);
    let mut rng = StdRng::seed_from_u64(2);
    let paired = service::pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng)?;
    let game = &paired.matches[0];

    let player = Actor::player(game.player1, game.player1);
    service::report_result(&mut store, game.id, &player, 2, 0, None)?;
    service::confirm_result(&mut store, game.id, &Actor::player(game.player2, game.player2), None)?;
    assert_eq!(
        service::report_result(&mut store, game.id, &player, 0, 2, None),
        Err(Error::AlreadyConfirmed)
    );

    let corrected = service::report_result(&mut store, game.id, &Actor::admin(100), 0, 2, None)?;
    assert!(corrected.confirmed);
    assert_eq!(corrected.reported_by, None);

    let standings = service::compute_standings(&store, 1, &PairingConfig::default())?;
    assert_eq!(standings[0].player, game.player2);

    Ok(())
}

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

//! The operations callers use: standings, pairing the next round, reporting
//! and confirming results, finishing rounds and seating a draft.

use log::{debug, info};
use rand::{Rng, seq::SliceRandom};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    DraftId, EnrollmentId, Error, MatchId, PlayerId, RoundId, TournamentId, UserId,
    config::PairingConfig,
    matcher::Hungarian,
    matches::{Actor, Match},
    pairing::RoundAssembler,
    player::Player,
    round::{Round, RoundStatus},
    scorecard::{MatchResult, Scorecard, compute_scorecards, sort_standings, standings},
    store::Store,
};

/// A round that was just paired and started.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PairedRound {
    pub round: Round,
    pub matches: Vec<Match>,
    pub byes: Vec<PlayerId>,
    pub repeats: Vec<(PlayerId, PlayerId)>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CurrentMatch {
    pub game: Match,
    pub opponent: PlayerId,
}

/// Ranks every enrollment of the tournament over all of its drafts.
///
/// # Errors
///
/// If the tournament has no drafts.
pub fn compute_standings<S: Store + ?Sized>(
    store: &S,
    tournament_id: TournamentId,
    config: &PairingConfig,
) -> Result<Vec<Scorecard<EnrollmentId>>, Error> {
    let drafts = store.drafts_of_tournament(tournament_id)?;

    let mut enrollments = FxHashMap::default();
    let mut roster = Vec::new();
    let mut seen = FxHashSet::default();

    for draft in &drafts {
        for player in store.players(draft.id) {
            enrollments.insert(player.id, player.enrollment_id);
            if seen.insert(player.enrollment_id) {
                roster.push(player.enrollment_id);
            }
        }
    }

    let results: Vec<MatchResult<EnrollmentId>> = store
        .matches_of_tournament(tournament_id, true)
        .iter()
        .filter_map(|game| {
            let result = game.result()?;
            Some(MatchResult {
                player1: *enrollments.get(&result.player1)?,
                player2: *enrollments.get(&result.player2)?,
                player1_wins: result.player1_wins,
                player2_wins: result.player2_wins,
            })
        })
        .collect();

    debug!(
        "tournament {tournament_id}: {} enrollments, {} results",
        roster.len(),
        results.len()
    );

    Ok(standings(&roster, &results, config.rate_floor))
}

/// The scorecards used to pair a draft, best first.
///
/// Points and rates come from confirmed results. Every match ever made in
/// the draft counts as a meeting, so unconfirmed matches aren't repeated.
///
/// # Errors
///
/// If the draft doesn't exist.
pub fn draft_standings<S: Store + ?Sized>(
    store: &S,
    draft_id: DraftId,
    config: &PairingConfig,
) -> Result<Vec<Scorecard<PlayerId>>, Error> {
    store.draft(draft_id)?;

    let roster: Vec<PlayerId> = store.players(draft_id).iter().map(|player| player.id).collect();
    let results: Vec<MatchResult<PlayerId>> = store
        .matches_of_draft(draft_id, true)
        .iter()
        .filter_map(Match::result)
        .collect();

    let mut cards = compute_scorecards(&roster, &results, config.rate_floor);

    for game in store.matches_of_draft(draft_id, false) {
        for card in &mut cards {
            if let Some(opponent) = game.opponent_of(card.player)
                && opponent != card.player
                && !card.has_played(opponent)
            {
                card.opponents.push(opponent);
            }
        }
    }

    sort_standings(&mut cards);
    Ok(cards)
}

/// Pairs the first round of the draft that hasn't started.
///
/// Nothing is written unless the whole round could be paired. The round is
/// started before its matches are stored, so a second run on the same round
/// fails instead of pairing it twice.
///
/// # Errors
///
/// If the draft has no round to pair or no players, or the round was
/// started by someone else meanwhile.
pub fn pair_next_round<S: Store + ?Sized, R: Rng + ?Sized>(
    store: &mut S,
    draft_id: DraftId,
    config: &PairingConfig,
    rng: &mut R,
) -> Result<PairedRound, Error> {
    let draft = store.draft(draft_id)?;
    let round = store.next_round(draft_id).ok_or(Error::NoEligibleRound)?;
    let players = store.players(draft_id);
    let cards = draft_standings(store, draft_id, config)?;

    let plan = RoundAssembler::new(&Hungarian, config).plan(&draft, &round, &cards, &players, rng)?;

    let round = store.mark_started(round.id)?;
    let matches = store.insert_matches(round.id, &plan.matches)?;
    store.update_byes(draft_id, &plan.byes)?;

    info!(
        "draft {draft_id}: started round {} with {} matches",
        round.index,
        matches.len()
    );

    Ok(PairedRound {
        round,
        matches,
        byes: plan.byes,
        repeats: plan.repeats,
    })
}

/// Who `user_id` is in the match's draft.
///
/// # Errors
///
/// If the match or its round doesn't exist.
pub fn actor_for<S: Store + ?Sized>(
    store: &S,
    match_id: MatchId,
    user_id: UserId,
    admin: bool,
) -> Result<Actor, Error> {
    let game = store.get_match(match_id)?;
    let round = store.round(game.round_id)?;
    let player = store.player_of_user(round.draft_id, user_id);

    Ok(Actor {
        user_id,
        player_id: player.map(|player| player.id),
        admin,
    })
}

/// Records a result for a match.
///
/// `seen_version` is the version the caller last saw, if it showed the match
/// to a user before.
///
/// # Errors
///
/// If the actor may not report, the score is invalid, the result is
/// confirmed already, or the match changed since `seen_version`.
pub fn report_result<S: Store + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    actor: &Actor,
    player1_wins: u8,
    player2_wins: u8,
    seen_version: Option<u64>,
) -> Result<Match, Error> {
    let mut game = store.get_match(match_id)?;
    let version = game.version;
    if seen_version.is_some_and(|seen| seen != version) {
        return Err(Error::StaleMatch);
    }

    let state = game.report(actor, player1_wins, player2_wins)?;
    store.update_match(&game, version)?;

    debug!("match {match_id}: {state} by user {}", actor.user_id);
    Ok(game)
}

/// # Errors
///
/// If the actor may not confirm, there is no result to confirm, or the match
/// changed since `seen_version`.
pub fn confirm_result<S: Store + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    actor: &Actor,
    seen_version: Option<u64>,
) -> Result<Match, Error> {
    let mut game = store.get_match(match_id)?;
    let version = game.version;
    if seen_version.is_some_and(|seen| seen != version) {
        return Err(Error::StaleMatch);
    }

    game.confirm(actor)?;
    store.update_match(&game, version)?;

    debug!("match {match_id}: confirmed by user {}", actor.user_id);
    Ok(game)
}

/// # Errors
///
/// If the round isn't running or has unconfirmed matches.
pub fn finish_round<S: Store + ?Sized>(store: &mut S, round_id: RoundId) -> Result<Round, Error> {
    let mut round = store.round(round_id)?;
    let matches = store.matches_of_draft(round.draft_id, false);

    round.finish(&matches)?;
    store.update_round(&round)?;

    info!("draft {}: finished round {}", round.draft_id, round.index);
    Ok(round)
}

/// Seats the draft's players in a random order, starting at seat 1.
///
/// # Errors
///
/// If the draft doesn't exist or has no players.
pub fn make_seatings<S: Store + ?Sized, R: Rng + ?Sized>(
    store: &mut S,
    draft_id: DraftId,
    rng: &mut R,
) -> Result<Vec<Player>, Error> {
    store.draft(draft_id)?;

    let mut players = store.active_players(draft_id);
    if players.is_empty() {
        return Err(Error::NoPlayersToSeat);
    }

    players.shuffle(rng);

    let mut seats = Vec::with_capacity(players.len());
    for (seat, player) in (1..).zip(players.iter_mut()) {
        player.seat = Some(seat);
        seats.push((player.id, seat));
    }

    store.update_seats(&seats)?;
    store.mark_seated(draft_id)?;

    info!("draft {draft_id}: seated {} players", players.len());
    Ok(players)
}

/// The matches of the draft's running rounds.
///
/// # Errors
///
/// If the draft doesn't exist.
pub fn ongoing_matches<S: Store + ?Sized>(store: &S, draft_id: DraftId) -> Result<Vec<Match>, Error> {
    store.draft(draft_id)?;

    let running: FxHashSet<RoundId> = store
        .rounds(draft_id)
        .iter()
        .filter(|round| round.status == RoundStatus::Started)
        .map(|round| round.id)
        .collect();

    Ok(store
        .matches_of_draft(draft_id, false)
        .into_iter()
        .filter(|game| running.contains(&game.round_id))
        .collect())
}

/// The running match of a player, if they have one.
///
/// # Errors
///
/// If the draft doesn't exist.
pub fn current_match<S: Store + ?Sized>(
    store: &S,
    draft_id: DraftId,
    player_id: PlayerId,
) -> Result<Option<CurrentMatch>, Error> {
    Ok(ongoing_matches(store, draft_id)?
        .into_iter()
        .find_map(|game| {
            let opponent = game.opponent_of(player_id)?;
            Some(CurrentMatch { game, opponent })
        }))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use crate::{
        draft::Draft,
        store::{DraftRepository, MatchRepository, MemoryStore, PlayerRepository, RoundRepository},
    };

    use super::*;

    fn new_store(players: u64, rounds: u32) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.add_draft(Draft::new(1, 1, 1));
        for id in 1..=players {
            store.add_player(Player::new(id, 1));
        }
        for index in 0..rounds {
            store.add_round(Round::new(u64::from(index) + 1, 1, index));
        }
        store
    }

    fn confirm_all(store: &mut MemoryStore, rng: &mut StdRng) -> anyhow::Result<()> {
        for game in ongoing_matches(&*store, 1)? {
            if game.confirmed {
                continue;
            }
            let (wins_1, wins_2) = if rng.random_bool(0.5) { (2, 1) } else { (0, 2) };
            report_result(store, game.id, &Actor::admin(99), wins_1, wins_2, None)?;
        }
        Ok(())
    }

    #[test]
    fn pairing_needs_a_round() {
        let mut store = new_store(4, 0);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng),
            Err(Error::NoEligibleRound)
        );
    }

    #[test]
    fn pairing_needs_players() {
        let mut store = new_store(0, 1);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng),
            Err(Error::NoPlayersToPair)
        );
        assert_eq!(store.round(1).map(|round| round.status), Ok(RoundStatus::NotStarted));
    }

    #[test]
    fn rounds_are_paired_in_order() -> anyhow::Result<()> {
        let mut store = new_store(7, 3);
        let config = PairingConfig::default();
        let mut rng = StdRng::seed_from_u64(5);

        for index in 0..3 {
            let had_bye: FxHashSet<PlayerId> = store
                .players(1)
                .iter()
                .filter(|player| player.had_bye)
                .map(|player| player.id)
                .collect();

            let paired = pair_next_round(&mut store, 1, &config, &mut rng)?;
            assert_eq!(paired.round.index, index);
            assert_eq!(paired.matches.len(), 3);
            assert_eq!(paired.byes.len(), 1);
            if index < 2 {
                assert!(paired.repeats.is_empty());
                assert!(!had_bye.contains(&paired.byes[0]));
            }

            let with_bye: Vec<PlayerId> = store
                .players(1)
                .iter()
                .filter(|player| player.bye)
                .map(|player| player.id)
                .collect();
            assert_eq!(with_bye, paired.byes);

            confirm_all(&mut store, &mut rng)?;
            finish_round(&mut store, paired.round.id)?;
        }

        assert_eq!(
            pair_next_round(&mut store, 1, &config, &mut rng),
            Err(Error::NoEligibleRound)
        );

        Ok(())
    }

    #[test]
    fn unfinished_rounds_block_finishing() -> anyhow::Result<()> {
        let mut store = new_store(4, 1);
        let mut rng = StdRng::seed_from_u64(2);

        assert_eq!(finish_round(&mut store, 1), Err(Error::RoundNotStarted));
        let paired = pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng)?;
        assert_eq!(finish_round(&mut store, 1), Err(Error::UnconfirmedMatches(2)));

        let game = &paired.matches[0];
        let actor = actor_for(&store, game.id, game.player1, false)?;
        let reported = report_result(&mut store, game.id, &actor, 2, 0, Some(game.version))?;
        assert_eq!(finish_round(&mut store, 1), Err(Error::UnconfirmedMatches(2)));

        let opponent = actor_for(&store, game.id, game.player2, false)?;
        assert_eq!(
            confirm_result(&mut store, game.id, &opponent, Some(game.version)),
            Err(Error::StaleMatch)
        );
        confirm_result(&mut store, game.id, &opponent, Some(reported.version))?;
        assert_eq!(finish_round(&mut store, 1), Err(Error::UnconfirmedMatches(1)));

        Ok(())
    }

    #[test]
    fn outsiders_cannot_report() -> anyhow::Result<()> {
        let mut store = new_store(4, 1);
        let mut rng = StdRng::seed_from_u64(3);
        let paired = pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng)?;

        let game = &paired.matches[0];
        let outsider = paired.matches[1].player1;
        let actor = actor_for(&store, game.id, outsider, false)?;

        assert_eq!(
            report_result(&mut store, game.id, &actor, 2, 0, None),
            Err(Error::UnauthorizedReport(outsider))
        );
        assert_eq!(store.get_match(game.id)?.player1_wins, None);

        Ok(())
    }

    #[test]
    fn current_match_finds_the_opponent() -> anyhow::Result<()> {
        let mut store = new_store(2, 1);
        let mut rng = StdRng::seed_from_u64(4);

        assert_eq!(current_match(&store, 1, 1)?, None);
        pair_next_round(&mut store, 1, &PairingConfig::default(), &mut rng)?;

        let current = current_match(&store, 1, 1)?;
        assert_eq!(current.map(|current| current.opponent), Some(2));
        assert_eq!(ongoing_matches(&store, 1)?.len(), 1);

        Ok(())
    }

    #[test]
    fn seatings_cover_every_player() -> anyhow::Result<()> {
        let mut store = new_store(6, 0);
        let mut rng = StdRng::seed_from_u64(6);

        let players = make_seatings(&mut store, 1, &mut rng)?;

        let mut seats: Vec<u32> = players.iter().filter_map(|player| player.seat).collect();
        seats.sort_unstable();
        assert_eq!(seats, vec![1, 2, 3, 4, 5, 6]);
        assert!(store.draft(1)?.seated);
        assert!(store.players(1).iter().all(|player| player.seat.is_some()));

        let mut empty = new_store(0, 0);
        assert_eq!(make_seatings(&mut empty, 1, &mut rng), Err(Error::NoPlayersToSeat));

        Ok(())
    }

    #[test]
    fn standings_follow_enrollments() -> anyhow::Result<()> {
        let mut store = new_store(2, 1);
        store.add_draft(Draft::new(2, 1, 1));
        let mut second = Player::new(3, 2);
        second.enrollment_id = 1;
        store.add_player(second);
        let mut other = Player::new(4, 2);
        other.enrollment_id = 2;
        store.add_player(other);
        store.add_round(Round::new(2, 2, 0));

        let config = PairingConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        for draft in [1, 2] {
            let paired = pair_next_round(&mut store, draft, &config, &mut rng)?;
            let game = &paired.matches[0];
            let (wins_1, wins_2) = if game.player1 % 2 == 1 { (2, 0) } else { (0, 2) };
            report_result(&mut store, game.id, &Actor::admin(99), wins_1, wins_2, None)?;
        }

        let standings = compute_standings(&store, 1, &config)?;

        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].player, 1);
        assert_eq!(standings[0].points, 6);
        assert_eq!(standings[0].matches_played, 2);
        assert_eq!(standings[1].points, 0);
        assert_eq!(
            compute_standings(&store, 7, &config),
            Err(Error::UnknownTournament(7))
        );

        Ok(())
    }
}

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

//! Where drafts, players, rounds and matches are kept.
//!
//! The pairing core only talks to the traits. [`MemoryStore`] implements all
//! of them and is saved as a RON file by the command line tool.

use std::{collections::BTreeMap, fs, io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    DraftId, Error, MatchId, PlayerId, RoundId, TournamentId, UserId,
    draft::Draft,
    matches::Match,
    pairing::NewMatch,
    player::Player,
    round::{Round, RoundStatus},
};

pub trait DraftRepository {
    /// # Errors
    ///
    /// If the draft doesn't exist.
    fn draft(&self, draft_id: DraftId) -> Result<Draft, Error>;

    /// # Errors
    ///
    /// If the tournament has no drafts.
    fn drafts_of_tournament(&self, tournament_id: TournamentId) -> Result<Vec<Draft>, Error>;

    /// # Errors
    ///
    /// If the draft doesn't exist.
    fn mark_seated(&mut self, draft_id: DraftId) -> Result<(), Error>;
}

pub trait PlayerRepository {
    /// Every player of the draft, dropped players included.
    fn players(&self, draft_id: DraftId) -> Vec<Player>;

    #[must_use]
    fn active_players(&self, draft_id: DraftId) -> Vec<Player> {
        self.players(draft_id)
            .into_iter()
            .filter(|player| !player.dropped)
            .collect()
    }

    #[must_use]
    fn player_of_user(&self, draft_id: DraftId, user_id: UserId) -> Option<Player> {
        self.players(draft_id)
            .into_iter()
            .find(|player| player.user_id == user_id)
    }

    /// Clears the bye of every player in the draft, then gives `byes` a bye.
    ///
    /// # Errors
    ///
    /// If a player with a bye isn't in the draft.
    fn update_byes(&mut self, draft_id: DraftId, byes: &[PlayerId]) -> Result<(), Error>;

    /// # Errors
    ///
    /// If a player doesn't exist.
    fn update_seats(&mut self, seats: &[(PlayerId, u32)]) -> Result<(), Error>;
}

pub trait MatchRepository {
    /// The matches of a draft, latest round first.
    fn matches_of_draft(&self, draft_id: DraftId, confirmed_only: bool) -> Vec<Match>;

    /// The matches of every draft in a tournament, latest round first.
    fn matches_of_tournament(
        &self,
        tournament_id: TournamentId,
        confirmed_only: bool,
    ) -> Vec<Match>;

    /// # Errors
    ///
    /// If the match doesn't exist.
    fn get_match(&self, match_id: MatchId) -> Result<Match, Error>;

    /// # Errors
    ///
    /// If the round doesn't exist.
    fn insert_matches(
        &mut self,
        round_id: RoundId,
        matches: &[NewMatch],
    ) -> Result<Vec<Match>, Error>;

    /// Replaces a match if nobody changed it since it was read at
    /// `expected_version`.
    ///
    /// # Errors
    ///
    /// If the match doesn't exist or is stale.
    fn update_match(&mut self, game: &Match, expected_version: u64) -> Result<(), Error>;
}

pub trait RoundRepository {
    /// # Errors
    ///
    /// If the round doesn't exist.
    fn round(&self, round_id: RoundId) -> Result<Round, Error>;

    /// The rounds of a draft by index.
    fn rounds(&self, draft_id: DraftId) -> Vec<Round>;

    /// The first round of the draft that hasn't started.
    #[must_use]
    fn next_round(&self, draft_id: DraftId) -> Option<Round> {
        self.rounds(draft_id)
            .into_iter()
            .find(|round| round.status == RoundStatus::NotStarted)
    }

    /// Starts the round if it hasn't been started, in one step.
    ///
    /// # Errors
    ///
    /// If the round doesn't exist or was already started.
    fn mark_started(&mut self, round_id: RoundId) -> Result<Round, Error>;

    /// # Errors
    ///
    /// If the round doesn't exist.
    fn update_round(&mut self, round: &Round) -> Result<(), Error>;
}

pub trait Store: DraftRepository + PlayerRepository + MatchRepository + RoundRepository {}

impl<T: DraftRepository + PlayerRepository + MatchRepository + RoundRepository> Store for T {}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MemoryStore {
    pub drafts: BTreeMap<DraftId, Draft>,
    pub players: BTreeMap<PlayerId, Player>,
    pub rounds: BTreeMap<RoundId, Round>,
    pub matches: BTreeMap<MatchId, Match>,
    next_match_id: MatchId,
}

impl MemoryStore {
    /// Reads a store, or starts an empty one if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// If the file can't be read or isn't a valid RON store.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(string) => match ron::from_str(&string) {
                Ok(store) => Ok(store),
                Err(err) => Err(anyhow::Error::msg(format!(
                    "RON: {}: {err}",
                    path.display()
                ))),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// # Errors
    ///
    /// If the store can't be serialized or written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, string)?;

        Ok(())
    }

    pub fn add_draft(&mut self, draft: Draft) {
        self.drafts.insert(draft.id, draft);
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    pub fn add_round(&mut self, round: Round) {
        self.rounds.insert(round.id, round);
    }

    fn draft_of_round(&self, round_id: RoundId) -> Option<DraftId> {
        self.rounds.get(&round_id).map(|round| round.draft_id)
    }

    fn collect_matches<F: Fn(DraftId) -> bool>(
        &self,
        in_scope: F,
        confirmed_only: bool,
    ) -> Vec<Match> {
        let mut matches: Vec<Match> = self
            .matches
            .values()
            .filter(|game| !confirmed_only || game.confirmed)
            .filter(|game| self.draft_of_round(game.round_id).is_some_and(&in_scope))
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.round_index.cmp(&a.round_index).then(a.id.cmp(&b.id)));
        matches
    }
}

impl DraftRepository for MemoryStore {
    fn draft(&self, draft_id: DraftId) -> Result<Draft, Error> {
        self.drafts
            .get(&draft_id)
            .cloned()
            .ok_or(Error::UnknownDraft(draft_id))
    }

    fn drafts_of_tournament(&self, tournament_id: TournamentId) -> Result<Vec<Draft>, Error> {
        let drafts: Vec<Draft> = self
            .drafts
            .values()
            .filter(|draft| draft.tournament_id == tournament_id)
            .cloned()
            .collect();

        if drafts.is_empty() {
            return Err(Error::UnknownTournament(tournament_id));
        }

        Ok(drafts)
    }

    fn mark_seated(&mut self, draft_id: DraftId) -> Result<(), Error> {
        let draft = self
            .drafts
            .get_mut(&draft_id)
            .ok_or(Error::UnknownDraft(draft_id))?;

        draft.seated = true;
        Ok(())
    }
}

impl PlayerRepository for MemoryStore {
    fn players(&self, draft_id: DraftId) -> Vec<Player> {
        self.players
            .values()
            .filter(|player| player.draft_id == draft_id)
            .cloned()
            .collect()
    }

    fn update_byes(&mut self, draft_id: DraftId, byes: &[PlayerId]) -> Result<(), Error> {
        if let Some(player) = byes.iter().find(|id| {
            self.players
                .get(id)
                .is_none_or(|player| player.draft_id != draft_id)
        }) {
            return Err(Error::UnknownPlayer(*player));
        }

        for player in self.players.values_mut() {
            if player.draft_id == draft_id {
                player.bye = false;
            }
        }

        for id in byes {
            if let Some(player) = self.players.get_mut(id) {
                player.assign_bye();
            }
        }

        Ok(())
    }

    fn update_seats(&mut self, seats: &[(PlayerId, u32)]) -> Result<(), Error> {
        if let Some((player, _)) = seats
            .iter()
            .find(|(id, _)| !self.players.contains_key(id))
        {
            return Err(Error::UnknownPlayer(*player));
        }

        for (id, seat) in seats {
            if let Some(player) = self.players.get_mut(id) {
                player.seat = Some(*seat);
            }
        }

        Ok(())
    }
}

impl MatchRepository for MemoryStore {
    fn matches_of_draft(&self, draft_id: DraftId, confirmed_only: bool) -> Vec<Match> {
        self.collect_matches(|draft| draft == draft_id, confirmed_only)
    }

    fn matches_of_tournament(
        &self,
        tournament_id: TournamentId,
        confirmed_only: bool,
    ) -> Vec<Match> {
        self.collect_matches(
            |draft| {
                self.drafts
                    .get(&draft)
                    .is_some_and(|draft| draft.tournament_id == tournament_id)
            },
            confirmed_only,
        )
    }

    fn get_match(&self, match_id: MatchId) -> Result<Match, Error> {
        self.matches
            .get(&match_id)
            .cloned()
            .ok_or(Error::UnknownMatch(match_id))
    }

    fn insert_matches(
        &mut self,
        round_id: RoundId,
        matches: &[NewMatch],
    ) -> Result<Vec<Match>, Error> {
        let round = self.round(round_id)?;
        let mut inserted = Vec::with_capacity(matches.len());

        for new in matches {
            self.next_match_id += 1;
            let game = Match::new(
                self.next_match_id,
                &round,
                new.player1,
                new.player2,
                new.table,
            );
            self.matches.insert(game.id, game.clone());
            inserted.push(game);
        }

        Ok(inserted)
    }

    fn update_match(&mut self, game: &Match, expected_version: u64) -> Result<(), Error> {
        let stored = self
            .matches
            .get_mut(&game.id)
            .ok_or(Error::UnknownMatch(game.id))?;

        if stored.version != expected_version {
            return Err(Error::StaleMatch);
        }

        *stored = game.clone();
        Ok(())
    }
}

impl RoundRepository for MemoryStore {
    fn round(&self, round_id: RoundId) -> Result<Round, Error> {
        self.rounds
            .get(&round_id)
            .cloned()
            .ok_or(Error::UnknownRound(round_id))
    }

    fn rounds(&self, draft_id: DraftId) -> Vec<Round> {
        let mut rounds: Vec<Round> = self
            .rounds
            .values()
            .filter(|round| round.draft_id == draft_id)
            .cloned()
            .collect();

        rounds.sort_by_key(|round| round.index);
        rounds
    }

    fn mark_started(&mut self, round_id: RoundId) -> Result<Round, Error> {
        let round = self
            .rounds
            .get_mut(&round_id)
            .ok_or(Error::UnknownRound(round_id))?;

        round.start()?;
        Ok(round.clone())
    }

    fn update_round(&mut self, round: &Round) -> Result<(), Error> {
        let stored = self
            .rounds
            .get_mut(&round.id)
            .ok_or(Error::UnknownRound(round.id))?;

        *stored = round.clone();
        Ok(())
    }
}

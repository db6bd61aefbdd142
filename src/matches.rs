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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Error, GAMES_TO_WIN, MatchId, PlayerId, RoundId, UserId, round::Round,
    scorecard::MatchResult,
};

/// Who is trying to change a match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor {
    pub user_id: UserId,
    /// The actor's player in the match's draft, if they play in it.
    pub player_id: Option<PlayerId>,
    pub admin: bool,
}

impl Actor {
    #[must_use]
    pub fn player(user_id: UserId, player_id: PlayerId) -> Self {
        Self {
            user_id,
            player_id: Some(player_id),
            admin: false,
        }
    }

    #[must_use]
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            player_id: None,
            admin: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatchState {
    Unreported,
    Reported,
    Confirmed,
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreported => write!(f, "unreported"),
            Self::Reported => write!(f, "reported"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Player1,
    Player2,
    Draw,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Match {
    pub id: MatchId,
    pub round_id: RoundId,
    pub round_index: u32,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub table: u32,
    #[serde(default)]
    pub player1_wins: Option<u8>,
    #[serde(default)]
    pub player2_wins: Option<u8>,
    #[serde(default)]
    pub reported_by: Option<UserId>,
    #[serde(default)]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confirmed: bool,
    /// Bumped by every change, so a stale copy can't overwrite a newer one.
    #[serde(default)]
    pub version: u64,
}

impl Match {
    #[must_use]
    pub fn new(
        id: MatchId,
        round: &Round,
        player1: PlayerId,
        player2: PlayerId,
        table: u32,
    ) -> Self {
        Self {
            id,
            round_id: round.id,
            round_index: round.index,
            player1,
            player2,
            table,
            player1_wins: None,
            player2_wins: None,
            reported_by: None,
            reported_at: None,
            confirmed: false,
            version: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> MatchState {
        if self.confirmed {
            MatchState::Confirmed
        } else if self.player1_wins.is_some() && self.player2_wins.is_some() {
            MatchState::Reported
        } else {
            MatchState::Unreported
        }
    }

    #[must_use]
    pub fn has_player(&self, player: PlayerId) -> bool {
        self.player1 == player || self.player2 == player
    }

    #[must_use]
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.player1 == player {
            Some(self.player2)
        } else if self.player2 == player {
            Some(self.player1)
        } else {
            None
        }
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        let (wins_1, wins_2) = (self.player1_wins?, self.player2_wins?);

        Some(match wins_1.cmp(&wins_2) {
            std::cmp::Ordering::Greater => Outcome::Player1,
            std::cmp::Ordering::Less => Outcome::Player2,
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    #[must_use]
    pub fn result(&self) -> Option<MatchResult<PlayerId>> {
        Some(MatchResult {
            player1: self.player1,
            player2: self.player2,
            player1_wins: self.player1_wins?,
            player2_wins: self.player2_wins?,
        })
    }

    fn is_participant(&self, actor: &Actor) -> bool {
        actor.player_id.is_some_and(|id| self.has_player(id))
    }

    /// Records the game wins of both players.
    ///
    /// A participant's report waits for a confirmation. An admin who doesn't
    /// play in the match reports a confirmed result, and is the only one who
    /// may correct an already confirmed result.
    ///
    /// # Errors
    ///
    /// If the actor may not report this match, the result is already
    /// confirmed, or the score is impossible.
    pub fn report(
        &mut self,
        actor: &Actor,
        player1_wins: u8,
        player2_wins: u8,
    ) -> Result<MatchState, Error> {
        let participant = self.is_participant(actor);
        if !participant && !actor.admin {
            return Err(Error::UnauthorizedReport(actor.user_id));
        }
        if self.confirmed && !actor.admin {
            return Err(Error::AlreadyConfirmed);
        }

        for got in [player1_wins, player2_wins] {
            if got > GAMES_TO_WIN {
                return Err(Error::InvalidScore {
                    got,
                    max: GAMES_TO_WIN,
                });
            }
        }

        self.player1_wins = Some(player1_wins);
        self.player2_wins = Some(player2_wins);
        self.reported_at = Some(Utc::now());

        if participant {
            self.reported_by = Some(actor.user_id);
        } else {
            self.reported_by = None;
            self.confirmed = true;
        }

        self.version += 1;
        Ok(self.state())
    }

    /// # Errors
    ///
    /// If the actor may not confirm this match, or there is nothing to confirm.
    pub fn confirm(&mut self, actor: &Actor) -> Result<(), Error> {
        if !self.is_participant(actor) && !actor.admin {
            return Err(Error::UnauthorizedReport(actor.user_id));
        }

        match self.state() {
            MatchState::Unreported => Err(Error::NotReported),
            MatchState::Confirmed => Err(Error::AlreadyConfirmed),
            MatchState::Reported => {
                self.confirmed = true;
                self.version += 1;
                Ok(())
            }
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "table {}: {} vs {}",
            self.table, self.player1, self.player2
        )?;

        if let (Some(wins_1), Some(wins_2)) = (self.player1_wins, self.player2_wins) {
            write!(f, " {wins_1}-{wins_2}")?;
        }

        write!(f, " ({})", self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_match() -> Match {
        Match::new(1, &Round::new(1, 1, 0), 10, 20, 1)
    }

    #[test]
    fn participant_reports_then_opponent_confirms() -> anyhow::Result<()> {
        let mut game = new_match();
        let reporter = Actor::player(100, 10);
        let opponent = Actor::player(200, 20);

        assert_eq!(game.report(&reporter, 2, 1)?, MatchState::Reported);
        assert_eq!(game.reported_by, Some(100));
        assert_eq!(game.outcome(), Some(Outcome::Player1));

        game.confirm(&opponent)?;
        assert_eq!(game.state(), MatchState::Confirmed);
        assert_eq!(game.version, 2);

        Ok(())
    }

    #[test]
    fn stranger_can_not_report() {
        let mut game = new_match();
        let stranger = Actor::player(300, 30);

        assert_eq!(
            game.report(&stranger, 2, 0),
            Err(Error::UnauthorizedReport(300))
        );
        assert_eq!(game.confirm(&stranger), Err(Error::UnauthorizedReport(300)));
        assert_eq!(game.state(), MatchState::Unreported);
        assert_eq!(game.version, 0);
    }

    #[test]
    fn admin_report_is_confirmed() -> anyhow::Result<()> {
        let mut game = new_match();

        assert_eq!(game.report(&Actor::admin(1), 1, 1)?, MatchState::Confirmed);
        assert_eq!(game.reported_by, None);
        assert_eq!(game.outcome(), Some(Outcome::Draw));

        Ok(())
    }

    #[test]
    fn confirmed_results_only_change_for_admins() -> anyhow::Result<()> {
        let mut game = new_match();
        let player = Actor::player(100, 10);

        assert_eq!(game.confirm(&player), Err(Error::NotReported));
        game.report(&player, 0, 2)?;
        game.confirm(&player)?;

        assert_eq!(game.report(&player, 2, 0), Err(Error::AlreadyConfirmed));
        assert_eq!(game.confirm(&player), Err(Error::AlreadyConfirmed));

        game.report(&Actor::admin(1), 2, 0)?;
        assert_eq!(game.outcome(), Some(Outcome::Player1));
        assert!(game.confirmed);

        Ok(())
    }

    #[test]
    fn impossible_scores_are_rejected() {
        let mut game = new_match();

        assert_eq!(
            game.report(&Actor::player(100, 10), 3, 0),
            Err(Error::InvalidScore { got: 3, max: 2 })
        );
        assert_eq!(game.player1_wins, None);
    }
}

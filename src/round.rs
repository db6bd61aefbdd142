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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{DraftId, Error, RoundId, matches::Match};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RoundStatus {
    #[default]
    NotStarted,
    Started,
    Finished,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Started => write!(f, "started"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

impl FromStr for RoundStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "not_started" => Ok(Self::NotStarted),
            "started" => Ok(Self::Started),
            "finished" => Ok(Self::Finished),
            _ => Err(anyhow::Error::msg(format!("invalid round status: {value}"))),
        }
    }
}

/// A round of a draft. Rounds are created empty ahead of time and filled when
/// they are paired.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Round {
    pub id: RoundId,
    pub draft_id: DraftId,
    pub index: u32,
    #[serde(default)]
    pub status: RoundStatus,
}

impl Round {
    #[must_use]
    pub fn new(id: RoundId, draft_id: DraftId, index: u32) -> Self {
        Self {
            id,
            draft_id,
            index,
            status: RoundStatus::NotStarted,
        }
    }

    /// # Errors
    ///
    /// If the round was already started.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.status != RoundStatus::NotStarted {
            return Err(Error::RoundAlreadyStarted);
        }

        self.status = RoundStatus::Started;
        Ok(())
    }

    /// Closes the round once every one of its matches has a confirmed result.
    ///
    /// # Errors
    ///
    /// If the round isn't running or some match isn't confirmed.
    pub fn finish(&mut self, matches: &[Match]) -> Result<(), Error> {
        if self.status != RoundStatus::Started {
            return Err(Error::RoundNotStarted);
        }

        let unconfirmed = matches
            .iter()
            .filter(|game| game.round_id == self.id && !game.confirmed)
            .count();

        if unconfirmed > 0 {
            return Err(Error::UnconfirmedMatches(unconfirmed));
        }

        self.status = RoundStatus::Finished;
        Ok(())
    }
}

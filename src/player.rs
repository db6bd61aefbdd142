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

use serde::{Deserialize, Serialize};

use crate::{DraftId, EnrollmentId, PlayerId, UserId};

/// A player enrolled in one draft.
///
/// Points and tie-breakers are not stored here, they are recomputed from the
/// match history every time a round is paired.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub enrollment_id: EnrollmentId,
    #[serde(default)]
    pub user_id: UserId,
    pub draft_id: DraftId,
    #[serde(default)]
    pub seat: Option<u32>,
    /// Sits out the current round.
    #[serde(default)]
    pub bye: bool,
    /// Has sat out some round of this draft. Once set it stays set.
    #[serde(default)]
    pub had_bye: bool,
    #[serde(default)]
    pub dropped: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, draft_id: DraftId) -> Self {
        Self {
            id,
            enrollment_id: id,
            user_id: id,
            draft_id,
            ..Self::default()
        }
    }

    pub fn assign_bye(&mut self) {
        self.bye = true;
        self.had_bye = true;
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;

        if let Some(seat) = self.seat {
            write!(f, " seat={seat}")?;
        }
        if self.bye {
            write!(f, " bye")?;
        }
        if self.dropped {
            write!(f, " dropped")?;
        }

        Ok(())
    }
}

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

use serde::{Deserialize, Serialize};

use crate::{DraftId, TournamentId};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Draft {
    pub id: DraftId,
    pub tournament_id: TournamentId,
    /// The table number the first match of a round is played at.
    pub table_first: u32,
    /// The highest table number the venue has.
    pub table_last: u32,
    #[serde(default)]
    pub seated: bool,
}

impl Draft {
    #[must_use]
    pub fn new(id: DraftId, tournament_id: TournamentId, table_first: u32) -> Self {
        Self {
            id,
            tournament_id,
            table_first,
            table_last: u32::MAX,
            seated: false,
        }
    }

    #[must_use]
    pub fn has_table(&self, table: u32) -> bool {
        (self.table_first..=self.table_last).contains(&table)
    }
}

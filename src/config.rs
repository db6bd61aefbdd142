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

use std::{fs, path::Path};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{MAX_BRACKET_SIZE, RATE_FLOOR};

/// Knobs for scoring and pairing a round.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PairingConfig {
    /// Brackets larger than this are split into several brackets with the
    /// same points.
    pub max_bracket_size: usize,
    /// Match and game win rates never drop below this.
    pub rate_floor: f64,
    /// Edge weights between ordinary players are drawn uniformly from
    /// `min_tie_break..=max_tie_break`.
    pub min_tie_break: i64,
    pub max_tie_break: i64,
    /// Weight of an edge touching a player pulled up from a lower bracket.
    pub promoted_weight: i64,
    /// Weight of a repeat pairing, only used when nothing else is possible.
    pub repeat_weight: i64,
    /// Give the bye to a player who hasn't had one whenever possible.
    pub avoid_repeat_byes: bool,
    /// Fixes the tie-break weights, so pairings can be reproduced.
    pub seed: Option<u64>,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_bracket_size: MAX_BRACKET_SIZE,
            rate_floor: RATE_FLOOR,
            min_tie_break: 1,
            max_tie_break: 9,
            promoted_weight: 10,
            repeat_weight: -100,
            avoid_repeat_byes: true,
            seed: None,
        }
    }
}

impl PairingConfig {
    /// # Errors
    ///
    /// If the file can't be read or isn't a valid RON config.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let string = fs::read_to_string(path)?;
        let mut config: Self = ron::from_str(&string)?;
        config.max_bracket_size = config.max_bracket_size.max(2);
        if config.max_tie_break < config.min_tie_break {
            config.max_tie_break = config.min_tie_break;
        }

        Ok(config)
    }

    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

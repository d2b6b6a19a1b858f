//! Discrete spread position with hysteresis.

use serde::{Deserialize, Serialize};

/// Position in the spread `y - β·x`. Long spread is long `y`, short `x`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum SpreadPosition {
    Short,
    #[default]
    Flat,
    Long,
}

impl SpreadPosition {
    /// Transition on today's z-score.
    ///
    /// Flat enters long below `-entry_z` and short above `entry_z`; an open
    /// position exits only once `|z|` drops below `exit_z`. Anything else
    /// keeps the current position.
    pub fn next(self, z: f64, entry_z: f64, exit_z: f64) -> Self {
        match self {
            SpreadPosition::Flat if z < -entry_z => SpreadPosition::Long,
            SpreadPosition::Flat if z > entry_z => SpreadPosition::Short,
            SpreadPosition::Flat => SpreadPosition::Flat,
            _ if z.abs() < exit_z => SpreadPosition::Flat,
            open => open,
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            SpreadPosition::Short => -1,
            SpreadPosition::Flat => 0,
            SpreadPosition::Long => 1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.as_i8())
    }

    pub fn is_flat(self) -> bool {
        self == SpreadPosition::Flat
    }
}

impl From<SpreadPosition> for i8 {
    fn from(pos: SpreadPosition) -> Self {
        pos.as_i8()
    }
}

impl TryFrom<i8> for SpreadPosition {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(SpreadPosition::Short),
            0 => Ok(SpreadPosition::Flat),
            1 => Ok(SpreadPosition::Long),
            other => Err(format!("spread position must be -1, 0 or 1, got {other}")),
        }
    }
}

//! Difficulty Tiers
//!
//! Each tier fixes how fast playback starts and how quickly it speeds up.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

/// Playback timing for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultySetting {
    /// Step length at round 0 (ms).
    pub base_delay_ms: u32,
    /// Step length removed per round (ms).
    pub speed_increase_per_round: u32,
    /// Cap on the total removed (ms).
    pub max_speed_increase_ms: u32,
}

/// Timing table, indexed by `Difficulty as usize`.
pub const DIFFICULTY_SETTINGS: [DifficultySetting; 3] = [
    // Easy
    DifficultySetting { base_delay_ms: 800, speed_increase_per_round: 15, max_speed_increase_ms: 300 },
    // Normal
    DifficultySetting { base_delay_ms: 600, speed_increase_per_round: 20, max_speed_increase_ms: 300 },
    // Hard
    DifficultySetting { base_delay_ms: 450, speed_increase_per_round: 25, max_speed_increase_ms: 250 },
];

/// Difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
#[derive(Default)]
pub enum Difficulty {
    /// Slow playback, gentle speed-up
    Easy = 0,
    /// Standard pacing
    #[default]
    Normal = 1,
    /// Fast playback; also the daily challenge tier
    Hard = 2,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Timing for this tier.
    #[inline]
    pub fn setting(self) -> DifficultySetting {
        DIFFICULTY_SETTINGS[self as usize]
    }

    /// Lowercase tier name.
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

//! Game Events
//!
//! Every transition appends an event to the run. The session driver
//! broadcasts them; tests read them back with `take_events`.

use serde::{Serialize, Deserialize};

use crate::core::color::Color;
use crate::game::difficulty::Difficulty;
use crate::game::state::{Category, RunId};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// A new run started
    RunStarted {
        run_id: RunId,
        difficulty: Difficulty,
        daily_seed: Option<String>,
    },

    /// A color was appended and playback scheduled
    RoundStarted {
        round: u32,
        delay_ms: u32,
    },

    /// One playback step flashed a pad
    PadFlashed {
        index: usize,
        color: Color,
        duration_ms: u32,
    },

    /// Playback finished; input is accepted
    PlayerTurnStarted {
        round: u32,
    },

    /// A correct pick that did not finish the round
    InputAccepted {
        index: usize,
        color: Color,
    },

    /// The whole sequence was reproduced
    RoundCompleted {
        round: u32,
        score_delta: u32,
        score: u32,
        combo: u32,
    },

    /// The category's best score was raised
    HighScoreBeaten {
        category: Category,
        score: u32,
    },

    /// A wrong pick ended the run
    GameOver {
        round: u32,
        score: u32,
        max_combo: u32,
        expected: Color,
        actual: Color,
    },

    /// The run was abandoned and the board returned to idle
    Reset,
}

/// A game event stamped with scheduler time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Scheduler time when the event occurred (ms)
    pub at_ms: u64,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(at_ms: u64, data: GameEventData) -> Self {
        Self { at_ms, data }
    }

    /// Is this the end of a run?
    pub fn is_game_over(&self) -> bool {
        matches!(self.data, GameEventData::GameOver { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let event = GameEvent::new(
            1500,
            GameEventData::PadFlashed { index: 0, color: Color::Red, duration_ms: 290 },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["at_ms"], 1500);
        assert_eq!(json["data"]["type"], "pad_flashed");
        assert_eq!(json["data"]["color"], "red");
    }

    #[test]
    fn test_is_game_over() {
        let over = GameEvent::new(
            0,
            GameEventData::GameOver {
                round: 3,
                score: 2,
                max_combo: 2,
                expected: Color::Blue,
                actual: Color::Green,
            },
        );
        assert!(over.is_game_over());
        assert!(!GameEvent::new(0, GameEventData::Reset).is_game_over());
    }
}

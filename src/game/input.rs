//! Round State Machine
//!
//! Validates pad presses one at a time against the target sequence.
//!
//! ```text
//! Idle ──start──▶ Watching ──playback done──▶ PlayerTurn
//!                    ▲                          │  │
//!                    └──── RoundComplete ───────┘  │ Mismatch
//!                                                  ▼
//!                                               GameOver
//! ```
//!
//! Presses outside `PlayerTurn` are dropped without touching the state;
//! nothing is queued for later.

use crate::core::color::Color;
use crate::game::events::GameEventData;
use crate::game::scoring::{on_mismatch, on_round_complete};
use crate::game::state::{Phase, RunState};

/// Result of one pad press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    /// Not the player's turn; nothing changed.
    Ignored,
    /// Correct so far; keep going.
    Continue,
    /// Sequence reproduced; run is back in `Watching`.
    RoundComplete {
        /// Points awarded for the round
        score_delta: u32,
    },
    /// Wrong pad; run is over.
    Mismatch {
        /// Pad that should have been pressed
        expected: Color,
        /// Pad that was pressed
        actual: Color,
    },
}

/// Apply one pad press.
pub fn submit_input(state: &mut RunState, color: Color) -> InputOutcome {
    if !state.accepts_input() {
        return InputOutcome::Ignored;
    }

    let index = state.player_sequence.len();
    let Some(&expected) = state.sequence.get(index) else {
        // Attempt already as long as the target
        return InputOutcome::Ignored;
    };

    state.player_sequence.push(color);

    if color != expected {
        on_mismatch(state);
        state.phase = Phase::GameOver;
        state.push_event(GameEventData::GameOver {
            round: state.round,
            score: state.score,
            max_combo: state.max_combo,
            expected,
            actual: color,
        });
        return InputOutcome::Mismatch { expected, actual: color };
    }

    if state.player_sequence.len() < state.sequence.len() {
        state.push_event(GameEventData::InputAccepted { index, color });
        return InputOutcome::Continue;
    }

    let score_delta = on_round_complete(state);
    state.phase = Phase::Watching;
    state.push_event(GameEventData::RoundCompleted {
        round: state.round,
        score_delta,
        score: state.score,
        combo: state.combo,
    });
    InputOutcome::RoundComplete { score_delta }
}

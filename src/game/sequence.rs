//! Sequence Engine
//!
//! Grows the target sequence by one color per round and produces the
//! playback plan the UI renders step by step.
//!
//! ## Timing
//!
//! ```text
//! |-- lead-in --|-- gap --|-- gap --| ... |-- gap --| player turn
//!               ^ flash   ^ flash             ^ flash
//! ```
//!
//! Every step of a round uses the same gap:
//! `max(min_delay, base - min(round * increase, max_increase))`,
//! and each pad stays lit for half of it.

use serde::{Serialize, Deserialize};

use crate::core::color::Color;
use crate::game::difficulty::DifficultySetting;
use crate::game::events::GameEventData;
use crate::game::state::{Phase, RunId, RunState};

/// Silence before the first flash of a round (ms).
pub const LEAD_IN_MS: u32 = 500;

/// Shortest gap playback may reach (ms).
pub const MIN_DELAY_MS: u32 = 100;

/// Playback timing knobs that are not per-tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Silence before the first flash (ms).
    pub lead_in_ms: u32,
    /// Floor for the per-step gap (ms).
    pub min_delay_ms: u32,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            lead_in_ms: LEAD_IN_MS,
            min_delay_ms: MIN_DELAY_MS,
        }
    }
}

/// One flash of the playback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStep {
    /// Pad to flash
    pub color: Color,
    /// How long the pad stays lit (ms)
    pub flash_ms: u32,
    /// Time from this flash to the next step (ms)
    pub gap_ms: u32,
}

/// Everything the UI needs to play one round back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackPlan {
    /// Run this plan belongs to
    pub run_id: RunId,
    /// Round number (1-based)
    pub round: u32,
    /// Silence before the first step (ms)
    pub lead_in_ms: u32,
    /// Gap used by every step (ms)
    pub delay_ms: u32,
    /// One step per sequence element, in order
    pub steps: Vec<PlaybackStep>,
}

impl PlaybackPlan {
    /// Offset of each step's flash from the start of the round (ms).
    pub fn step_offsets(&self) -> impl Iterator<Item = (u64, &PlaybackStep)> + '_ {
        let mut offset = self.lead_in_ms as u64;
        self.steps.iter().map(move |step| {
            let at = offset;
            offset += step.gap_ms as u64;
            (at, step)
        })
    }

    /// Offset at which the player turn begins (ms).
    pub fn total_ms(&self) -> u64 {
        self.lead_in_ms as u64 + self.steps.iter().map(|s| s.gap_ms as u64).sum::<u64>()
    }
}

/// Gap between steps for a given round.
pub fn round_delay(setting: &DifficultySetting, round: u32, min_delay_ms: u32) -> u32 {
    let speed_up = round
        .saturating_mul(setting.speed_increase_per_round)
        .min(setting.max_speed_increase_ms);
    setting
        .base_delay_ms
        .saturating_sub(speed_up)
        .max(min_delay_ms)
        .max(1)
}

/// How long a pad stays lit for a given gap.
#[inline]
pub fn flash_duration(delay_ms: u32) -> u32 {
    delay_ms / 2
}

/// Start the next round.
///
/// Appends one color, bumps `round`, enters `Watching` and returns the
/// playback plan. Timing uses the round number after the increment.
pub fn advance_round(state: &mut RunState, timing: &PlaybackTiming) -> PlaybackPlan {
    let position = state.sequence.len();
    let color = state.rng.next_color(position);
    state.sequence.push(color);
    state.round += 1;
    state.phase = Phase::Watching;
    state.player_sequence.clear();

    let delay_ms = round_delay(&state.difficulty.setting(), state.round, timing.min_delay_ms);
    let flash_ms = flash_duration(delay_ms);

    let steps = state
        .sequence
        .iter()
        .map(|&color| PlaybackStep { color, flash_ms, gap_ms: delay_ms })
        .collect();

    state.push_event(GameEventData::RoundStarted { round: state.round, delay_ms });

    PlaybackPlan {
        run_id: state.id,
        round: state.round,
        lead_in_ms: timing.lead_in_ms,
        delay_ms,
        steps,
    }
}

/// Playback finished: clear the attempt and accept input.
///
/// Returns false (and changes nothing) unless the run is `Watching`.
pub fn begin_player_turn(state: &mut RunState) -> bool {
    if state.phase != Phase::Watching {
        return false;
    }
    state.player_sequence.clear();
    state.phase = Phase::PlayerTurn;
    state.push_event(GameEventData::PlayerTurnStarted { round: state.round });
    true
}

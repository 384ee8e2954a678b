//! Game Logic Module
//!
//! Pure transitions over `RunState`. No timers, no I/O.
//!
//! ## Module Structure
//!
//! - `difficulty`: Tier table
//! - `state`: Run state, phases, categories
//! - `sequence`: Round growth and playback plans
//! - `input`: Player input validation
//! - `scoring`: Score deltas, combos, high scores
//! - `events`: Transition log

pub mod difficulty;
pub mod state;
pub mod sequence;
pub mod input;
pub mod scoring;
pub mod events;

// Re-export key types
pub use difficulty::{Difficulty, DifficultySetting};
pub use state::{RunState, RunId, Phase, Category, ParseCategoryError, current_category};
pub use sequence::{PlaybackPlan, PlaybackStep, PlaybackTiming, advance_round, begin_player_turn, round_delay};
pub use input::{InputOutcome, submit_input};
pub use scoring::HighScoreTable;
pub use events::{GameEvent, GameEventData};

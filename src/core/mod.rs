//! Core primitives.
//!
//! Pad colors, color sources and the wall clock. Nothing in here knows
//! about rounds, scores or phases.

pub mod color;
pub mod rng;
pub mod clock;

// Re-export core types
pub use color::{Color, COLOR_COUNT, ERROR_TONE_HZ};
pub use rng::{ColorRng, daily_color};
pub use clock::{Clock, SystemClock, FixedClock, date_key};

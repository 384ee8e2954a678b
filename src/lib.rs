//! # Chroma Recall
//!
//! Engine for a four-pad color-sequence memory game: watch the pads
//! flash, repeat the sequence, survive as many rounds as you can.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CHROMA RECALL                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── color.rs    - Pads, tones                               │
//! │  ├── rng.rs      - Uniform and daily color sources           │
//! │  └── clock.rs    - Wall clock and daily keys                 │
//! │                                                              │
//! │  game/           - Pure transitions over RunState            │
//! │  ├── difficulty.rs - Tier timing table                       │
//! │  ├── state.rs    - Run state, phases, categories             │
//! │  ├── sequence.rs - Round growth and playback plans           │
//! │  ├── input.rs    - Input validation                          │
//! │  ├── scoring.rs  - Combos and high scores                    │
//! │  └── events.rs   - Transition log                            │
//! │                                                              │
//! │  leaderboard/    - Qualification and async backend           │
//! │  persistence/    - High scores and preferences               │
//! │                                                              │
//! │  session/        - Timers and collaborators                  │
//! │  ├── scheduler.rs  - Virtual-time task queue                 │
//! │  ├── renderer.rs   - Output seam                             │
//! │  ├── controller.rs - Run orchestration                       │
//! │  └── driver.rs     - Tokio event loop                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `game/` never reads a clock and never touches I/O. Given the same
//! color source and the same inputs, a run produces the same sequence,
//! score and event log. The daily challenge derives its colors from the
//! local date alone, so every player gets the same sequence that day.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod leaderboard;
pub mod persistence;
pub mod session;

// Re-export commonly used types
pub use core::color::Color;
pub use core::rng::ColorRng;
pub use game::difficulty::Difficulty;
pub use game::state::{RunState, Phase, Category, RunId};
pub use session::{SessionController, SessionConfig, SessionDriver, Command};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

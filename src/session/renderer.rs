//! Renderer Seam
//!
//! Visual and audio output. The engine calls these fire-and-forget and
//! never waits on them.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::color::{Color, ERROR_TONE_HZ};
use crate::game::state::Category;
use crate::leaderboard::LeaderboardEntry;

/// Style tag for status text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStyle {
    /// Idle prompt
    Neutral,
    /// Playback in progress
    Watching,
    /// Player's turn
    Playing,
    /// Mistake
    Error,
}

/// Short sound cue outside of pad flashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Round completed
    Success,
    /// Wrong pad
    Error,
}

impl Cue {
    /// Base frequency of the cue (Hz).
    pub fn tone_hz(self) -> f32 {
        match self {
            Cue::Success => Color::Red.tone_hz(),
            Cue::Error => ERROR_TONE_HZ,
        }
    }
}

/// Output side of the game.
pub trait Renderer {
    /// Light a pad and play its tone.
    fn flash(&mut self, color: Color, duration_ms: u32);

    /// Enable or disable pad presses in the UI.
    fn set_pads_enabled(&mut self, enabled: bool);

    /// Replace the status line.
    fn show_status(&mut self, text: &str, style: StatusStyle);

    /// Play a sound cue.
    fn cue(&mut self, _cue: Cue) {}

    /// Current score and the category's best.
    fn show_score(&mut self, _score: u32, _high_score: u32) {}

    /// End-of-run summary.
    fn show_game_over(&mut self, _score: u32) {}

    /// Ask for a leaderboard name.
    fn prompt_for_name(&mut self, _category: Category, _score: u32) {}

    /// Reject a name (blank) with a transient cue; the prompt stays open.
    fn reject_name(&mut self) {}

    /// Show a category's board.
    fn show_leaderboard(&mut self, _category: Category, _entries: &[LeaderboardEntry]) {}
}

/// Renderer that writes everything to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingRenderer;

impl Renderer for TracingRenderer {
    fn flash(&mut self, color: Color, duration_ms: u32) {
        debug!("Flash {} for {}ms ({:.2} Hz)", color, duration_ms, color.tone_hz());
    }

    fn set_pads_enabled(&mut self, enabled: bool) {
        debug!("Pads {}", if enabled { "enabled" } else { "disabled" });
    }

    fn show_status(&mut self, text: &str, style: StatusStyle) {
        info!("[{:?}] {}", style, text);
    }

    fn cue(&mut self, cue: Cue) {
        debug!("Cue {:?} ({:.2} Hz)", cue, cue.tone_hz());
    }

    fn show_score(&mut self, score: u32, high_score: u32) {
        debug!("Score {} (best {})", score, high_score);
    }

    fn show_game_over(&mut self, score: u32) {
        info!("Final score: {}", score);
    }

    fn prompt_for_name(&mut self, category: Category, score: u32) {
        info!("New {} leaderboard score {}! Enter your name", category, score);
    }

    fn reject_name(&mut self) {
        info!("Name must not be blank");
    }

    fn show_leaderboard(&mut self, category: Category, entries: &[LeaderboardEntry]) {
        info!("=== {} leaderboard ===", category);
        for (rank, entry) in entries.iter().enumerate() {
            info!("#{}: {} - {}", rank + 1, entry.name, entry.score);
        }
    }
}

/// Renderer that records calls, for tests.
#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    /// One recorded call.
    #[derive(Clone, Debug, PartialEq)]
    pub enum RenderCall {
        Flash(Color, u32),
        PadsEnabled(bool),
        Status(String, StatusStyle),
        Cue(Cue),
        Score(u32, u32),
        GameOver(u32),
        PromptName(Category, u32),
        RejectName,
        Leaderboard(Category, usize),
    }

    #[derive(Clone, Debug, Default)]
    pub struct RecordingRenderer {
        pub calls: Vec<RenderCall>,
    }

    impl RecordingRenderer {
        pub fn flashes(&self) -> Vec<(Color, u32)> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    RenderCall::Flash(color, ms) => Some((*color, *ms)),
                    _ => None,
                })
                .collect()
        }

        pub fn last_status(&self) -> Option<(&str, StatusStyle)> {
            self.calls.iter().rev().find_map(|c| match c {
                RenderCall::Status(text, style) => Some((text.as_str(), *style)),
                _ => None,
            })
        }

        pub fn pads_enabled(&self) -> Option<bool> {
            self.calls.iter().rev().find_map(|c| match c {
                RenderCall::PadsEnabled(enabled) => Some(*enabled),
                _ => None,
            })
        }

        pub fn clear(&mut self) {
            self.calls.clear();
        }
    }

    impl Renderer for RecordingRenderer {
        fn flash(&mut self, color: Color, duration_ms: u32) {
            self.calls.push(RenderCall::Flash(color, duration_ms));
        }

        fn set_pads_enabled(&mut self, enabled: bool) {
            self.calls.push(RenderCall::PadsEnabled(enabled));
        }

        fn show_status(&mut self, text: &str, style: StatusStyle) {
            self.calls.push(RenderCall::Status(text.to_string(), style));
        }

        fn cue(&mut self, cue: Cue) {
            self.calls.push(RenderCall::Cue(cue));
        }

        fn show_score(&mut self, score: u32, high_score: u32) {
            self.calls.push(RenderCall::Score(score, high_score));
        }

        fn show_game_over(&mut self, score: u32) {
            self.calls.push(RenderCall::GameOver(score));
        }

        fn prompt_for_name(&mut self, category: Category, score: u32) {
            self.calls.push(RenderCall::PromptName(category, score));
        }

        fn reject_name(&mut self) {
            self.calls.push(RenderCall::RejectName);
        }

        fn show_leaderboard(&mut self, category: Category, entries: &[LeaderboardEntry]) {
            self.calls.push(RenderCall::Leaderboard(category, entries.len()));
        }
    }
}

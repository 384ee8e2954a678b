//! Leaderboard
//!
//! Qualification rules plus the async backend seam. Failures here never
//! reach the run state: the worst case is "no entries" or "not submitted".

pub mod qualify;
pub mod backend;

pub use qualify::{qualifies, LeaderboardEntry, PlayerName, LEADERBOARD_SIZE, MAX_NAME_CHARS};
pub use backend::{LeaderboardBackend, LeaderboardClient, InMemoryLeaderboard};

use crate::game::state::Category;

/// Leaderboard errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaderboardError {
    /// Name was empty after trimming.
    #[error("name must not be blank")]
    BlankName,

    /// Score no longer beats the board.
    #[error("score {score} does not qualify for the {category} leaderboard")]
    NotQualified {
        /// Board the score was submitted to.
        category: Category,
        /// Rejected score.
        score: u32,
    },

    /// Backend could not be reached.
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
}

//! Leaderboard Qualification
//!
//! Decides whether a finished run earns a name prompt. Pure functions;
//! fetching and storing entries is the backend's job.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::leaderboard::LeaderboardError;

/// Entries kept per category.
pub const LEADERBOARD_SIZE: usize = 10;

/// Longest name stored, in characters.
pub const MAX_NAME_CHARS: usize = 16;

/// A submitted score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Display name
    pub name: String,
    /// Final score of the run
    pub score: u32,
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
}

impl LeaderboardEntry {
    /// Create an entry from a validated name.
    pub fn new(name: PlayerName, score: u32, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into_inner(),
            score,
            timestamp,
        }
    }
}

/// A non-blank display name, trimmed and capped at `MAX_NAME_CHARS`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerName(String);

impl PlayerName {
    /// Validate a raw name.
    pub fn parse(raw: &str) -> Result<Self, LeaderboardError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LeaderboardError::BlankName);
        }
        let name: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
        Ok(Self(name.trim_end().to_string()))
    }

    /// The validated name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Does `score` earn a place among `top`?
///
/// `top` is the board of the run's category, best first; boards are
/// per category, so the caller picks the category by fetching its board.
/// Only the first `LEADERBOARD_SIZE` entries are considered. A board
/// with fewer entries takes any positive score; a full one needs a score
/// above its lowest entry. A zero score never qualifies.
pub fn qualifies(score: u32, top: &[LeaderboardEntry]) -> bool {
    if score == 0 {
        return false;
    }
    let top = &top[..top.len().min(LEADERBOARD_SIZE)];
    if top.len() < LEADERBOARD_SIZE {
        return true;
    }
    match top.iter().map(|e| e.score).min() {
        Some(lowest) => score > lowest,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(scores: &[u32]) -> Vec<LeaderboardEntry> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| LeaderboardEntry {
                name: format!("p{}", i),
                score,
                timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            })
            .collect()
    }

    #[test]
    fn test_full_board() {
        let top = board(&[100, 90, 80, 70, 60, 50, 40, 30, 20, 10]);
        assert!(qualifies(50, &top));
        assert!(qualifies(11, &top));
        assert!(qualifies(150, &top));
        assert!(!qualifies(10, &top));
        assert!(!qualifies(3, &top));
    }

    #[test]
    fn test_full_board_above_score() {
        let top = board(&[150, 140, 130, 120, 110, 100, 90, 80, 70, 60]);
        assert!(!qualifies(50, &top));
        assert!(!qualifies(60, &top));
        assert!(qualifies(61, &top));
    }

    #[test]
    fn test_partial_board() {
        let top = board(&[100, 90, 80]);
        assert!(qualifies(1, &top));
        assert!(qualifies(1, &[]));
    }

    #[test]
    fn test_zero_never_qualifies() {
        assert!(!qualifies(0, &[]));
        assert!(!qualifies(0, &board(&[0, 0])));
    }

    #[test]
    fn test_oversized_board_uses_top_ten() {
        let top = board(&[100, 90, 80, 70, 60, 50, 40, 30, 20, 10, 5, 1]);
        assert!(!qualifies(6, &top));
        assert!(qualifies(11, &top));
    }

    #[test]
    fn test_name_validation() {
        assert_eq!(PlayerName::parse("   "), Err(LeaderboardError::BlankName));
        assert_eq!(PlayerName::parse("").unwrap_err(), LeaderboardError::BlankName);
        assert_eq!(PlayerName::parse("  ada ").unwrap().as_str(), "ada");

        let long = PlayerName::parse("abcdefghijklmnopqrstuvwxyz").unwrap();
        assert_eq!(long.as_str().chars().count(), MAX_NAME_CHARS);
    }
}

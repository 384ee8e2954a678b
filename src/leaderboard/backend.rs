//! Leaderboard Backend
//!
//! The backend is the only genuinely asynchronous, fallible collaborator.
//! `LeaderboardClient` wraps it with the local recovery rules: a failed
//! fetch reads as an empty board, a failed submit is retried once.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::game::state::Category;
use crate::leaderboard::qualify::{qualifies, LeaderboardEntry, PlayerName, LEADERBOARD_SIZE};
use crate::leaderboard::LeaderboardError;

/// Remote score store.
pub trait LeaderboardBackend: Send + Sync + 'static {
    /// Store an entry under a category.
    fn submit_entry(
        &self,
        category: Category,
        entry: LeaderboardEntry,
    ) -> impl Future<Output = Result<(), LeaderboardError>> + Send;

    /// Best `limit` entries of a category, best first.
    fn fetch_top(
        &self,
        category: Category,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, LeaderboardError>> + Send;
}

// =============================================================================
// IN-MEMORY BACKEND
// =============================================================================

/// Backend that keeps every entry in memory.
///
/// Entries are ordered by score (descending), ties by earlier timestamp.
/// Each board keeps only its best `LEADERBOARD_SIZE` entries.
#[derive(Default)]
pub struct InMemoryLeaderboard {
    boards: RwLock<BTreeMap<Category, Vec<LeaderboardEntry>>>,
}

impl InMemoryLeaderboard {
    /// Create an empty leaderboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all categories.
    pub async fn entry_count(&self) -> usize {
        let boards = self.boards.read().await;
        boards.values().map(Vec::len).sum()
    }
}

impl LeaderboardBackend for InMemoryLeaderboard {
    fn submit_entry(
        &self,
        category: Category,
        entry: LeaderboardEntry,
    ) -> impl Future<Output = Result<(), LeaderboardError>> + Send {
        async move {
            let mut boards = self.boards.write().await;
            let board = boards.entry(category).or_default();
            board.push(entry);
            board.sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp.cmp(&b.timestamp)));
            board.truncate(LEADERBOARD_SIZE);
            Ok(())
        }
    }

    fn fetch_top(
        &self,
        category: Category,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, LeaderboardError>> + Send {
        async move {
            let boards = self.boards.read().await;
            Ok(boards
                .get(&category)
                .map(|board| board.iter().take(limit).cloned().collect())
                .unwrap_or_default())
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Backend wrapper applying the recovery rules.
pub struct LeaderboardClient<B> {
    backend: Arc<B>,
}

impl<B> Clone for LeaderboardClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: LeaderboardBackend> LeaderboardClient<B> {
    /// Wrap a backend.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Top entries of a category; empty if the backend fails.
    pub async fn fetch_top_or_empty(&self, category: Category) -> Vec<LeaderboardEntry> {
        match self.backend.fetch_top(category, LEADERBOARD_SIZE).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Leaderboard fetch for {} failed: {}", category, e);
                Vec::new()
            }
        }
    }

    /// Does `score` qualify for the category's board?
    pub async fn check(&self, category: Category, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        let top = self.fetch_top_or_empty(category).await;
        qualifies(score, &top)
    }

    /// Validate the name, confirm the score still qualifies and submit.
    ///
    /// A failed submit is retried once before giving up.
    pub async fn submit(
        &self,
        category: Category,
        raw_name: &str,
        score: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<LeaderboardEntry, LeaderboardError> {
        let name = PlayerName::parse(raw_name)?;

        if !self.check(category, score).await {
            return Err(LeaderboardError::NotQualified { category, score });
        }

        let entry = LeaderboardEntry::new(name, score, timestamp);
        if let Err(e) = self.backend.submit_entry(category, entry.clone()).await {
            warn!("Leaderboard submit failed, retrying: {}", e);
            self.backend.submit_entry(category, entry.clone()).await?;
        }

        debug!("Submitted {} to {} leaderboard", entry.score, category);
        Ok(entry)
    }
}

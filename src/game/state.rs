//! Run State Definitions
//!
//! One `RunState` exists per active game. It is created at game start,
//! mutated only through the transition functions in `game/`, and
//! replaced wholesale on the next start or reset.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

use crate::core::color::Color;
use crate::core::rng::ColorRng;
use crate::game::difficulty::Difficulty;
use crate::game::events::{GameEvent, GameEventData};

// =============================================================================
// RUN ID
// =============================================================================

/// Unique run identifier (UUID v4).
///
/// Scheduled tasks and leaderboard lookups carry the id of the run that
/// created them, so work belonging to a superseded run can be dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Id used before any run has started.
    pub const fn nil() -> Self {
        Self(uuid::Uuid::nil())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Where the run is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum Phase {
    /// No run in progress
    #[default]
    Idle,
    /// Sequence playback; input rejected
    Watching,
    /// Player reproduces the sequence
    PlayerTurn,
    /// A mistake ended the run
    GameOver,
}

impl Phase {
    /// Is a run in progress (selection locked)?
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Watching | Phase::PlayerTurn)
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// High-score and leaderboard bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Easy tier
    Easy,
    /// Normal tier
    Normal,
    /// Hard tier
    Hard,
    /// Daily challenge, regardless of tier
    Daily,
}

impl Category {
    /// All categories.
    pub const ALL: [Category; 4] = [Category::Easy, Category::Normal, Category::Hard, Category::Daily];

    /// Storage key.
    pub fn name(self) -> &'static str {
        match self {
            Category::Easy => "easy",
            Category::Normal => "normal",
            Category::Hard => "hard",
            Category::Daily => "daily",
        }
    }

    /// Category of a run.
    pub fn for_run(difficulty: Difficulty, is_daily_challenge: bool) -> Self {
        if is_daily_challenge {
            Category::Daily
        } else {
            difficulty.into()
        }
    }
}

impl From<Difficulty> for Category {
    fn from(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Category::Easy,
            Difficulty::Normal => Category::Normal,
            Difficulty::Hard => Category::Hard,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

// =============================================================================
// RUN STATE
// =============================================================================

/// State of a single run.
#[derive(Clone, Debug)]
pub struct RunState {
    /// Unique run id
    pub id: RunId,

    /// Accumulated score (never decreases within a run)
    pub score: u32,

    /// Rounds started so far
    pub round: u32,

    /// Consecutive fully-correct rounds
    pub combo: u32,

    /// Best combo of this run
    pub max_combo: u32,

    /// Effective tier of this run
    pub difficulty: Difficulty,

    /// Is this the daily challenge?
    pub is_daily_challenge: bool,

    /// Date key seeding the daily sequence
    pub daily_seed: Option<String>,

    /// Lifecycle phase
    pub phase: Phase,

    /// Target sequence
    pub sequence: Vec<Color>,

    /// Player's attempt at the current round
    pub player_sequence: Vec<Color>,

    /// Color source
    pub rng: ColorRng,

    /// Scheduler time used to stamp events (ms)
    pub now_ms: u64,

    /// Events since the last `take_events`
    events: Vec<GameEvent>,
}

impl RunState {
    /// Fresh run with the given tier and color source.
    ///
    /// The run starts in `Idle`; `advance_round` moves it to `Watching`.
    pub fn new(difficulty: Difficulty, rng: ColorRng) -> Self {
        let daily_seed = match &rng {
            ColorRng::Daily(seed) => Some(seed.clone()),
            ColorRng::Uniform(_) => None,
        };

        Self {
            id: RunId::new(),
            score: 0,
            round: 0,
            combo: 0,
            max_combo: 0,
            difficulty,
            is_daily_challenge: daily_seed.is_some(),
            daily_seed,
            phase: Phase::Idle,
            sequence: Vec::new(),
            player_sequence: Vec::new(),
            rng,
            now_ms: 0,
            events: Vec::new(),
        }
    }

    /// Daily challenge run for the given date key.
    pub fn daily(seed: impl Into<String>, difficulty: Difficulty) -> Self {
        Self::new(difficulty, ColorRng::daily(seed))
    }

    /// High-score and leaderboard bucket of this run.
    #[inline]
    pub fn category(&self) -> Category {
        current_category(self)
    }

    /// Are pad presses accepted right now?
    #[inline]
    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::PlayerTurn
    }

    /// Record an event at the current scheduler time.
    pub fn push_event(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.now_ms, data));
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// `"daily"` for the daily challenge, otherwise the run's tier.
pub fn current_category(state: &RunState) -> Category {
    Category::for_run(state.difficulty, state.is_daily_challenge)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_is_idle_and_empty() {
        let state = RunState::new(Difficulty::Easy, ColorRng::seeded(1));
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.round, 0);
        assert!(state.sequence.is_empty());
        assert!(!state.is_daily_challenge);
        assert_eq!(state.category(), Category::Easy);
    }

    #[test]
    fn test_daily_category() {
        let state = RunState::daily("2024-1-15", Difficulty::Hard);
        assert!(state.is_daily_challenge);
        assert_eq!(state.daily_seed.as_deref(), Some("2024-1-15"));
        assert_eq!(state.category(), Category::Daily);
    }

    #[test]
    fn test_run_ids_unique() {
        let a = RunState::new(Difficulty::Normal, ColorRng::seeded(1));
        let b = RunState::new(Difficulty::Normal, ColorRng::seeded(1));
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, RunId::nil());
    }

    #[test]
    fn test_events_drain() {
        let mut state = RunState::new(Difficulty::Normal, ColorRng::seeded(1));
        state.now_ms = 42;
        state.push_event(GameEventData::Reset);

        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at_ms, 42);
        assert!(state.take_events().is_empty());
    }

    #[test]
    fn test_category_names() {
        for category in Category::ALL {
            assert_eq!(category.name().parse::<Category>(), Ok(category));
        }
        assert_eq!(
            "weekly".parse::<Category>(),
            Err(ParseCategoryError("weekly".to_string()))
        );
    }

    #[test]
    fn test_phase_activity() {
        assert!(!Phase::Idle.is_active());
        assert!(Phase::Watching.is_active());
        assert!(Phase::PlayerTurn.is_active());
        assert!(!Phase::GameOver.is_active());
    }
}

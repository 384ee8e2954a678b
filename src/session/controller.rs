//! Session Controller
//!
//! Owns the single `RunState`, the scheduler holding its pending timers,
//! and the collaborators (renderer, persistence, clock). Every entry
//! point is synchronous; time moves only through `advance` /
//! `advance_to`, which run whatever the scheduler has due.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::core::clock::{Clock, SystemClock};
use crate::core::color::Color;
use crate::core::rng::ColorRng;
use crate::game::difficulty::{Difficulty, ParseDifficultyError};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::{submit_input, InputOutcome};
use crate::game::scoring::HighScoreTable;
use crate::game::sequence::{advance_round, begin_player_turn, PlaybackTiming, LEAD_IN_MS, MIN_DELAY_MS};
use crate::game::state::{Category, Phase, RunId, RunState};
use crate::persistence::{Persistence, PREF_DIFFICULTY, PREF_THEME};
use crate::session::renderer::{Cue, Renderer, StatusStyle};
use crate::session::scheduler::Scheduler;

/// Status shown while idle.
pub const STATUS_IDLE: &str = "Press Start to Begin";
/// Status shown during playback.
pub const STATUS_WATCH: &str = "Watch the sequence...";
/// Status shown on the player's turn.
pub const STATUS_YOUR_TURN: &str = "Your turn! Repeat the sequence";
/// Status shown after a completed round.
pub const STATUS_CORRECT: &str = "Correct! Get ready...";
/// Status shown after a mistake.
pub const STATUS_GAME_OVER: &str = "Game Over!";

// =============================================================================
// CONFIG
// =============================================================================

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Silence before the first flash of a round (ms).
    pub lead_in_ms: u32,
    /// Pause between a completed round and the next playback (ms).
    pub round_pacing_ms: u32,
    /// Pause between a mistake and the end-of-run summary (ms).
    pub game_over_delay_ms: u32,
    /// Flash length when echoing a player press (ms).
    pub input_flash_ms: u32,
    /// Floor for the playback gap (ms).
    pub min_delay_ms: u32,
    /// Tier forced for the daily challenge.
    pub daily_difficulty: Difficulty,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: LEAD_IN_MS,
            round_pacing_ms: 1500,
            game_over_delay_ms: 1000,
            input_flash_ms: 200,
            min_delay_ms: MIN_DELAY_MS,
            daily_difficulty: Difficulty::Hard,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    ///
    /// Missing or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            lead_in_ms: env_or("CHROMA_LEAD_IN_MS", defaults.lead_in_ms),
            round_pacing_ms: env_or("CHROMA_ROUND_PACING_MS", defaults.round_pacing_ms),
            game_over_delay_ms: env_or("CHROMA_GAME_OVER_DELAY_MS", defaults.game_over_delay_ms),
            input_flash_ms: env_or("CHROMA_INPUT_FLASH_MS", defaults.input_flash_ms),
            min_delay_ms: env_or("CHROMA_MIN_DELAY_MS", defaults.min_delay_ms),
            daily_difficulty: env_or("CHROMA_DAILY_DIFFICULTY", defaults.daily_difficulty),
        }
    }

    /// Playback timing derived from this config.
    pub fn playback_timing(&self) -> PlaybackTiming {
        PlaybackTiming {
            lead_in_ms: self.lead_in_ms,
            min_delay_ms: self.min_delay_ms,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

// =============================================================================
// ERRORS AND SUMMARIES
// =============================================================================

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A run is in progress.
    #[error("Run in progress")]
    RunActive,

    /// Requested tier does not exist.
    #[error("Unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

impl From<ParseDifficultyError> for SessionError {
    fn from(e: ParseDifficultyError) -> Self {
        SessionError::UnknownDifficulty(e.0)
    }
}

/// Result of a finished run, kept for the leaderboard flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Run that finished
    pub run_id: RunId,
    /// Leaderboard bucket
    pub category: Category,
    /// Final score
    pub score: u32,
    /// Rounds reached
    pub round: u32,
    /// Best combo
    pub max_combo: u32,
    /// When the run ended
    pub finished_at: DateTime<Utc>,
}

/// Delayed work owned by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Playback step.
    Flash {
        /// Owning run
        run_id: RunId,
        /// Position in the sequence
        index: usize,
        /// Pad to light
        color: Color,
        /// Lit duration (ms)
        duration_ms: u32,
    },
    /// Playback finished.
    BeginPlayerTurn {
        /// Owning run
        run_id: RunId,
    },
    /// Pacing pause after a completed round is over.
    NextRound {
        /// Owning run
        run_id: RunId,
    },
    /// Show the end-of-run summary.
    ShowGameOver {
        /// Owning run
        run_id: RunId,
    },
}

impl SessionAction {
    fn run_id(&self) -> RunId {
        match self {
            SessionAction::Flash { run_id, .. }
            | SessionAction::BeginPlayerTurn { run_id }
            | SessionAction::NextRound { run_id }
            | SessionAction::ShowGameOver { run_id } => *run_id,
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Orchestrates runs over the game transitions.
pub struct SessionController<P, R, C = SystemClock> {
    config: SessionConfig,
    persistence: P,
    renderer: R,
    clock: C,
    scheduler: Scheduler<SessionAction>,
    run: RunState,
    /// Tier the player picked; daily runs leave it untouched.
    selected: Difficulty,
    high_scores: HighScoreTable,
    last_summary: Option<RunSummary>,
    events: Vec<GameEvent>,
    rng_seed: Option<u64>,
    runs_started: u64,
}

impl<P: Persistence, R: Renderer, C: Clock> SessionController<P, R, C> {
    /// Create a controller, loading high scores and the saved tier.
    pub fn new(config: SessionConfig, persistence: P, renderer: R, clock: C) -> Self {
        let high_scores = persistence.load_high_scores();
        let selected = persistence
            .load_preference(PREF_DIFFICULTY)
            .and_then(|raw| match raw.parse::<Difficulty>() {
                Ok(difficulty) => Some(difficulty),
                Err(e) => {
                    warn!("Ignoring saved preference: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let mut controller = Self {
            config,
            persistence,
            renderer,
            clock,
            scheduler: Scheduler::new(),
            run: RunState::new(selected, ColorRng::uniform()),
            selected,
            high_scores,
            last_summary: None,
            events: Vec::new(),
            rng_seed: None,
            runs_started: 0,
        };
        controller.show_idle();
        controller
    }

    /// Seed normal-mode runs deterministically (replays, tests).
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current run.
    pub fn run(&self) -> &RunState {
        &self.run
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.run.phase
    }

    /// Tier the player selected.
    pub fn selected_difficulty(&self) -> Difficulty {
        self.selected
    }

    /// Tier in effect: the run's while one is active, else the selection.
    pub fn effective_difficulty(&self) -> Difficulty {
        if self.run.phase.is_active() {
            self.run.difficulty
        } else {
            self.selected
        }
    }

    /// Best scores per category.
    pub fn high_scores(&self) -> &HighScoreTable {
        &self.high_scores
    }

    /// Summary of the most recently finished run.
    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    /// Config in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Persistence store.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Scheduler time (ms).
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Time until the next scheduled task (ms).
    pub fn next_due_in(&self) -> Option<u64> {
        self.scheduler.next_due_in()
    }

    /// Absolute time of the next scheduled task (ms).
    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due_ms()
    }

    /// Pending timers.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    /// Drain events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.collect_events();
        std::mem::take(&mut self.events)
    }

    // -------------------------------------------------------------------------
    // Preferences
    // -------------------------------------------------------------------------

    /// Change the selected tier. Rejected while a run is active.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        if self.run.phase.is_active() {
            return Err(SessionError::RunActive);
        }
        self.selected = difficulty;
        if let Err(e) = self.persistence.save_preference(PREF_DIFFICULTY, difficulty.name()) {
            warn!("Failed to save difficulty preference: {}", e);
        }
        if self.run.phase == Phase::Idle {
            self.run.difficulty = difficulty;
        }
        Ok(())
    }

    /// Change the selected tier by name. Unknown names keep the current tier.
    pub fn select_difficulty_by_name(&mut self, name: &str) -> Result<Difficulty, SessionError> {
        let difficulty: Difficulty = name.parse()?;
        self.select_difficulty(difficulty)?;
        Ok(difficulty)
    }

    /// Saved theme name.
    pub fn theme(&self) -> Option<String> {
        self.persistence.load_preference(PREF_THEME)
    }

    /// Save the theme name.
    pub fn set_theme(&mut self, theme: &str) {
        if let Err(e) = self.persistence.save_preference(PREF_THEME, theme) {
            warn!("Failed to save theme preference: {}", e);
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start a normal run on `difficulty`.
    pub fn start_game(&mut self, difficulty: Difficulty) -> Result<RunId, SessionError> {
        self.select_difficulty(difficulty)?;

        let rng = match self.rng_seed {
            Some(seed) => ColorRng::seeded(seed.wrapping_add(self.runs_started)),
            None => ColorRng::uniform(),
        };
        Ok(self.begin_run(difficulty, rng))
    }

    /// Start today's daily challenge on the daily tier.
    ///
    /// The player's selected tier is left as it was and applies again
    /// once the run is over.
    pub fn start_daily_challenge(&mut self) -> Result<RunId, SessionError> {
        if self.run.phase.is_active() {
            return Err(SessionError::RunActive);
        }
        let seed = self.clock.today_key();
        Ok(self.begin_run(self.config.daily_difficulty, ColorRng::daily(seed)))
    }

    /// Abandon whatever is going on and return to idle.
    ///
    /// Pending timers are canceled. High scores and preferences are kept.
    pub fn reset_game(&mut self) {
        let canceled = self.scheduler.cancel_all();
        self.collect_events();

        let was_idle = self.run.phase == Phase::Idle;
        self.run = RunState::new(self.selected, ColorRng::uniform());
        self.run.now_ms = self.scheduler.now_ms();
        if !was_idle {
            self.run.push_event(GameEventData::Reset);
        }

        debug!("Reset ({} pending tasks canceled)", canceled);
        self.show_idle();
    }

    fn begin_run(&mut self, difficulty: Difficulty, rng: ColorRng) -> RunId {
        self.scheduler.cancel_all();
        self.collect_events();
        self.runs_started += 1;

        self.run = RunState::new(difficulty, rng);
        self.run.now_ms = self.scheduler.now_ms();
        self.run.push_event(GameEventData::RunStarted {
            run_id: self.run.id,
            difficulty,
            daily_seed: self.run.daily_seed.clone(),
        });

        info!(
            "Run {} started ({}{})",
            self.run.id,
            difficulty,
            self.run.daily_seed.as_deref().map(|s| format!(", daily {}", s)).unwrap_or_default()
        );

        let best = self.high_scores.get(self.run.category());
        self.renderer.show_score(0, best);
        self.start_round();
        self.run.id
    }

    fn start_round(&mut self) {
        self.run.now_ms = self.scheduler.now_ms();
        let plan = advance_round(&mut self.run, &self.config.playback_timing());
        debug!("Round {} ({}ms per step)", plan.round, plan.delay_ms);

        self.renderer.set_pads_enabled(false);
        self.renderer.show_status(STATUS_WATCH, StatusStyle::Watching);

        for (index, (offset, step)) in plan.step_offsets().enumerate() {
            self.scheduler.schedule_in(offset, SessionAction::Flash {
                run_id: plan.run_id,
                index,
                color: step.color,
                duration_ms: step.flash_ms,
            });
        }
        self.scheduler
            .schedule_in(plan.total_ms(), SessionAction::BeginPlayerTurn { run_id: plan.run_id });
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Handle a pad press. Ignored unless it is the player's turn.
    pub fn submit_input(&mut self, color: Color) -> InputOutcome {
        if !self.run.accepts_input() {
            #[cfg(feature = "debug-tracing")]
            debug!("Ignored {} in {:?}", color, self.run.phase);
            return InputOutcome::Ignored;
        }

        self.run.now_ms = self.scheduler.now_ms();
        let outcome = submit_input(&mut self.run, color);

        #[cfg(feature = "debug-tracing")]
        debug!("Input {} -> {:?}", color, outcome);

        match outcome {
            InputOutcome::Ignored => {}
            InputOutcome::Continue => {
                self.renderer.flash(color, self.config.input_flash_ms);
            }
            InputOutcome::RoundComplete { .. } => {
                self.renderer.flash(color, self.config.input_flash_ms);
                self.record_high_score();
                self.renderer
                    .show_score(self.run.score, self.high_scores.get(self.run.category()));
                self.renderer.set_pads_enabled(false);
                self.renderer.show_status(STATUS_CORRECT, StatusStyle::Watching);
                self.renderer.cue(Cue::Success);
                self.scheduler.schedule_in(
                    self.config.round_pacing_ms as u64,
                    SessionAction::NextRound { run_id: self.run.id },
                );
            }
            InputOutcome::Mismatch { .. } => {
                self.renderer.flash(color, self.config.input_flash_ms);
                self.renderer.set_pads_enabled(false);
                self.renderer.show_status(STATUS_GAME_OVER, StatusStyle::Error);
                self.renderer.cue(Cue::Error);
                self.finish_run();
                self.scheduler.schedule_in(
                    self.config.game_over_delay_ms as u64,
                    SessionAction::ShowGameOver { run_id: self.run.id },
                );
            }
        }

        outcome
    }

    fn record_high_score(&mut self) {
        let category = self.run.category();
        if !self.high_scores.record(category, self.run.score) {
            return;
        }
        self.run.push_event(GameEventData::HighScoreBeaten { category, score: self.run.score });
        if let Err(e) = self.persistence.save_high_scores(&self.high_scores) {
            warn!("Failed to save high scores: {}", e);
        }
    }

    fn finish_run(&mut self) {
        let summary = RunSummary {
            run_id: self.run.id,
            category: self.run.category(),
            score: self.run.score,
            round: self.run.round,
            max_combo: self.run.max_combo,
            finished_at: self.clock.now(),
        };
        info!(
            "Run {} over: score {} in round {} (max combo {}, {})",
            summary.run_id, summary.score, summary.round, summary.max_combo, summary.category
        );
        self.last_summary = Some(summary);
    }

    // -------------------------------------------------------------------------
    // Time
    // -------------------------------------------------------------------------

    /// Move scheduler time forward by `elapsed_ms`, running due tasks.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let target = self.scheduler.now_ms().saturating_add(elapsed_ms);
        self.advance_to(target);
    }

    /// Move scheduler time forward to `target_ms`, running due tasks in order.
    pub fn advance_to(&mut self, target_ms: u64) {
        while let Some(task) = self.scheduler.pop_due(target_ms) {
            if task.action.run_id() != self.run.id {
                continue;
            }
            self.run.now_ms = task.due_ms;
            self.run_action(task.action);
        }
        self.scheduler.advance_to(target_ms);
        self.run.now_ms = self.scheduler.now_ms();
        self.collect_events();
    }

    fn run_action(&mut self, action: SessionAction) {
        match action {
            SessionAction::Flash { index, color, duration_ms, .. } => {
                self.renderer.flash(color, duration_ms);
                self.run.push_event(GameEventData::PadFlashed { index, color, duration_ms });
            }
            SessionAction::BeginPlayerTurn { .. } => {
                if begin_player_turn(&mut self.run) {
                    self.renderer.set_pads_enabled(true);
                    self.renderer.show_status(STATUS_YOUR_TURN, StatusStyle::Playing);
                }
            }
            SessionAction::NextRound { .. } => {
                if self.run.phase == Phase::Watching {
                    self.start_round();
                }
            }
            SessionAction::ShowGameOver { .. } => {
                if self.run.phase == Phase::GameOver {
                    self.renderer.show_game_over(self.run.score);
                }
            }
        }
    }

    fn collect_events(&mut self) {
        self.events.extend(self.run.take_events());
    }

    fn show_idle(&mut self) {
        self.renderer.show_status(STATUS_IDLE, StatusStyle::Neutral);
        self.renderer.set_pads_enabled(true);
    }
}

// =============================================================================
// TESTS
// =============================================================================

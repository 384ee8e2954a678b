//! Async Session Driver
//!
//! Runs a `SessionController` on the tokio runtime:
//!
//! ```text
//!   Command (mpsc) ──▶ ┌──────────────┐ ──▶ SessionEvent (broadcast)
//!                      │    driver    │
//!   wall clock ──────▶ │  controller  │
//!                      └──────┬───────┘
//!                             │ spawn
//!                             ▼
//!                      leaderboard tasks ──▶ LeaderboardUpdate (mpsc)
//! ```
//!
//! Wall time elapsed since the driver started maps one-to-one onto the
//! controller's scheduler time. Leaderboard work runs in spawned tasks
//! and reports back tagged with its run id; results for a run that is no
//! longer current are dropped.

use std::time::Duration;

use serde::{Serialize, Deserialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::core::clock::Clock;
use crate::core::color::Color;
use crate::game::difficulty::Difficulty;
use crate::game::events::GameEvent;
use crate::game::input::InputOutcome;
use crate::game::state::{Category, RunId};
use crate::leaderboard::{
    LeaderboardBackend, LeaderboardClient, LeaderboardEntry, LeaderboardError, PlayerName,
};
use crate::persistence::Persistence;
use crate::session::controller::{RunSummary, SessionController};
use crate::session::renderer::Renderer;

/// Capacity of the event broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Player or UI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a normal run.
    Start(Difficulty),
    /// Start today's daily challenge.
    StartDaily,
    /// Abandon the current run.
    Reset,
    /// Change the selected tier by name.
    SelectDifficulty(String),
    /// Change the theme.
    SetTheme(String),
    /// Pad press.
    Input(Color),
    /// Leaderboard name for the pending prompt.
    SubmitName(String),
    /// Dismiss the pending prompt.
    SkipName,
    /// Stop the driver.
    Shutdown,
}

/// Everything the driver publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Transition of the current run.
    Game(GameEvent),
    /// Outcome of the leaderboard check for a finished run.
    Qualification {
        /// Run checked
        run_id: RunId,
        /// Board checked
        category: Category,
        /// Final score
        score: u32,
        /// Did the score make the board?
        qualifies: bool,
    },
    /// Board shown after a submission.
    Leaderboard {
        /// Board shown
        category: Category,
        /// Best entries, best first
        entries: Vec<LeaderboardEntry>,
    },
}

/// Result of a spawned leaderboard task.
#[derive(Debug)]
enum LeaderboardUpdate {
    Checked {
        summary: RunSummary,
        qualifies: bool,
    },
    Submitted {
        run_id: RunId,
        category: Category,
        result: Result<LeaderboardEntry, LeaderboardError>,
        top: Vec<LeaderboardEntry>,
    },
}

/// Owns a controller and drives it from commands and wall time.
pub struct SessionDriver<P, R, C, B> {
    controller: SessionController<P, R, C>,
    leaderboard: LeaderboardClient<B>,
    events_tx: broadcast::Sender<SessionEvent>,
    /// Finished run waiting for a leaderboard name.
    pending_prompt: Option<RunSummary>,
}

impl<P, R, C, B> SessionDriver<P, R, C, B>
where
    P: Persistence,
    R: Renderer,
    C: Clock,
    B: LeaderboardBackend,
{
    /// Wrap a controller.
    pub fn new(controller: SessionController<P, R, C>, leaderboard: LeaderboardClient<B>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            controller,
            leaderboard,
            events_tx,
            pending_prompt: None,
        }
    }

    /// Subscribe to published events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// The wrapped controller.
    pub fn controller(&self) -> &SessionController<P, R, C> {
        &self.controller
    }

    /// The leaderboard client.
    pub fn leaderboard(&self) -> &LeaderboardClient<B> {
        &self.leaderboard
    }

    /// Run until `Shutdown` or until every command sender is dropped.
    ///
    /// Returns the driver so callers can inspect the final state.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Self {
        let origin = Instant::now();
        let base_ms = self.controller.now_ms();
        let (updates_tx, mut updates_rx) = mpsc::channel::<LeaderboardUpdate>(16);

        info!("Session driver started");

        loop {
            self.publish_events();

            let wake = self
                .controller
                .next_due_ms()
                .map(|due| origin + Duration::from_millis(due.saturating_sub(base_ms)));

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("Command channel closed");
                        break;
                    };
                    if command == Command::Shutdown {
                        break;
                    }
                    self.catch_up(origin, base_ms);
                    self.handle_command(command, &updates_tx);
                }
                _ = sleep_until(wake.unwrap_or(origin)), if wake.is_some() => {
                    self.catch_up(origin, base_ms);
                }
                Some(update) = updates_rx.recv() => {
                    self.catch_up(origin, base_ms);
                    self.handle_update(update);
                }
            }
        }

        self.publish_events();
        info!("Session driver stopped");
        self
    }

    /// Run every timer that is due by now.
    fn catch_up(&mut self, origin: Instant, base_ms: u64) {
        let elapsed = origin.elapsed().as_millis() as u64;
        self.controller.advance_to(base_ms + elapsed);
    }

    fn publish_events(&mut self) {
        for event in self.controller.take_events() {
            // No subscribers is fine
            let _ = self.events_tx.send(SessionEvent::Game(event));
        }
    }

    fn handle_command(&mut self, command: Command, updates: &mpsc::Sender<LeaderboardUpdate>) {
        match command {
            Command::Start(difficulty) => {
                self.pending_prompt = None;
                if let Err(e) = self.controller.start_game(difficulty) {
                    warn!("Start rejected: {}", e);
                }
            }
            Command::StartDaily => {
                self.pending_prompt = None;
                if let Err(e) = self.controller.start_daily_challenge() {
                    warn!("Daily start rejected: {}", e);
                }
            }
            Command::Reset => {
                self.pending_prompt = None;
                self.controller.reset_game();
            }
            Command::SelectDifficulty(name) => {
                if let Err(e) = self.controller.select_difficulty_by_name(&name) {
                    warn!("Selection rejected: {}", e);
                }
            }
            Command::SetTheme(theme) => self.controller.set_theme(&theme),
            Command::Input(color) => {
                if let InputOutcome::Mismatch { .. } = self.controller.submit_input(color) {
                    self.spawn_check(updates);
                }
            }
            Command::SubmitName(name) => self.submit_name(&name, updates),
            Command::SkipName => {
                if self.pending_prompt.take().is_some() {
                    debug!("Leaderboard prompt dismissed");
                }
            }
            Command::Shutdown => {}
        }
    }

    fn spawn_check(&self, updates: &mpsc::Sender<LeaderboardUpdate>) {
        let Some(summary) = self.controller.last_summary().cloned() else {
            return;
        };
        let client = self.leaderboard.clone();
        let updates = updates.clone();

        tokio::spawn(async move {
            let qualifies = client.check(summary.category, summary.score).await;
            let _ = updates.send(LeaderboardUpdate::Checked { summary, qualifies }).await;
        });
    }

    fn submit_name(&mut self, raw_name: &str, updates: &mpsc::Sender<LeaderboardUpdate>) {
        if self.pending_prompt.is_none() {
            debug!("Ignoring name with no prompt open");
            return;
        }
        // Blank names keep the prompt open
        if PlayerName::parse(raw_name).is_err() {
            self.controller.renderer_mut().reject_name();
            return;
        }
        let Some(summary) = self.pending_prompt.take() else {
            return;
        };

        let client = self.leaderboard.clone();
        let updates = updates.clone();
        let name = raw_name.to_string();

        tokio::spawn(async move {
            let result = client
                .submit(summary.category, &name, summary.score, summary.finished_at)
                .await;
            let top = client.fetch_top_or_empty(summary.category).await;
            let _ = updates
                .send(LeaderboardUpdate::Submitted {
                    run_id: summary.run_id,
                    category: summary.category,
                    result,
                    top,
                })
                .await;
        });
    }

    fn handle_update(&mut self, update: LeaderboardUpdate) {
        let current = self.controller.run().id;

        match update {
            LeaderboardUpdate::Checked { summary, qualifies } => {
                if summary.run_id != current {
                    debug!("Dropping stale leaderboard check for run {}", summary.run_id);
                    return;
                }
                let _ = self.events_tx.send(SessionEvent::Qualification {
                    run_id: summary.run_id,
                    category: summary.category,
                    score: summary.score,
                    qualifies,
                });
                if qualifies {
                    self.controller
                        .renderer_mut()
                        .prompt_for_name(summary.category, summary.score);
                    self.pending_prompt = Some(summary);
                }
            }
            LeaderboardUpdate::Submitted { run_id, category, result, top } => {
                match &result {
                    Ok(entry) => info!("{} scored {} on the {} leaderboard", entry.name, entry.score, category),
                    Err(e) => warn!("Leaderboard submission failed: {}", e),
                }
                if run_id != current {
                    debug!("Dropping stale leaderboard for run {}", run_id);
                    return;
                }
                self.controller.renderer_mut().show_leaderboard(category, &top);
                let _ = self.events_tx.send(SessionEvent::Leaderboard { category, entries: top });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::clock::FixedClock;
    use crate::game::events::GameEventData;
    use crate::leaderboard::InMemoryLeaderboard;
    use crate::persistence::MemoryStore;
    use crate::session::controller::SessionConfig;
    use crate::session::renderer::recording::{RecordingRenderer, RenderCall};

    type TestDriver = SessionDriver<MemoryStore, RecordingRenderer, FixedClock, InMemoryLeaderboard>;

    fn driver_with<B: LeaderboardBackend>(
        backend: B,
    ) -> SessionDriver<MemoryStore, RecordingRenderer, FixedClock, B> {
        let controller = SessionController::new(
            SessionConfig::default(),
            MemoryStore::new(),
            RecordingRenderer::default(),
            FixedClock::on_date(2024, 1, 15).unwrap(),
        )
        .with_rng_seed(9);
        SessionDriver::new(controller, LeaderboardClient::new(Arc::new(backend)))
    }

    fn driver() -> TestDriver {
        driver_with(InMemoryLeaderboard::new())
    }

    /// Backend that is never reachable.
    struct OfflineBackend;

    impl LeaderboardBackend for OfflineBackend {
        fn submit_entry(
            &self,
            _category: Category,
            _entry: LeaderboardEntry,
        ) -> impl std::future::Future<Output = Result<(), LeaderboardError>> + Send {
            async { Err(LeaderboardError::Unavailable("offline".into())) }
        }

        fn fetch_top(
            &self,
            _category: Category,
            _limit: usize,
        ) -> impl std::future::Future<Output = Result<Vec<LeaderboardEntry>, LeaderboardError>> + Send {
            async { Err(LeaderboardError::Unavailable("offline".into())) }
        }
    }

    fn other(color: Color) -> Color {
        Color::from_index((color.index() + 1) % 4).unwrap()
    }

    /// Plays back what it sees, fumbling on `mistake_round`.
    async fn bot(
        mut events: broadcast::Receiver<SessionEvent>,
        commands: mpsc::Sender<Command>,
        mistake_round: u32,
        name: &str,
    ) {
        let mut seen = Vec::new();
        while let Ok(event) = events.recv().await {
            match event {
                SessionEvent::Game(GameEvent { data: GameEventData::PadFlashed { color, .. }, .. }) => {
                    seen.push(color);
                }
                SessionEvent::Game(GameEvent { data: GameEventData::PlayerTurnStarted { round }, .. }) => {
                    for (i, color) in seen.drain(..).enumerate() {
                        let color = if round == mistake_round && i == 0 { other(color) } else { color };
                        commands.send(Command::Input(color)).await.unwrap();
                    }
                }
                SessionEvent::Qualification { qualifies: true, .. } => {
                    commands.send(Command::SubmitName("   ".into())).await.unwrap();
                    commands.send(Command::SubmitName(name.into())).await.unwrap();
                }
                SessionEvent::Qualification { qualifies: false, .. } | SessionEvent::Leaderboard { .. } => {
                    commands.send(Command::Shutdown).await.unwrap();
                }
                _ => {}
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_reaches_leaderboard() {
        let driver = driver();
        let events = driver.subscribe();
        let mut log = driver.subscribe();
        let (tx, rx) = mpsc::channel(32);

        let bot = tokio::spawn(bot(events, tx.clone(), 3, "  tester  "));
        tx.send(Command::Start(Difficulty::Normal)).await.unwrap();

        let driver = driver.run(rx).await;
        bot.abort();

        let controller = driver.controller();
        assert_eq!(controller.run().round, 3);
        assert_eq!(controller.run().score, 2);
        assert_eq!(controller.high_scores().get(Category::Normal), 2);

        let calls = &controller.renderer().calls;
        assert!(calls.contains(&RenderCall::PromptName(Category::Normal, 2)));
        assert!(calls.contains(&RenderCall::RejectName));
        assert!(calls.contains(&RenderCall::Leaderboard(Category::Normal, 1)));

        let top = driver.leaderboard().fetch_top_or_empty(Category::Normal).await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "tester");
        assert_eq!(top[0].score, 2);

        let mut saw_game_over = false;
        while let Ok(event) = log.try_recv() {
            if let SessionEvent::Game(e) = event {
                saw_game_over |= e.is_game_over();
            }
        }
        assert!(saw_game_over);
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_leaderboard_leaves_run_intact() {
        let driver = driver_with(OfflineBackend);
        let events = driver.subscribe();
        let (tx, rx) = mpsc::channel(32);

        let bot = tokio::spawn(bot(events, tx.clone(), 3, "ada"));
        tx.send(Command::Start(Difficulty::Normal)).await.unwrap();

        let driver = driver.run(rx).await;
        bot.abort();

        let controller = driver.controller();
        assert_eq!(controller.phase(), crate::game::state::Phase::GameOver);
        assert_eq!(controller.run().score, 2);
        assert_eq!(controller.run().round, 3);
        assert_eq!(controller.high_scores().get(Category::Normal), 2);

        // Failed fetch reads as an empty board, so the prompt still opens
        let calls = &controller.renderer().calls;
        assert!(calls.contains(&RenderCall::PromptName(Category::Normal, 2)));
        assert!(calls.contains(&RenderCall::Leaderboard(Category::Normal, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_score_not_prompted() {
        let driver = driver();
        let events = driver.subscribe();
        let (tx, rx) = mpsc::channel(32);

        let bot = tokio::spawn(bot(events, tx.clone(), 1, "nobody"));
        tx.send(Command::Start(Difficulty::Easy)).await.unwrap();

        let driver = driver.run(rx).await;
        bot.abort();

        assert_eq!(driver.controller().run().score, 0);
        assert!(!driver
            .controller()
            .renderer()
            .calls
            .iter()
            .any(|c| matches!(c, RenderCall::PromptName(..))));
        assert!(driver.leaderboard().fetch_top_or_empty(Category::Easy).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_before_check_drops_prompt() {
        let mut driver = driver();
        let (updates_tx, _updates_rx) = mpsc::channel(4);
        driver.controller.start_game(Difficulty::Normal).unwrap();
        let stale = RunSummary {
            run_id: driver.controller.run().id,
            category: Category::Normal,
            score: 4,
            round: 3,
            max_combo: 2,
            finished_at: FixedClock::on_date(2024, 1, 15).unwrap().now(),
        };

        driver.handle_command(Command::Reset, &updates_tx);
        driver.handle_update(LeaderboardUpdate::Checked { summary: stale, qualifies: true });

        assert!(driver.pending_prompt.is_none());
        assert!(!driver
            .controller()
            .renderer()
            .calls
            .iter()
            .any(|c| matches!(c, RenderCall::PromptName(..))));
    }

    #[tokio::test]
    async fn test_closed_channel_stops_driver() {
        let driver = driver();
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let driver = driver.run(rx).await;
        assert_eq!(driver.controller().phase(), crate::game::state::Phase::Idle);
    }
}

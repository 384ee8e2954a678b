//! Chroma Recall Demo
//!
//! Runs one session with a bot at the pads: it memorizes each playback,
//! repeats it, fumbles on purpose in a chosen round and then signs the
//! leaderboard.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use chroma_recall::{
    VERSION,
    core::{clock::SystemClock, color::Color},
    game::events::{GameEvent, GameEventData},
    leaderboard::{InMemoryLeaderboard, LeaderboardClient},
    persistence::JsonFileStore,
    session::{Command, SessionConfig, SessionController, SessionDriver, SessionEvent, TracingRenderer},
};

/// Round in which the bot presses a wrong pad.
const DEFAULT_MISTAKE_ROUND: u32 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Chroma Recall v{}", VERSION);

    let config = SessionConfig::from_env();
    let data_dir = std::env::var("CHROMA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("chroma-recall"));
    let mistake_round = match std::env::var("CHROMA_DEMO_MISTAKE_ROUND") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid CHROMA_DEMO_MISTAKE_ROUND: {raw:?}"))?,
        Err(_) => DEFAULT_MISTAKE_ROUND,
    };

    info!("Data directory: {}", data_dir.display());
    info!("Config: {:?}", config);

    let controller = SessionController::new(
        config,
        JsonFileStore::new(&data_dir),
        TracingRenderer,
        SystemClock,
    );
    let difficulty = controller.selected_difficulty();
    info!("Best {} score so far: {}", difficulty, controller.high_scores().get(difficulty.into()));

    let leaderboard = LeaderboardClient::new(Arc::new(InMemoryLeaderboard::new()));
    let driver = SessionDriver::new(controller, leaderboard);

    let (commands_tx, commands_rx) = mpsc::channel(64);
    let bot = tokio::spawn(demo_bot(driver.subscribe(), commands_tx.clone(), mistake_round));

    commands_tx
        .send(Command::Start(difficulty))
        .await
        .context("Driver stopped before the run started")?;

    let driver = driver.run(commands_rx).await;
    bot.abort();

    let controller = driver.controller();
    info!("=== Session Results ===");
    info!("Rounds reached: {}", controller.run().round);
    info!("Final score: {}", controller.run().score);
    info!("Max combo: {}", controller.run().max_combo);
    for (category, score) in controller.high_scores().iter() {
        info!("High score [{}]: {}", category, score);
    }

    Ok(())
}

/// Plays back every sequence it is shown.
async fn demo_bot(
    mut events: broadcast::Receiver<SessionEvent>,
    commands: mpsc::Sender<Command>,
    mistake_round: u32,
) -> anyhow::Result<()> {
    let mut memory: Vec<Color> = Vec::new();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Bot missed {} events", missed);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        };

        match event {
            SessionEvent::Game(GameEvent { data: GameEventData::PadFlashed { color, .. }, .. }) => {
                memory.push(color);
            }
            SessionEvent::Game(GameEvent { data: GameEventData::PlayerTurnStarted { round }, .. }) => {
                for (i, color) in memory.drain(..).enumerate() {
                    let press = if round == mistake_round && i + 1 == round as usize {
                        let wrong = Color::from_index((color.index() + 2) % 4).unwrap_or(color);
                        info!("Bot fumbles: {} instead of {}", wrong, color);
                        wrong
                    } else {
                        color
                    };
                    commands.send(Command::Input(press)).await?;
                }
            }
            SessionEvent::Qualification { qualifies: true, .. } => {
                commands.send(Command::SubmitName("demo".into())).await?;
            }
            SessionEvent::Qualification { qualifies: false, score, .. } => {
                info!("Score {} did not make the leaderboard", score);
                commands.send(Command::Shutdown).await?;
            }
            SessionEvent::Leaderboard { .. } => {
                commands.send(Command::Shutdown).await?;
            }
            _ => {}
        }
    }
}

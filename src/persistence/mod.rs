//! Local Persistence
//!
//! Key/value storage for high scores and preferences. Last write wins.
//! Corrupt high-score data is never fatal: it loads as a fresh table.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::game::scoring::HighScoreTable;

/// Preference key for the selected difficulty tier.
pub const PREF_DIFFICULTY: &str = "difficulty";

/// Preference key for the UI theme.
pub const PREF_THEME: &str = "theme";

const HIGH_SCORES_FILE: &str = "high_scores.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Encoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Local key/value store.
pub trait Persistence {
    /// Stored high scores; a fresh table if missing or malformed.
    fn load_high_scores(&self) -> HighScoreTable;

    /// Replace the stored high scores.
    fn save_high_scores(&mut self, table: &HighScoreTable) -> Result<(), PersistenceError>;

    /// Stored preference value.
    fn load_preference(&self, key: &str) -> Option<String>;

    /// Store a preference value.
    fn save_preference(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Decode a stored high-score table, falling back to all zeros.
pub fn parse_high_scores(raw: &str) -> HighScoreTable {
    match serde_json::from_str(raw) {
        Ok(table) => table,
        Err(e) => {
            warn!("Discarding malformed high scores: {}", e);
            HighScoreTable::new()
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Store that lives only as long as the process.
///
/// High scores are kept as encoded JSON so loads take the same decode
/// path as the file store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    high_scores: Option<String>,
    preferences: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with raw high-score text.
    pub fn with_raw_high_scores(raw: impl Into<String>) -> Self {
        Self {
            high_scores: Some(raw.into()),
            preferences: BTreeMap::new(),
        }
    }
}

impl Persistence for MemoryStore {
    fn load_high_scores(&self) -> HighScoreTable {
        self.high_scores
            .as_deref()
            .map(parse_high_scores)
            .unwrap_or_default()
    }

    fn save_high_scores(&mut self, table: &HighScoreTable) -> Result<(), PersistenceError> {
        self.high_scores = Some(serde_json::to_string(table)?);
        Ok(())
    }

    fn load_preference(&self, key: &str) -> Option<String> {
        self.preferences.get(key).cloned()
    }

    fn save_preference(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.preferences.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// =============================================================================
// JSON FILE STORE
// =============================================================================

/// Store backed by JSON files in one directory.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(file)).ok()
    }

    fn write(&self, file: &str, contents: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(file), contents)?;
        Ok(())
    }

    fn preferences(&self) -> BTreeMap<String, String> {
        let Some(raw) = self.read(PREFERENCES_FILE) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Discarding malformed preferences: {}", e);
            BTreeMap::new()
        })
    }
}

impl Persistence for JsonFileStore {
    fn load_high_scores(&self) -> HighScoreTable {
        self.read(HIGH_SCORES_FILE)
            .as_deref()
            .map(parse_high_scores)
            .unwrap_or_default()
    }

    fn save_high_scores(&mut self, table: &HighScoreTable) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(table)?;
        self.write(HIGH_SCORES_FILE, &json)
    }

    fn load_preference(&self, key: &str) -> Option<String> {
        self.preferences().remove(key)
    }

    fn save_preference(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut preferences = self.preferences();
        preferences.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&preferences)?;
        self.write(PREFERENCES_FILE, &json)
    }
}

//! Scoring and Combos
//!
//! A completed round is worth one point plus a combo bonus. The combo is
//! incremented first and the bonus is looked up with the new value, so
//! four clean rounds from zero score 1, 1, 2, 2.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::game::state::{Category, RunState};

/// Points for completing a round, before bonus.
pub const ROUND_POINTS: u32 = 1;

/// Combo thresholds and their bonus, highest first.
pub const COMBO_BONUSES: [(u32, u32); 3] = [(10, 3), (5, 2), (3, 1)];

/// Bonus for a combo value.
pub fn combo_bonus(combo: u32) -> u32 {
    COMBO_BONUSES
        .iter()
        .find(|(threshold, _)| combo >= *threshold)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}

/// Apply a completed round. Returns the score delta.
pub fn on_round_complete(state: &mut RunState) -> u32 {
    state.combo = state.combo.saturating_add(1);
    state.max_combo = state.max_combo.max(state.combo);

    let delta = ROUND_POINTS + combo_bonus(state.combo);
    state.score = state.score.saturating_add(delta);
    delta
}

/// Apply a mistake. The score is left alone.
pub fn on_mismatch(state: &mut RunState) {
    state.combo = 0;
}

// =============================================================================
// HIGH SCORES
// =============================================================================

/// Best score per category. Entries only ever increase.
///
/// Serializes as a flat object keyed by category name; unknown keys
/// are dropped on load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, u32>", into = "BTreeMap<String, u32>")]
pub struct HighScoreTable {
    scores: BTreeMap<Category, u32>,
}

impl HighScoreTable {
    /// Table with every category at zero.
    pub fn new() -> Self {
        Self {
            scores: Category::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }

    /// Best score for a category (0 if never set).
    pub fn get(&self, category: Category) -> u32 {
        self.scores.get(&category).copied().unwrap_or(0)
    }

    /// Raise a category's best. Returns true if `score` beat it.
    pub fn record(&mut self, category: Category, score: u32) -> bool {
        let best = self.scores.entry(category).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }

    /// Iterate `(category, best)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.scores.iter().map(|(c, s)| (*c, *s))
    }
}

impl Default for HighScoreTable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<String, u32>> for HighScoreTable {
    fn from(raw: BTreeMap<String, u32>) -> Self {
        let mut table = HighScoreTable::new();
        for (key, score) in raw {
            if let Ok(category) = key.parse::<Category>() {
                table.record(category, score);
            }
        }
        table
    }
}

impl From<HighScoreTable> for BTreeMap<String, u32> {
    fn from(table: HighScoreTable) -> Self {
        table
            .scores
            .into_iter()
            .map(|(c, s)| (c.name().to_string(), s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::ColorRng;
    use crate::game::difficulty::Difficulty;
    use proptest::prelude::*;

    #[test]
    fn test_bonus_table() {
        assert_eq!(combo_bonus(0), 0);
        assert_eq!(combo_bonus(2), 0);
        assert_eq!(combo_bonus(3), 1);
        assert_eq!(combo_bonus(4), 1);
        assert_eq!(combo_bonus(5), 2);
        assert_eq!(combo_bonus(9), 2);
        assert_eq!(combo_bonus(10), 3);
        assert_eq!(combo_bonus(250), 3);
    }

    #[test]
    fn test_four_clean_rounds() {
        let mut state = RunState::new(Difficulty::Normal, ColorRng::seeded(0));
        let mut combos = Vec::new();
        let mut scores = Vec::new();

        for _ in 0..4 {
            on_round_complete(&mut state);
            combos.push(state.combo);
            scores.push(state.score);
        }

        assert_eq!(combos, vec![1, 2, 3, 4]);
        assert_eq!(scores, vec![1, 2, 4, 6]);
        assert_eq!(state.max_combo, 4);
    }

    #[test]
    fn test_mismatch_keeps_score_and_max_combo() {
        let mut state = RunState::new(Difficulty::Normal, ColorRng::seeded(0));
        for _ in 0..6 {
            on_round_complete(&mut state);
        }
        let score = state.score;

        on_mismatch(&mut state);
        assert_eq!(state.combo, 0);
        assert_eq!(state.score, score);
        assert_eq!(state.max_combo, 6);
    }

    #[test]
    fn test_high_score_only_increases() {
        let mut table = HighScoreTable::new();
        assert!(table.record(Category::Normal, 5));
        assert!(!table.record(Category::Normal, 3));
        assert!(!table.record(Category::Normal, 5));
        assert_eq!(table.get(Category::Normal), 5);
        assert_eq!(table.get(Category::Daily), 0);
    }

    #[test]
    fn test_table_json_roundtrip() {
        let mut table = HighScoreTable::new();
        table.record(Category::Hard, 17);
        table.record(Category::Daily, 9);

        let json = serde_json::to_string(&table).unwrap();
        let back: HighScoreTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_table_ignores_unknown_keys() {
        let table: HighScoreTable =
            serde_json::from_str(r#"{"normal": 4, "weekly": 99}"#).unwrap();
        assert_eq!(table.get(Category::Normal), 4);
        assert_eq!(table, {
            let mut t = HighScoreTable::new();
            t.record(Category::Normal, 4);
            t
        });
    }

    proptest! {
        #[test]
        fn prop_score_and_max_combo_monotonic(outcomes in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut state = RunState::new(Difficulty::Normal, ColorRng::seeded(0));
            for completed in outcomes {
                let (score, max_combo) = (state.score, state.max_combo);
                if completed {
                    on_round_complete(&mut state);
                } else {
                    on_mismatch(&mut state);
                    prop_assert_eq!(state.combo, 0);
                }
                prop_assert!(state.score >= score);
                prop_assert!(state.max_combo >= max_combo);
                prop_assert!(state.max_combo >= state.combo);
            }
        }
    }
}

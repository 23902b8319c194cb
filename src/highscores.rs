//! Per-game score and best score
//!
//! Persisted to storage under the game's key as `{"highestScore": n}`.

use serde::{Deserialize, Serialize};

use crate::persistence::Store;

/// Saved record
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavedScore {
    #[serde(default)]
    highest_score: u32,
}

/// Current round score plus the persisted best
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBoard {
    #[serde(skip)]
    store: Store,
    #[serde(skip)]
    key: &'static str,
    pub score: u32,
    pub highest: u32,
    #[serde(skip)]
    beaten: bool,
    /// Set once the best score has been beaten this session
    pub high_score_announced: bool,
}

impl ScoreBoard {
    /// Load the best score for `key`; a missing, malformed or zero record
    /// falls back to `default_highest`
    pub fn load(store: &Store, key: &'static str, initial_score: u32, default_highest: u32) -> Self {
        let highest = match store.load::<SavedScore>(key) {
            Some(saved) if saved.highest_score > 0 => saved.highest_score,
            _ => default_highest,
        };
        log::info!("{}: best score {}", key, highest);
        Self {
            store: store.clone(),
            key,
            score: initial_score,
            highest,
            beaten: false,
            high_score_announced: false,
        }
    }

    /// Add `points`; persists and returns true when the best score improved
    pub fn increase(&mut self, points: u32) -> bool {
        self.score += points;
        if self.score > self.highest {
            self.highest = self.score;
            self.beaten = true;
            self.store.save(
                self.key,
                &SavedScore {
                    highest_score: self.highest,
                },
            );
            return true;
        }
        false
    }

    /// True the first time this is asked after the best score was beaten.
    /// Games play their fanfare on it.
    pub fn take_high_score_announcement(&mut self) -> bool {
        if self.beaten && !self.high_score_announced {
            self.high_score_announced = true;
            return true;
        }
        false
    }

    /// HUD text: `score/best`
    pub fn label(&self) -> String {
        format!("{}/{}", self.score, self.highest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_defaults_on_missing_and_garbage() {
        let store = Store::new(MemoryStorage::new().with_item("simon", "%%%"));
        let board = ScoreBoard::load(&store, "simon", 1, 1);
        assert_eq!((board.score, board.highest), (1, 1));

        let board = ScoreBoard::load(&store, "twin_squares", 0, 0);
        assert_eq!((board.score, board.highest), (0, 0));
    }

    #[test]
    fn test_zero_high_score_uses_default() {
        let store = Store::new(MemoryStorage::new().with_item("stray_lines", r#"{"highestScore":0}"#));
        let board = ScoreBoard::load(&store, "stray_lines", 0, 1);
        assert_eq!(board.highest, 1);
    }

    #[test]
    fn test_increase_persists_improvement_only() {
        let store = Store::memory();
        let mut board = ScoreBoard::load(&store, "4snakes", 0, 0);
        assert!(board.increase(1));
        assert!(board.increase(1));
        assert_eq!(board.label(), "2/2");

        let mut next = ScoreBoard::load(&store, "4snakes", 0, 0);
        assert_eq!(next.highest, 2);
        assert!(!next.increase(1));
        assert_eq!(next.label(), "1/2");
    }

    #[test]
    fn test_announcement_once() {
        let store = Store::memory();
        let mut board = ScoreBoard::load(&store, "k", 0, 1);
        board.increase(1);
        assert!(!board.take_high_score_announcement());
        board.increase(1);
        assert!(board.take_high_score_announcement());
        board.increase(1);
        assert!(!board.take_high_score_announcement());
    }
}

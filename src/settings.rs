//! Arcade tunables
//!
//! Persisted separately from game saves. Every field has a default, so a
//! partial or stale record still loads.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::persistence::Store;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Logic ticks per second
    pub tick_rate_hz: u32,
    /// Per-game overrides of `tick_rate_hz`, keyed by game name
    pub tick_rates: BTreeMap<String, u32>,
    /// A single host frame longer than this counts as one tick
    pub stall_threshold_ms: u64,
    /// Wall-clock delay between GameOver and the automatic restart
    pub game_over_delay_ms: f64,
    /// After GameOver, input may restart early once this much time passed
    pub restart_grace_ms: f64,

    // === Menu overlay ===
    /// Volume change per press / repeat
    pub volume_step: f32,
    /// Press-and-hold repeat interval
    pub volume_repeat_ms: f64,
    /// Volume used when no saved value exists
    pub default_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 40,
            // simon polls its sequence every display frame
            tick_rates: BTreeMap::from([(String::from("simon"), 60)]),
            stall_threshold_ms: 1000,
            game_over_delay_ms: 1250.0,
            restart_grace_ms: 500.0,

            volume_step: 0.1,
            volume_repeat_ms: 200.0,
            default_volume: 0.4,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "games2d-settings";

    /// Tick rate for the named game
    pub fn tick_rate_for(&self, game: &str) -> u32 {
        self.tick_rates
            .get(game)
            .copied()
            .filter(|hz| *hz > 0)
            .unwrap_or(self.tick_rate_hz)
    }

    pub fn stall_threshold(&self) -> Duration {
        Duration::from_millis(self.stall_threshold_ms)
    }

    /// Parse settings JSON; malformed input yields defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Invalid settings ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Load settings from storage
    pub fn load(store: &Store) -> Self {
        match store.load(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &Store) {
        store.save(Self::STORAGE_KEY, self);
    }
}

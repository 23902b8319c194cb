//! games2d - small single-screen arcade games
//!
//! Core modules:
//! - `sim`: Fixed-timestep frame driver, timers, sessions and the `Game` trait
//! - `games`: 4snakes, simon, stray lines and twin squares
//! - `arcade`: Runs one game with its menu overlay and restarts
//! - `menu`: Shared mute/pause/fullscreen/volume overlay
//! - `platform`: Host abstraction (audio, camera effects, vibration)
//! - `persistence`: Key/value saves with safe fallbacks
//! - `offline`: Service-worker cache planning

pub mod arcade;
pub mod audio;
pub mod games;
pub mod highscores;
pub mod input;
pub mod menu;
pub mod offline;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use arcade::{Arcade, Driver, FrameReport};
pub use games::{GameKind, launch};
pub use highscores::ScoreBoard;
pub use persistence::Store;
pub use settings::Settings;

//! The games
//!
//! Each game is a [`Game`](crate::sim::Game) state machine with its own
//! closed phase enum. [`launch`] picks one by name for hosts that choose at
//! runtime.

pub mod simon;
pub mod snake;
pub mod stray_lines;
pub mod twin_squares;

use rand::Rng;
use rand_pcg::Pcg32;

use crate::arcade::{Arcade, Driver};
use crate::persistence::Store;
use crate::platform::Host;

pub use simon::Simon;
pub use snake::Snakes;
pub use stray_lines::StrayLines;
pub use twin_squares::TwinSquares;

/// Screen backgrounds, one picked at random on each change
pub const BACKGROUND_COLORS: [u32; 5] = [0x004225, 0x243757, 0x3b1420, 0x2b2b2b, 0x433D54];

/// Colours of snakes, foods, balls and targets
pub const FOREGROUND_COLORS: [u32; 4] = [0x007FFF, 0xFFFFFF, 0xCD5C5C, 0xBDDA57];

/// A random background different from `current`
pub fn next_background(rng: &mut Pcg32, current: Option<u32>) -> u32 {
    loop {
        let color = BACKGROUND_COLORS[rng.random_range(0..BACKGROUND_COLORS.len())];
        if Some(color) != current {
            return color;
        }
    }
}

/// Which game to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Snakes,
    Simon,
    StrayLines,
    TwinSquares,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::Snakes,
        GameKind::Simon,
        GameKind::StrayLines,
        GameKind::TwinSquares,
    ];

    /// Look a game up by its directory / storage name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        use crate::sim::Game;
        match self {
            GameKind::Snakes => Snakes::NAME,
            GameKind::Simon => Simon::NAME,
            GameKind::StrayLines => StrayLines::NAME,
            GameKind::TwinSquares => TwinSquares::NAME,
        }
    }

    /// Logical screen size the game's coordinates live in
    pub fn screen_size(&self) -> (f32, f32) {
        match self {
            GameKind::Snakes => (snake::SCREEN_WIDTH, snake::SCREEN_HEIGHT),
            GameKind::Simon => (simon::SCREEN_WIDTH, simon::SCREEN_HEIGHT),
            GameKind::StrayLines => (stray_lines::SCREEN_WIDTH, stray_lines::SCREEN_HEIGHT),
            GameKind::TwinSquares => (twin_squares::SCREEN_WIDTH, twin_squares::SCREEN_HEIGHT),
        }
    }
}

/// Start an arcade running `kind`
pub fn launch<H: Host + 'static>(
    kind: GameKind,
    store: Store,
    host: H,
    seed: u64,
    now_ms: f64,
) -> Box<dyn Driver> {
    log::info!("Launching {}", kind.name());
    match kind {
        GameKind::Snakes => Box::new(Arcade::<Snakes, H>::new(store, host, seed, now_ms)),
        GameKind::Simon => Box::new(Arcade::<Simon, H>::new(store, host, seed, now_ms)),
        GameKind::StrayLines => Box::new(Arcade::<StrayLines, H>::new(store, host, seed, now_ms)),
        GameKind::TwinSquares => Box::new(Arcade::<TwinSquares, H>::new(store, host, seed, now_ms)),
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::platform::NullHost;

    #[test]
    fn test_names_round_trip() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GameKind::from_name("pong"), None);
    }

    #[test]
    fn test_next_background_differs() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut current = None;
        for _ in 0..50 {
            let next = next_background(&mut rng, current);
            assert_ne!(Some(next), current);
            current = Some(next);
        }
    }

    #[test]
    fn test_launch_each_game() {
        for kind in GameKind::ALL {
            let mut driver = launch(kind, Store::memory(), NullHost, 1, 0.0);
            assert_eq!(driver.name(), kind.name());
            driver.frame(25.0, 25.0);
            assert!(driver.snapshot_json().contains(kind.name()));
        }
    }
}

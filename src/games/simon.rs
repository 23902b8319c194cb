//! Simon
//!
//! Four quadrants flash a sequence that grows by one each round; the player
//! repeats it by tapping quadrants. A wrong quadrant ends the game.
//!
//! Flash timing runs on wall-clock timers; while a quadrant is lit the
//! sequence logic waits. A completed user sequence is checked before any
//! pending selection.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::audio::Sound;
use crate::highscores::ScoreBoard;
use crate::input::InputEvent;
use crate::persistence::Store;
use crate::sim::geom::Rect;
use crate::sim::session::{Game, TickContext};

pub const SCREEN_WIDTH: f32 = 900.0;
pub const SCREEN_HEIGHT: f32 = 900.0;

pub const QUADRANT_COLORS: [u32; 4] = [0x243757, 0xCD5C5C, 0xBDDA57, 0x2b2b2b];
pub const FLASH_COLOR: u32 = 0xf8f8f8;

pub const START_BUTTON_CENTER: Vec2 = Vec2::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT / 2.0);
pub const START_BUTTON_RADIUS: f32 = 160.0;

/// How long a quadrant stays lit
const FLASH_MS: f64 = 350.0;
/// Dark gap after a flash before the next step
const FLASH_GAP_MS: f64 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Start button shown
    StartScreen,
    /// Playing back the sequence
    GeneratedSequence,
    /// Waiting for the player to repeat it
    UserSequence,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimonTimer {
    /// Restore a quadrant's colour
    Unlight(u8),
    /// Gap after a flash is over
    Settle,
}

/// Quadrant under `p`, row-major from the top-left
pub fn quadrant_at(p: Vec2) -> Option<u8> {
    (0..4u8).find(|&i| quadrant_rect(i).contains(p))
}

pub fn quadrant_rect(i: u8) -> Rect {
    let w = SCREEN_WIDTH / 2.0;
    let h = SCREEN_HEIGHT / 2.0;
    Rect::new(f32::from(i % 2) * w, f32::from(i / 2) * h, w, h)
}

fn on_start_button(p: Vec2) -> bool {
    p.distance(START_BUTTON_CENTER) <= START_BUTTON_RADIUS
}

#[derive(Debug, Clone, Serialize)]
pub struct Simon {
    pub phase: Phase,
    /// Quadrant currently lit
    pub lit: Option<u8>,
    /// A flash (or its gap) is in progress
    pub flashing: bool,
    pub scores: ScoreBoard,
    #[serde(skip)]
    pub sequence: Vec<u8>,
    #[serde(skip)]
    pub generated_index: usize,
    #[serde(skip)]
    pub user_index: usize,
    #[serde(skip)]
    pub selected: Option<u8>,
    #[serde(skip)]
    rng: Pcg32,
}

impl Simon {
    pub fn quadrant_color(&self, i: u8) -> u32 {
        if self.lit == Some(i) {
            FLASH_COLOR
        } else {
            QUADRANT_COLORS[usize::from(i)]
        }
    }

    fn flash(&mut self, i: u8, ctx: &mut TickContext<'_, SimonTimer>) {
        self.lit = Some(i);
        self.flashing = true;
        ctx.play(Sound::Note(i));
        ctx.after(FLASH_MS, SimonTimer::Unlight(i));
    }

    fn play_back(&mut self, ctx: &mut TickContext<'_, SimonTimer>) {
        let target = self.scores.score as usize;
        if self.generated_index >= target {
            self.phase = Phase::UserSequence;
            return;
        }
        if self.generated_index == self.sequence.len() {
            self.sequence.push(self.rng.random_range(0..4));
        }
        let next = self.sequence[self.generated_index];
        self.flash(next, ctx);
        self.generated_index += 1;
    }

    fn check_user(&mut self, ctx: &mut TickContext<'_, SimonTimer>) {
        if self.user_index == self.sequence.len() {
            ctx.play(Sound::Applause);
            self.phase = Phase::StartScreen;
            self.scores.increase(1);
            log::info!("Round cleared, score {}", self.scores.label());
            return;
        }

        let Some(selected) = self.selected.take() else {
            return;
        };
        if selected != self.sequence[self.user_index] {
            log::info!(
                "Wrong quadrant {} (wanted {})",
                selected,
                self.sequence[self.user_index]
            );
            self.phase = Phase::GameOver;
            ctx.game_over(Sound::Lose);
        } else {
            self.flash(selected, ctx);
            self.user_index += 1;
        }
    }
}

impl Game for Simon {
    type Timer = SimonTimer;

    const NAME: &'static str = "simon";

    fn new(seed: u64, store: &Store) -> Self {
        Self {
            phase: Phase::StartScreen,
            lit: None,
            flashing: false,
            scores: ScoreBoard::load(store, Self::NAME, 1, 1),
            sequence: Vec::new(),
            generated_index: 0,
            user_index: 0,
            selected: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn tick(&mut self, ctx: &mut TickContext<'_, SimonTimer>) {
        if self.flashing {
            return;
        }
        if self.phase == Phase::GeneratedSequence {
            self.play_back(ctx);
        }
        if self.phase == Phase::UserSequence {
            self.check_user(ctx);
        }
    }

    fn input(&mut self, event: &InputEvent, ctx: &mut TickContext<'_, SimonTimer>) {
        let InputEvent::PointerUp(p) = *event else {
            return;
        };
        match self.phase {
            Phase::StartScreen if on_start_button(p) => {
                self.phase = Phase::GeneratedSequence;
                self.generated_index = 0;
                self.user_index = 0;
                self.selected = None;
                ctx.host.stop_sound(Sound::Applause);
            }
            Phase::UserSequence => {
                if let Some(i) = quadrant_at(p) {
                    self.selected = Some(i);
                    self.flashing = false;
                }
            }
            _ => {}
        }
    }

    fn timer(&mut self, timer: SimonTimer, ctx: &mut TickContext<'_, SimonTimer>) {
        match timer {
            SimonTimer::Unlight(i) => {
                if self.lit == Some(i) {
                    self.lit = None;
                }
                ctx.after(FLASH_GAP_MS, SimonTimer::Settle);
            }
            SimonTimer::Settle => self.flashing = false,
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.phase, Phase::GeneratedSequence | Phase::UserSequence)
    }

    fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    fn scores(&self) -> &ScoreBoard {
        &self.scores
    }
}

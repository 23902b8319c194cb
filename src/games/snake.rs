//! 4snakes
//!
//! Four snakes on a wrap-around screen; only one moves at a time. Eating a
//! food hands control to the snake of the food's colour, speeds the eater up
//! and grows it. Crashing into any body ends the round.
//!
//! Terminal precedence within one move: body collision (snakes in index
//! order, the mover's own first three cells excluded) is checked before food
//! pickup, so a move that does both is a crash.

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::{FOREGROUND_COLORS, next_background};
use crate::audio::Sound;
use crate::highscores::ScoreBoard;
use crate::input::{InputState, Key, Side, pointer_side};
use crate::persistence::Store;
use crate::sim::geom::{Rect, overlaps_any};
use crate::sim::registry::Registry;
use crate::sim::session::{Game, TickContext};

pub const SCREEN_WIDTH: f32 = 450.0;
pub const SCREEN_HEIGHT: f32 = 375.0;

/// Pointer presses above this line belong to the menu strip
pub const POINTER_DEAD_ZONE: f32 = 70.0;

const START_SPEED: f32 = 4.0;
const ACCELERATION: f32 = 0.1;
const TURN_ANGLE: f32 = PI / 18.0;
const IDLE_TURN_ANGLE: f32 = PI / 120.0;
/// Ticks without input before a snake starts wandering
const IDLE_AFTER_TICKS: u32 = 30;
/// Ticks a wander direction is kept
const IDLE_KEEP_TICKS: u32 = 30;

const HEAD_SIZE: f32 = 10.0;
const INITIAL_GROWTH: usize = 7;
const CELL_SIZE: f32 = 2.0;
/// Cells added per food, on top of the normal move
const FOOD_GROWTH: usize = 4;
/// Leading cells of the mover skipped by its own collision check
const NECK_CELLS: usize = 3;

const MAX_FOOD: usize = 3;
const FOOD_SIZE: f32 = 13.0;
const FOOD_LIFE: i32 = 300;
const FOOD_DELAY_MIN: u32 = 40;
const FOOD_DELAY_MAX: u32 = 90;
/// Foods blink during their last ticks
const FOOD_BLINK_FROM: i32 = 30;
const SPAWN_ATTEMPTS: usize = 1000;

const TONGUE_W: f32 = 4.0;
const TONGUE_H: f32 = 5.0;
const TONGUE_REACH: f32 = 1.3;

/// Burst effects on the crashed snake stop emitting after this
const EFFECT_MS: f64 = 1000.0;

const LEFT_KEYS: [Key; 2] = [Key::Left, Key::Char('a')];
const RIGHT_KEYS: [Key; 2] = [Key::Right, Key::Char('d')];

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Instructions shown, waiting for the first steering input
    FirstScreen,
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeTimer {
    /// Stop the crash bursts
    StopEffects,
}

/// One snake. `tail[0]` is the head.
#[derive(Debug, Clone, Serialize)]
pub struct Snake {
    pub num: usize,
    pub color: u32,
    pub angle: f32,
    pub speed: f32,
    pub tail: VecDeque<Rect>,
    pub active: bool,
    /// Gone once the snake crashed
    pub tongue: Option<Rect>,
    #[serde(skip)]
    idle_direction: f32,
    #[serde(skip)]
    idle_ticks: u32,
    #[serde(skip)]
    ticks_since_input: u32,
    #[serde(skip)]
    first_idle_change: bool,
}

impl Snake {
    fn new(num: usize, head: Rect, angle: f32, rng: &mut Pcg32) -> Self {
        let mut snake = Self {
            num,
            color: FOREGROUND_COLORS[num],
            angle,
            speed: START_SPEED,
            tail: VecDeque::from([head]),
            active: false,
            tongue: Some(Rect::new(0.0, 0.0, TONGUE_W, TONGUE_H)),
            idle_direction: random_direction(rng),
            idle_ticks: 0,
            ticks_since_input: 0,
            first_idle_change: true,
        };
        for _ in 0..INITIAL_GROWTH {
            let head = snake.head();
            let (dx, dy) = snake.step();
            snake
                .tail
                .push_front(Rect::new(head.x + dx, head.y + dy, HEAD_SIZE, HEAD_SIZE));
        }
        snake
    }

    pub fn head(&self) -> Rect {
        self.tail.front().copied().unwrap_or(Rect::new(0.0, 0.0, CELL_SIZE, CELL_SIZE))
    }

    fn step(&self) -> (f32, f32) {
        (self.speed * self.angle.cos(), self.speed * self.angle.sin())
    }

    /// Turn for held input; true if any steering input was held
    fn steer(&mut self, input: &InputState) -> bool {
        let side = pointer_side(input, SCREEN_WIDTH, POINTER_DEAD_ZONE);
        let mut steered = false;
        if input.any_down(&LEFT_KEYS) || side == Some(Side::Left) {
            self.angle -= TURN_ANGLE;
            steered = true;
        }
        if input.any_down(&RIGHT_KEYS) || side == Some(Side::Right) {
            self.angle += TURN_ANGLE;
            steered = true;
        }
        steered
    }

    /// Without input the snake wanders: after a while it starts turning,
    /// flipping direction every few ticks (the first flip comes sooner)
    fn wander(&mut self, steered: bool, rng: &mut Pcg32) {
        if steered {
            self.idle_direction = random_direction(rng);
            self.idle_ticks = 0;
            self.ticks_since_input = 0;
            self.first_idle_change = true;
            return;
        }
        self.ticks_since_input += 1;
        if self.ticks_since_input <= IDLE_AFTER_TICKS {
            return;
        }
        self.idle_ticks += 1;
        if self.idle_ticks > IDLE_KEEP_TICKS
            || (self.first_idle_change && self.idle_ticks > IDLE_KEEP_TICKS / 2)
        {
            self.first_idle_change = false;
            self.idle_ticks = 0;
            self.idle_direction = -self.idle_direction;
        }
        self.angle += IDLE_TURN_ANGLE * self.idle_direction;
    }

    /// Cell the head moves into this tick, wrapped onto the screen
    fn next_cell(&self) -> Rect {
        let head = self.head();
        let (dx, dy) = self.step();
        Rect::new(head.x + dx, head.y + dy, CELL_SIZE, CELL_SIZE)
            .wrapped(SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    fn place_tongue(&mut self, cell: &Rect) {
        if let Some(tongue) = &mut self.tongue {
            tongue.x = (cell.x + TONGUE_REACH * self.angle.cos()).rem_euclid(SCREEN_WIDTH);
            tongue.y = (cell.y + TONGUE_REACH * self.angle.sin()).rem_euclid(SCREEN_HEIGHT);
        }
    }

    /// Does `cell` hit this snake? The mover's neck doesn't count.
    fn hits(&self, cell: &Rect, mover: usize) -> bool {
        let skip = if self.num == mover { NECK_CELLS } else { 0 };
        overlaps_any(cell, self.tail.iter().skip(skip))
    }
}

fn random_direction(rng: &mut Pcg32) -> f32 {
    if rng.random_bool(0.5) { 1.0 } else { -1.0 }
}

#[derive(Debug, Clone, Serialize)]
pub struct Food {
    /// Snake that gets control when this is eaten
    pub num: usize,
    pub color: u32,
    pub pos: Rect,
    pub life: i32,
}

impl Food {
    /// Blinks off every fourth tick near the end of its life
    pub fn visible(&self) -> bool {
        !(self.life <= FOOD_BLINK_FROM && self.life % 4 == 1)
    }
}

/// Particle burst spawned per body cell on a crash
#[derive(Debug, Clone, Serialize)]
pub struct Burst {
    pub origin: Vec2,
    pub color: u32,
    pub acceleration: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snakes {
    pub phase: Phase,
    pub snakes: Vec<Snake>,
    /// Newest first
    pub foods: Vec<Food>,
    /// Ticks until the next food may spawn
    pub next_food: i64,
    pub background: u32,
    pub effects: Registry<Burst>,
    pub scores: ScoreBoard,
    #[serde(skip)]
    game_over_at: Option<f64>,
    #[serde(skip)]
    rng: Pcg32,
}

impl Snakes {
    pub fn active_snake(&self) -> Option<usize> {
        self.snakes.iter().position(|s| s.active)
    }

    pub fn set_active_snake(&mut self, num: usize) {
        for snake in &mut self.snakes {
            snake.active = snake.num == num;
        }
    }

    fn steering_held(input: &InputState) -> bool {
        input.any_down(&LEFT_KEYS)
            || input.any_down(&RIGHT_KEYS)
            || pointer_side(input, SCREEN_WIDTH, POINTER_DEAD_ZONE).is_some()
    }

    /// Move snake `i`; false if it crashed
    fn move_snake(&mut self, i: usize, ctx: &mut TickContext<'_, SnakeTimer>) -> bool {
        let steered = self.snakes[i].steer(ctx.input);
        self.snakes[i].wander(steered, &mut self.rng);

        let cell = self.snakes[i].next_cell();
        self.snakes[i].place_tongue(&cell);

        if self.snakes.iter().any(|s| s.hits(&cell, i)) {
            self.game_over(i, ctx);
            return false;
        }

        let eaten: Vec<usize> = self
            .foods
            .iter()
            .enumerate()
            .filter(|(_, food)| cell.overlaps(&food.pos))
            .map(|(idx, _)| idx)
            .collect();
        for idx in eaten {
            let num = self.foods[idx].num;
            self.foods[idx].life = -1;
            ctx.play(Sound::Eat);
            self.set_active_snake(num);
            self.scores.increase(1);
            self.snakes[i].speed += ACCELERATION;
            self.background = next_background(&mut self.rng, Some(self.background));
            ctx.host.set_background(self.background);
            for _ in 0..FOOD_GROWTH {
                self.snakes[i].tail.push_front(cell);
            }
            log::debug!("Snake {} ate food {}, score {}", i, num, self.scores.score);
        }

        let snake = &mut self.snakes[i];
        snake.tail.pop_back();
        snake.tail.push_front(cell);
        true
    }

    fn update_foods(&mut self) {
        self.next_food -= 1;
        if self.next_food <= 0 && self.foods.len() < MAX_FOOD {
            if let Some(food) = self.spawn_food() {
                self.foods.insert(0, food);
            }
            self.next_food = i64::from(self.rng.random_range(FOOD_DELAY_MIN..=FOOD_DELAY_MAX));
        }
        for food in &mut self.foods {
            food.life -= 1;
        }
        self.foods.retain(|food| food.life > 0);
    }

    /// A food for an inactive snake, on a free spot
    fn spawn_food(&mut self) -> Option<Food> {
        let mut num = 0;
        for _ in 0..100 {
            num = self.rng.random_range(0..self.snakes.len());
            if !self.snakes[num].active {
                break;
            }
        }

        for _ in 0..SPAWN_ATTEMPTS {
            let x = self.rng.random_range(0..=(SCREEN_WIDTH - FOOD_SIZE) as u32) as f32;
            let y = self.rng.random_range(0..=(SCREEN_HEIGHT - FOOD_SIZE) as u32) as f32;
            let pos = Rect::new(x, y, FOOD_SIZE, FOOD_SIZE);
            let taken = self.foods.iter().any(|f| f.pos.overlaps(&pos))
                || self.snakes.iter().any(|s| overlaps_any(&pos, &s.tail));
            if !taken {
                return Some(Food {
                    num,
                    color: FOREGROUND_COLORS[num],
                    pos,
                    life: FOOD_LIFE,
                });
            }
        }
        log::warn!("No room for food");
        None
    }

    fn game_over(&mut self, i: usize, ctx: &mut TickContext<'_, SnakeTimer>) {
        self.phase = Phase::GameOver;
        self.game_over_at = Some(ctx.now_ms);
        log::info!("Snake {} crashed, score {}", i, self.scores.label());

        let snake = &mut self.snakes[i];
        snake.tongue = None;
        for cell in &snake.tail {
            let acceleration = Vec2::new(
                self.rng.random_range(-200..=200) as f32,
                self.rng.random_range(-200..=200) as f32,
            );
            self.effects.insert(Burst {
                origin: cell.center(),
                color: snake.color,
                acceleration,
            });
        }
        ctx.after(EFFECT_MS, SnakeTimer::StopEffects);
        ctx.game_over(Sound::GameOver);
    }
}

impl Game for Snakes {
    type Timer = SnakeTimer;

    const NAME: &'static str = "4snakes";

    fn new(seed: u64, store: &Store) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let starts = [
            (Rect::new(51.0, 50.0, HEAD_SIZE, HEAD_SIZE), 0.0),
            (Rect::new(SCREEN_WIDTH - 70.0, 51.0, HEAD_SIZE, HEAD_SIZE), PI / 2.0),
            (
                Rect::new(SCREEN_WIDTH - 73.0, SCREEN_HEIGHT - 70.0, HEAD_SIZE, HEAD_SIZE),
                PI,
            ),
            (
                Rect::new(50.0, SCREEN_HEIGHT - 51.0, HEAD_SIZE, HEAD_SIZE),
                3.0 * PI / 2.0,
            ),
        ];
        let snakes: Vec<Snake> = starts
            .into_iter()
            .enumerate()
            .map(|(num, (head, angle))| Snake::new(num, head, angle, &mut rng))
            .collect();
        let background = next_background(&mut rng, None);

        let mut game = Self {
            phase: Phase::FirstScreen,
            snakes,
            foods: Vec::new(),
            next_food: 0,
            background,
            effects: Registry::new(),
            scores: ScoreBoard::load(store, Self::NAME, 0, 0),
            game_over_at: None,
            rng,
        };
        let first = game.rng.random_range(0..game.snakes.len());
        game.set_active_snake(first);
        game
    }

    fn begin(&mut self, ctx: &mut TickContext<'_, SnakeTimer>) {
        ctx.host.set_background(self.background);
    }

    fn tick(&mut self, ctx: &mut TickContext<'_, SnakeTimer>) {
        if self.phase != Phase::Playing && Self::steering_held(ctx.input) {
            match (self.phase, self.game_over_at) {
                (Phase::FirstScreen, _) => self.phase = Phase::Playing,
                (Phase::GameOver, Some(at)) if ctx.now_ms - at > ctx.settings.restart_grace_ms => {
                    ctx.request_restart();
                    return;
                }
                _ => {}
            }
        }

        if self.phase != Phase::Playing {
            return;
        }

        // Control may pass to a later snake mid-loop; that one moves too
        for i in 0..self.snakes.len() {
            if self.snakes[i].active && !self.move_snake(i, ctx) {
                return;
            }
        }
        self.update_foods();
    }

    fn timer(&mut self, timer: SnakeTimer, _ctx: &mut TickContext<'_, SnakeTimer>) {
        match timer {
            SnakeTimer::StopEffects => {
                log::debug!("Stopping {} bursts", self.effects.len());
                self.effects.clear();
            }
        }
    }

    fn is_active(&self) -> bool {
        self.phase == Phase::Playing
    }

    fn is_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    fn scores(&self) -> &ScoreBoard {
        &self.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::Arcade;
    use crate::input::InputEvent;
    use crate::platform::RecordingHost;

    fn arcade() -> Arcade<Snakes, RecordingHost> {
        Arcade::new(Store::memory(), RecordingHost::new(), 7, 0.0)
    }

    /// Snake 0 alone in play, heading right from (100, 100), no foods due
    fn staged(arcade: &mut Arcade<Snakes, RecordingHost>) {
        let game = arcade.session_mut().game_mut();
        game.phase = Phase::Playing;
        game.set_active_snake(0);
        game.foods.clear();
        game.next_food = 1000;
        let snake = &mut game.snakes[0];
        snake.angle = 0.0;
        snake.tail = (0..8)
            .map(|k| Rect::new(100.0 - 2.0 * k as f32, 100.0, CELL_SIZE, CELL_SIZE))
            .collect();
    }

    #[test]
    fn test_new_round() {
        let arcade = arcade();
        let game = arcade.game();
        assert_eq!(game.phase, Phase::FirstScreen);
        assert_eq!(game.snakes.len(), 4);
        assert!(game.snakes.iter().all(|s| s.tail.len() == INITIAL_GROWTH + 1));
        assert_eq!(game.snakes.iter().filter(|s| s.active).count(), 1);
        assert_eq!(game.scores.label(), "0/0");
    }

    #[test]
    fn test_first_screen_waits_for_steering() {
        let mut arcade = arcade();
        arcade.frame(100.0, 100.0, |_, _| {});
        assert_eq!(arcade.game().phase, Phase::FirstScreen);

        // Presses in the menu strip don't start the round
        arcade.input(InputEvent::PointerDown(Vec2::new(420.0, 40.0)), 110.0);
        arcade.frame(125.0, 25.0, |_, _| {});
        assert_eq!(arcade.game().phase, Phase::FirstScreen);
        arcade.input(InputEvent::PointerUp(Vec2::new(420.0, 40.0)), 120.0);

        arcade.input(InputEvent::KeyDown(Key::Left), 130.0);
        arcade.frame(150.0, 25.0, |_, _| {});
        assert_eq!(arcade.game().phase, Phase::Playing);
    }

    #[test]
    fn test_volume_icon_press_does_not_steer() {
        let mut arcade = arcade();
        // Inside the volume-down icon, below the steering dead zone
        let icon = Vec2::new(40.0, 75.0);
        arcade.input(InputEvent::PointerDown(icon), 0.0);
        assert!((arcade.menu().volume() - 0.3).abs() < 1e-6);
        assert!(arcade.input_state().pressed_pointer().is_none());

        arcade.frame(25.0, 25.0, |_, _| {});
        assert_eq!(arcade.game().phase, Phase::FirstScreen);

        arcade.input(InputEvent::PointerUp(icon), 30.0);
        assert!(!arcade.menu().is_holding_volume());
        arcade.frame(50.0, 25.0, |_, _| {});
        assert_eq!(arcade.game().phase, Phase::FirstScreen);
    }

    #[test]
    fn test_eating_switches_control() {
        let mut arcade = arcade();
        staged(&mut arcade);
        let game = arcade.session_mut().game_mut();
        game.foods.push(Food {
            num: 2,
            color: FOREGROUND_COLORS[2],
            pos: Rect::new(103.0, 95.0, FOOD_SIZE, FOOD_SIZE),
            life: FOOD_LIFE,
        });

        arcade.frame(25.0, 25.0, |_, _| {});

        let game = arcade.game();
        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.scores.score, 1);
        assert_eq!(game.active_snake(), Some(2));
        assert_eq!(game.snakes[0].tail.len(), 8 + FOOD_GROWTH);
        assert!((game.snakes[0].speed - (START_SPEED + ACCELERATION)).abs() < 1e-6);
        assert!(game.foods.is_empty());
        assert_eq!(arcade.host().plays(Sound::Eat), 1);
    }

    #[test]
    fn test_crash_wins_over_food() {
        let mut arcade = arcade();
        staged(&mut arcade);
        let game = arcade.session_mut().game_mut();
        // Snake 1's body lies across the next cell, and so does a food
        game.snakes[1].tail = VecDeque::from([Rect::new(103.0, 95.0, HEAD_SIZE, HEAD_SIZE)]);
        game.foods.push(Food {
            num: 3,
            color: FOREGROUND_COLORS[3],
            pos: Rect::new(103.0, 95.0, FOOD_SIZE, FOOD_SIZE),
            life: FOOD_LIFE,
        });

        arcade.frame(25.0, 25.0, |_, _| {});

        let game = arcade.game();
        assert_eq!(game.phase, Phase::GameOver);
        assert_eq!(game.scores.score, 0);
        assert_eq!(arcade.host().plays(Sound::Eat), 0);
        assert_eq!(arcade.host().plays(Sound::GameOver), 1);
        assert!(game.snakes[0].tongue.is_none());
        assert_eq!(game.effects.len(), 8);
    }

    #[test]
    fn test_neck_is_not_a_crash() {
        let mut arcade = arcade();
        staged(&mut arcade);
        for _ in 0..5 {
            arcade.frame(0.0, 25.0, |_, _| {});
        }
        assert_eq!(arcade.game().phase, Phase::Playing);
    }

    #[test]
    fn test_wrap_around() {
        let mut arcade = arcade();
        staged(&mut arcade);
        let game = arcade.session_mut().game_mut();
        game.snakes[0].tail = (0..8)
            .map(|k| Rect::new(SCREEN_WIDTH - 2.0 - 2.0 * k as f32, 200.0, CELL_SIZE, CELL_SIZE))
            .collect();
        arcade.frame(25.0, 25.0, |_, _| {});
        let head = arcade.game().snakes[0].head();
        assert!((head.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_effects_stop_after_a_second() {
        let mut arcade = arcade();
        staged(&mut arcade);
        arcade.session_mut().game_mut().snakes[1].tail =
            VecDeque::from([Rect::new(103.0, 95.0, HEAD_SIZE, HEAD_SIZE)]);
        arcade.frame(25.0, 25.0, |_, _| {});
        assert!(!arcade.game().effects.is_empty());

        arcade.poll_timers(1024.0);
        assert!(!arcade.game().effects.is_empty());
        arcade.poll_timers(1025.0);
        assert!(arcade.game().effects.is_empty());
        assert_eq!(arcade.session().id(), 1);
    }

    #[test]
    fn test_early_restart_after_grace() {
        let mut arcade = arcade();
        staged(&mut arcade);
        arcade.session_mut().game_mut().snakes[1].tail =
            VecDeque::from([Rect::new(103.0, 95.0, HEAD_SIZE, HEAD_SIZE)]);
        arcade.frame(25.0, 25.0, |_, _| {});
        assert_eq!(arcade.game().phase, Phase::GameOver);

        arcade.input(InputEvent::KeyDown(Key::Char('d')), 200.0);
        let report = arcade.frame(200.0, 25.0, |_, _| {});
        assert!(!report.restarted);

        let report = arcade.frame(600.0, 25.0, |_, _| {});
        assert!(report.restarted);
        assert_eq!(arcade.session().id(), 2);
        assert_eq!(arcade.game().phase, Phase::FirstScreen);
    }

    #[test]
    fn test_food_blink() {
        let mut food = Food {
            num: 0,
            color: 0,
            pos: Rect::new(0.0, 0.0, FOOD_SIZE, FOOD_SIZE),
            life: 28,
        };
        assert!(food.visible());
        food.life = 25;
        assert!(!food.visible());
        food.life = 33;
        assert!(food.visible());
    }

    #[test]
    fn test_foods_spawn_up_to_max() {
        let mut arcade = arcade();
        staged(&mut arcade);
        let game = arcade.session_mut().game_mut();
        game.next_food = 0;
        for _ in 0..400 {
            game.update_foods();
            assert!(game.foods.len() <= MAX_FOOD);
            assert!(game.foods.iter().all(|f| !game.snakes[f.num].active));
        }
    }
}

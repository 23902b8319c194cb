//! Twin squares
//!
//! Two squares run side by side along mirrored lanes, one hanging from the
//! top of the screen and one standing on the bottom. Each jumps on its own
//! key or on a press in its half of the screen. Tiles fall away behind the
//! camera; every few tiles carries a spike. Landing on a spike is fine,
//! running into its side ends the game, and so does leaving the screen.
//!
//! Lanes are simulated in lane-local coordinates: `height` is the distance
//! of a runner's near edge from its lane's surface, positive away from it.
//! [`Lane::world_y`] maps back to screen space.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::next_background;
use crate::audio::Sound;
use crate::highscores::ScoreBoard;
use crate::input::{InputState, Key, Side, pointer_side};
use crate::persistence::Store;
use crate::sim::geom::Rect;
use crate::sim::session::{Game, TickContext};

pub const SCREEN_WIDTH: f32 = 900.0;
pub const SCREEN_HEIGHT: f32 = 900.0;

pub const SIDE: f32 = 20.0;
/// Horizontal speed in px/s
const RUN_SPEED: f32 = 150.0;
/// Pull toward the lane surface in px/s²
const GRAVITY: f32 = 200.0;
const JUMP_SPEED: f32 = 100.0;
/// Time a jump spends in the air
const JUMP_TIME: f32 = 2.0 * JUMP_SPEED / GRAVITY;
const START_X: f32 = 60.0;
/// Runners drop in from these heights at the start
const START_HEIGHTS: [f32; 2] = [40.0, 60.0];

/// A tile is as wide as half a jump
pub const TILE_WIDTH: f32 = RUN_SPEED * JUMP_TIME * 0.5;
pub const TILE_HEIGHT: f32 = 20.0;
pub const SPIKE_WIDTH: f32 = 16.0;
pub const SPIKE_HEIGHT: f32 = 20.0;
/// Tile `i` carries a spike when `(i + 1) % SPIKE_EVERY == 0`
const SPIKE_EVERY: u64 = 11;

/// Camera left edge sits this far behind the bottom runner
const CAMERA_LEAD: f32 = 150.0;
/// Crumbling tiles drift away from the lane at this speed in px/s
const CRUMBLE_SPEED: f32 = 40.0;
const CRUMBLE_DELAY_MS: f32 = 100.0;
const CRUMBLE_FADE_MS: f32 = 2000.0;
const CRUMBLE_TURN_MS: f32 = 3000.0;
const SPIN_MS: f32 = 950.0;

/// Lane centre lines, top then bottom
const LANE_Y: [f32; 2] = [140.0, 840.0];
/// Lane `i` points its runner away from the screen edge
const LANE_SIGN: [f32; 2] = [-1.0, 1.0];
/// Runner `i` wears colour `i`, its obstacles the other one
pub const COLORS: [u32; 2] = [0xCD5C5C, 0xBDDA57];
/// Presses above this line belong to the menu strip
const POINTER_DEAD_ZONE: f32 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Playing,
    GameOver,
}

/// What ended the round, and for which runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    OutOfBounds(usize),
    Spike(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunnerState {
    Running,
    Jumping,
}

fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

fn ease_out_expo(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 { 1.0 } else { 1.0 - 2f32.powf(-10.0 * t) }
}

#[derive(Debug, Clone, Serialize)]
struct Spin {
    from: f32,
    to: f32,
    elapsed_ms: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Runner {
    pub index: usize,
    /// Centre x in world space
    pub x: f32,
    pub height: f32,
    /// Velocity away from the surface
    pub vh: f32,
    pub grounded: bool,
    pub state: RunnerState,
    /// Degrees
    pub angle: f32,
    pub color: u32,
    spin: Option<Spin>,
    #[serde(skip)]
    side_hit: bool,
}

impl Runner {
    fn new(index: usize) -> Self {
        Self {
            index,
            x: START_X,
            height: START_HEIGHTS[index],
            vh: 0.0,
            grounded: false,
            state: RunnerState::Running,
            angle: 0.0,
            color: COLORS[index],
            spin: None,
            side_hit: false,
        }
    }

    /// Integrate one step and resolve contacts with `lane`
    fn step(&mut self, lane: &Lane, dt: f32) {
        let prev_height = self.height;
        self.vh -= GRAVITY * dt;
        self.height += self.vh * dt;
        self.x += RUN_SPEED * dt;
        self.grounded = false;
        self.side_hit = false;

        for spike in lane.spikes.iter().filter(|s| !s.fallen) {
            if (self.x - spike.x).abs() >= (SIDE + SPIKE_WIDTH) / 2.0 {
                continue;
            }
            if self.height >= SPIKE_HEIGHT || self.height + SIDE <= 0.0 {
                continue;
            }
            if prev_height >= SPIKE_HEIGHT - 0.01 && self.vh <= 0.0 {
                self.height = SPIKE_HEIGHT;
                self.vh = 0.0;
                self.grounded = true;
            } else {
                self.side_hit = true;
            }
        }

        if !self.grounded && self.height <= 0.0 && prev_height >= 0.0 && lane.supports(self.x) {
            self.height = 0.0;
            self.vh = 0.0;
            self.grounded = true;
        }
    }

    /// Running/jumping transitions and the airborne spin
    fn update_state(&mut self, jump: bool, sign: f32, dt: f32) {
        if self.grounded {
            self.state = RunnerState::Running;
            self.spin = None;
            self.angle = 0.0;
        }
        if jump && self.grounded {
            self.state = RunnerState::Jumping;
            self.vh = JUMP_SPEED;
            self.start_spin(sign);
        }
        if !self.grounded && self.state == RunnerState::Running {
            self.start_spin(sign);
        }

        if let Some(spin) = &mut self.spin {
            spin.elapsed_ms += dt * 1000.0;
            self.angle = spin.from + (spin.to - spin.from) * ease_out_quad(spin.elapsed_ms / SPIN_MS);
        }
    }

    fn start_spin(&mut self, sign: f32) {
        if self.spin.is_none() {
            self.spin = Some(Spin {
                from: self.angle,
                to: self.angle + 180.0 * sign,
                elapsed_ms: 0.0,
            });
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.spin.is_some()
    }

    pub fn rect(&self, lane: &Lane) -> Rect {
        Rect::centered(Vec2::new(self.x, lane.world_y(self.height)), SIDE, SIDE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub index: u64,
    /// Centre x in world space
    pub x: f32,
    /// Time since the tile started to fall away
    pub crumble_ms: Option<f32>,
}

impl Tile {
    fn solid(&self) -> bool {
        self.crumble_ms.is_none()
    }

    pub fn alpha(&self) -> f32 {
        match self.crumble_ms {
            None => 1.0,
            Some(ms) => 1.0 - ease_out_quad((ms - CRUMBLE_DELAY_MS) / CRUMBLE_FADE_MS),
        }
    }

    /// Drift away from the lane surface
    pub fn offset(&self) -> f32 {
        self.crumble_ms.map_or(0.0, |ms| CRUMBLE_SPEED * ms / 1000.0)
    }

    /// Degrees, turning the opposite way in each lane
    pub fn angle(&self, lane: usize) -> f32 {
        let turn = if lane == 0 { 90.0 } else { -90.0 };
        match self.crumble_ms {
            None => 0.0,
            Some(ms) => turn * ease_out_expo((ms - CRUMBLE_DELAY_MS) / CRUMBLE_TURN_MS),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Spike {
    pub tile: u64,
    pub x: f32,
    /// Went down with its tile
    pub fallen: bool,
    #[serde(skip)]
    passed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lane {
    pub index: usize,
    pub sign: f32,
    pub ypos: f32,
    pub color: u32,
    pub tiles: VecDeque<Tile>,
    pub spikes: VecDeque<Spike>,
    #[serde(skip)]
    next_tile: u64,
}

impl Lane {
    fn new(index: usize) -> Self {
        Self {
            index,
            sign: LANE_SIGN[index],
            ypos: LANE_Y[index],
            color: COLORS[(index + 1) % 2],
            tiles: VecDeque::new(),
            spikes: VecDeque::new(),
            next_tile: 0,
        }
    }

    /// Screen y of the face runners stand on
    pub fn surface(&self) -> f32 {
        self.ypos - self.sign * TILE_HEIGHT / 2.0
    }

    /// Screen y of a runner's centre at `height`
    pub fn world_y(&self, height: f32) -> f32 {
        self.surface() - self.sign * (height + SIDE / 2.0)
    }

    fn supports(&self, x: f32) -> bool {
        self.tiles
            .iter()
            .any(|t| t.solid() && (t.x - x).abs() < (TILE_WIDTH + SIDE) / 2.0)
    }

    /// Lay tiles until `right_edge` is covered
    fn extend(&mut self, right_edge: f32) {
        while (self.next_tile as f32) * TILE_WIDTH - TILE_WIDTH / 2.0 <= right_edge {
            let index = self.next_tile;
            let x = index as f32 * TILE_WIDTH;
            self.tiles.push_back(Tile {
                index,
                x,
                crumble_ms: None,
            });
            if (index + 1) % SPIKE_EVERY == 0 {
                self.spikes.push_back(Spike {
                    tile: index,
                    x,
                    fallen: false,
                    passed: false,
                });
            }
            self.next_tile += 1;
        }
    }

    /// Crumble tiles behind the camera and drop those out of view
    fn update_tiles(&mut self, camera_x: f32, dt: f32) {
        for tile in self.tiles.iter_mut() {
            match &mut tile.crumble_ms {
                Some(ms) => *ms += dt * 1000.0,
                None if tile.x <= camera_x => tile.crumble_ms = Some(0.0),
                None => {}
            }
        }
        for spike in self.spikes.iter_mut() {
            if !spike.fallen && spike.x <= camera_x {
                spike.fallen = true;
            }
        }
        while self.tiles.front().is_some_and(|t| t.x + TILE_WIDTH < camera_x) {
            self.tiles.pop_front();
        }
        let first = self.tiles.front().map_or(self.next_tile, |t| t.index);
        while self.spikes.front().is_some_and(|s| s.tile < first) {
            self.spikes.pop_front();
        }
        self.extend(camera_x + SCREEN_WIDTH + TILE_WIDTH);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TwinSquares {
    pub phase: Phase,
    pub runners: Vec<Runner>,
    pub lanes: Vec<Lane>,
    /// World x of the screen's left edge
    pub camera_x: f32,
    pub background: u32,
    pub scores: ScoreBoard,
    pub end_reason: Option<EndReason>,
    /// Runners leave dust while on the ground
    pub dust: [bool; 2],
}

impl TwinSquares {
    fn jump_held(index: usize, input: &InputState) -> bool {
        let keys: &[Key] = if index == 0 {
            &[Key::Char('a'), Key::Left]
        } else {
            &[Key::Char('d'), Key::Right]
        };
        let side = if index == 0 { Side::Left } else { Side::Right };
        input.any_down(keys) || pointer_side(input, SCREEN_WIDTH, POINTER_DEAD_ZONE) == Some(side)
    }

    fn out_of_bounds(&self, index: usize) -> bool {
        let rect = self.runners[index].rect(&self.lanes[index]);
        if index == 0 {
            rect.center().y <= 0.0
        } else {
            rect.center().y + SIDE > SCREEN_HEIGHT
        }
    }

    fn end(&mut self, reason: EndReason, ctx: &mut TickContext<'_, ()>) {
        self.phase = Phase::GameOver;
        self.end_reason = Some(reason);
        self.dust = [false; 2];
        log::info!("Game over ({:?}), score {}", reason, self.scores.label());
        ctx.host.flash_camera(100.0);
        ctx.game_over(Sound::Lose);
    }

    fn count_passed_spikes(&mut self, ctx: &mut TickContext<'_, ()>) {
        let mut passed = 0;
        for (runner, lane) in self.runners.iter().zip(self.lanes.iter_mut()) {
            for spike in lane.spikes.iter_mut().filter(|s| !s.passed) {
                if runner.x - SIDE / 2.0 > spike.x + SPIKE_WIDTH / 2.0 {
                    spike.passed = true;
                    passed += 1;
                }
            }
        }
        if passed > 0 {
            self.scores.increase(passed);
            if self.scores.take_high_score_announcement() {
                ctx.play(Sound::Applause);
            }
        }
    }
}

impl Game for TwinSquares {
    type Timer = ();

    const NAME: &'static str = "twin_squares";

    fn new(seed: u64, store: &Store) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let camera_x = START_X - CAMERA_LEAD;
        let mut lanes: Vec<Lane> = (0..2).map(Lane::new).collect();
        for lane in lanes.iter_mut() {
            lane.extend(camera_x + SCREEN_WIDTH + TILE_WIDTH);
        }
        Self {
            phase: Phase::Playing,
            runners: (0..2).map(Runner::new).collect(),
            lanes,
            camera_x,
            background: next_background(&mut rng, None),
            scores: ScoreBoard::load(store, Self::NAME, 0, 0),
            end_reason: None,
            dust: [false; 2],
        }
    }

    fn begin(&mut self, ctx: &mut TickContext<'_, ()>) {
        ctx.host.set_background(self.background);
    }

    fn tick(&mut self, ctx: &mut TickContext<'_, ()>) {
        if self.phase == Phase::GameOver {
            return;
        }
        let dt = ctx.dt;

        for (runner, lane) in self.runners.iter_mut().zip(self.lanes.iter()) {
            runner.step(lane, dt);
        }
        self.camera_x = self.runners[1].x - CAMERA_LEAD;
        for lane in self.lanes.iter_mut() {
            lane.update_tiles(self.camera_x, dt);
        }

        for i in 0..self.runners.len() {
            let jump = Self::jump_held(i, ctx.input);
            let sign = self.lanes[i].sign;
            self.runners[i].update_state(jump, sign, dt);
            self.dust[i] = self.runners[i].grounded;

            if self.out_of_bounds(i) {
                self.end(EndReason::OutOfBounds(i), ctx);
                return;
            }
            if self.runners[i].side_hit {
                self.end(EndReason::Spike(i), ctx);
                return;
            }
        }

        self.count_passed_spikes(ctx);
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

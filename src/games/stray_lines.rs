//! Stray lines
//!
//! Balls drift in from the screen edges toward the middle. The player draws
//! short deflector lines, from a limited stock, to steer each ball into the
//! target of its colour. A ball leaving the screen or hitting a target of
//! another colour ends the game; clearing every ball starts the next level
//! with more balls.
//!
//! Contact *detection* belongs to the host's physics; the host reports
//! touching pairs by registry id through [`Game::collision`]. Hosts without
//! one use the overlap test in [`Game::contacts`]. The game resolves them:
//! - ball + target: colour mismatch is checked before scoring
//! - ball + line or ball + ball: bounce, camera shake and vibration
//! - anything untagged or already removed: ignored
//!
//! Each tick checks out-of-bounds balls before level completion.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::{FOREGROUND_COLORS, next_background};
use crate::audio::Sound;
use crate::highscores::ScoreBoard;
use crate::input::InputEvent;
use crate::persistence::Store;
use crate::sim::geom::{Rect, Segment, clamp_to_screen};
use crate::sim::registry::{EntityId, Registry};
use crate::sim::session::{Game, TickContext};

pub const SCREEN_WIDTH: f32 = 900.0;
pub const SCREEN_HEIGHT: f32 = 900.0;

pub const BALL_RADIUS: f32 = 9.0;
/// New balls keep at least this far apart
const BALL_SPACING: f32 = BALL_RADIUS * 8.0;
/// Balls aim at the middle, off by up to this much on each axis
const AIM_OFFSET: i32 = 270;
const BALL_SPEED_MIN: f32 = 1.3;
const BALL_SPEED_MAX: f32 = 1.8;
/// Ball `n` of a level launches after `n` times a delay in this range
const LAUNCH_DELAY_MS: std::ops::RangeInclusive<u32> = 2100..=2500;

pub const TARGET_SIDE: f32 = 26.0;
/// Targets stay this far from the screen edges
const TARGET_MARGIN: u32 = 230;
const TARGET_SPACING: f32 = TARGET_SIDE * 4.0;
/// Colour of a target whose balls are all home
pub const RETIRED_COLOR: u32 = 0x000000;

pub const LINE_WIDTH: f32 = 3.3;
pub const LINE_MAX_LENGTH: f32 = 170.0;
const LINE_MIN_LENGTH: f32 = 15.0;
const LINES_PER_BALL: u32 = 6;

const PLACEMENT_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrayTimer {
    /// Give a waiting ball its velocity
    Launch(EntityId),
}

#[derive(Debug, Clone, Serialize)]
pub struct Ball {
    pub pos: Vec2,
    /// Zero until launched
    pub vel: Vec2,
    pub color: u32,
    #[serde(skip)]
    launch_vel: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub center: Vec2,
    pub color: u32,
    /// No ball of its colour is left; it is only an obstacle now
    pub retired: bool,
}

impl Target {
    pub fn rect(&self) -> Rect {
        Rect::centered(self.center, TARGET_SIDE, TARGET_SIDE)
    }
}

/// Identity tag of a registered body
#[derive(Debug, Clone, Serialize)]
pub enum Body {
    Ball(Ball),
    Target(Target),
    UserLine(Segment),
}

#[derive(Debug, Clone, Serialize)]
pub struct StrayLines {
    pub phase: Phase,
    pub level: u32,
    pub bodies: Registry<Body>,
    /// Lines the player may still draw this level
    pub remaining_lines: u32,
    /// Line being dragged, clamped to the maximum length
    pub preview: Option<Segment>,
    pub background: u32,
    pub scores: ScoreBoard,
    #[serde(skip)]
    drag_start: Option<Vec2>,
    #[serde(skip)]
    rng: Pcg32,
}

fn clamp_point(p: Vec2) -> Vec2 {
    clamp_to_screen(p, SCREEN_WIDTH, SCREEN_HEIGHT)
}

/// Both ends on the same screen edge
fn along_edge(from: Vec2, to: Vec2) -> bool {
    let right = SCREEN_WIDTH - 1.0;
    let bottom = SCREEN_HEIGHT - 1.0;
    (from.x == 0.0 && to.x == 0.0)
        || (from.x == right && to.x == right)
        || (from.y == 0.0 && to.y == 0.0)
        || (from.y == bottom && to.y == bottom)
}

/// Mirror `vel` off the line through `segment`
fn reflect(vel: Vec2, segment: &Segment) -> Vec2 {
    let d = segment.to - segment.from;
    let n = Vec2::new(-d.y, d.x).normalize_or_zero();
    vel - 2.0 * vel.dot(n) * n
}

impl StrayLines {
    pub fn balls(&self) -> impl Iterator<Item = (EntityId, &Ball)> {
        self.bodies.iter().filter_map(|(id, body)| match body {
            Body::Ball(ball) => Some((id, ball)),
            _ => None,
        })
    }

    pub fn targets(&self) -> impl Iterator<Item = (EntityId, &Target)> {
        self.bodies.iter().filter_map(|(id, body)| match body {
            Body::Target(target) => Some((id, target)),
            _ => None,
        })
    }

    pub fn user_lines(&self) -> impl Iterator<Item = (EntityId, &Segment)> {
        self.bodies.iter().filter_map(|(id, body)| match body {
            Body::UserLine(segment) => Some((id, segment)),
            _ => None,
        })
    }

    fn ball_mut(&mut self, id: EntityId) -> Option<&mut Ball> {
        match self.bodies.get_mut(id) {
            Some(Body::Ball(ball)) => Some(ball),
            _ => None,
        }
    }

    /// Set up balls, targets and line stock for the current level
    fn start_level(&mut self, ctx: &mut TickContext<'_, StrayTimer>) {
        self.bodies
            .retain(|_, body| !matches!(body, Body::UserLine(_) | Body::Target(_)));
        let balls = self.create_balls();
        self.create_targets();
        self.remaining_lines = balls.len() as u32 * LINES_PER_BALL;
        log::info!("Level {}: {} balls", self.level, balls.len());

        for (id, delay) in balls {
            ctx.after(delay, StrayTimer::Launch(id));
        }
    }

    fn create_balls(&mut self) -> Vec<(EntityId, f64)> {
        let count = ((self.level as f64).sqrt().floor() as usize).max(1);
        let mut placed: Vec<(EntityId, f64)> = Vec::with_capacity(count);
        let mut attempts = 0;

        while placed.len() < count && attempts < PLACEMENT_ATTEMPTS {
            attempts += 1;
            let margin = (BALL_RADIUS * 2.0) as i32;
            let pos = match self.rng.random_range(0..4) {
                0 => Vec2::new(margin as f32, self.rng.random_range(margin..=SCREEN_HEIGHT as i32) as f32),
                1 => Vec2::new(
                    SCREEN_WIDTH - margin as f32,
                    self.rng.random_range(margin..=SCREEN_HEIGHT as i32) as f32,
                ),
                2 => Vec2::new(self.rng.random_range(margin..=SCREEN_WIDTH as i32) as f32, margin as f32),
                _ => Vec2::new(
                    self.rng.random_range(margin..=SCREEN_WIDTH as i32) as f32,
                    SCREEN_HEIGHT - margin as f32,
                ),
            };
            let aim = Vec2::new(
                SCREEN_WIDTH / 2.0 + self.rng.random_range(-AIM_OFFSET..=AIM_OFFSET) as f32,
                SCREEN_HEIGHT / 2.0 + self.rng.random_range(-AIM_OFFSET..=AIM_OFFSET) as f32,
            );
            let dir = (aim - pos).normalize_or_zero();
            let speed = self.rng.random_range(BALL_SPEED_MIN..BALL_SPEED_MAX);
            let color = FOREGROUND_COLORS[self.rng.random_range(0..FOREGROUND_COLORS.len())];

            let too_near = self
                .balls()
                .any(|(_, other)| other.pos.distance(pos) < BALL_SPACING);
            if too_near {
                continue;
            }

            let delay = placed.len() as f64 * f64::from(self.rng.random_range(LAUNCH_DELAY_MS));
            let id = self.bodies.insert(Body::Ball(Ball {
                pos,
                vel: Vec2::ZERO,
                color,
                launch_vel: dir * speed,
            }));
            placed.push((id, delay));
        }
        placed
    }

    /// One target per distinct ball colour, in order of first appearance
    fn create_targets(&mut self) {
        let mut colors: Vec<u32> = Vec::new();
        for (_, ball) in self.balls() {
            if !colors.contains(&ball.color) {
                colors.push(ball.color);
            }
        }

        for color in colors {
            for _ in 0..PLACEMENT_ATTEMPTS {
                let center = Vec2::new(
                    self.rng.random_range(TARGET_MARGIN..=SCREEN_WIDTH as u32 - TARGET_MARGIN) as f32,
                    self.rng.random_range(TARGET_MARGIN..=SCREEN_HEIGHT as u32 - TARGET_MARGIN) as f32,
                );
                let too_near = self
                    .targets()
                    .any(|(_, other)| other.center.distance(center) < TARGET_SPACING);
                if too_near {
                    continue;
                }
                self.bodies.insert(Body::Target(Target {
                    center,
                    color,
                    retired: false,
                }));
                break;
            }
        }
    }

    fn next_level(&mut self, ctx: &mut TickContext<'_, StrayTimer>) {
        self.level += 1;
        self.start_level(ctx);
    }

    fn game_over(&mut self, ctx: &mut TickContext<'_, StrayTimer>) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.phase = Phase::GameOver;
        self.drag_start = None;
        self.preview = None;
        log::info!("Game over at level {}, score {}", self.level, self.scores.label());
        ctx.host.flash_camera(100.0);
        ctx.game_over(Sound::Lose);
    }

    fn ball_out_of_bounds(ball: &Ball) -> bool {
        ball.pos.x + BALL_RADIUS < 0.0
            || ball.pos.x - BALL_RADIUS > SCREEN_WIDTH
            || ball.pos.y + BALL_RADIUS < 0.0
            || ball.pos.y - BALL_RADIUS > SCREEN_HEIGHT
    }

    fn finish_line(&mut self, to: Vec2, ctx: &mut TickContext<'_, StrayTimer>) {
        self.preview = None;
        let Some(from) = self.drag_start.take() else {
            return;
        };
        let to = clamp_point(to);
        let segment = Segment::new(from, to).clamped(LINE_MAX_LENGTH);
        if segment.length() < LINE_MIN_LENGTH || along_edge(from, to) {
            return;
        }
        if self.remaining_lines == 0 {
            ctx.host.shake_camera(100.0, 0.005);
            ctx.host.vibrate(&[50, 70, 50]);
            return;
        }
        self.remaining_lines -= 1;
        let id = self.bodies.insert(Body::UserLine(segment));
        log::debug!("Line {:?} drawn, {} left", id, self.remaining_lines);
    }

    fn ball_hits_target(
        &mut self,
        ball_id: EntityId,
        target_id: EntityId,
        ctx: &mut TickContext<'_, StrayTimer>,
    ) {
        let (Some(Body::Ball(ball)), Some(Body::Target(target))) =
            (self.bodies.get(ball_id), self.bodies.get(target_id))
        else {
            return;
        };
        let (ball_color, target_color) = (ball.color, target.color);

        self.background = next_background(&mut self.rng, Some(self.background));
        ctx.host.set_background(self.background);

        if ball_color != target_color {
            self.game_over(ctx);
            return;
        }

        self.scores.increase(1);
        if self.scores.take_high_score_announcement() {
            ctx.play(Sound::Applause);
        }
        self.bodies.remove(ball_id);

        let color_left = self.balls().any(|(_, b)| b.color == target_color);
        if !color_left {
            if let Some(Body::Target(target)) = self.bodies.get_mut(target_id) {
                target.retired = true;
                target.color = RETIRED_COLOR;
            }
        }
    }

    fn bounce(ctx: &mut TickContext<'_, StrayTimer>) {
        ctx.host.shake_camera(40.0, 0.005);
        ctx.host.vibrate(&[100]);
    }
}

impl Game for StrayLines {
    type Timer = StrayTimer;

    const NAME: &'static str = "stray_lines";

    fn new(seed: u64, store: &Store) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let background = next_background(&mut rng, None);
        Self {
            phase: Phase::Playing,
            level: 0,
            bodies: Registry::new(),
            remaining_lines: 0,
            preview: None,
            background,
            scores: ScoreBoard::load(store, Self::NAME, 0, 1),
            drag_start: None,
            rng,
        }
    }

    fn begin(&mut self, ctx: &mut TickContext<'_, StrayTimer>) {
        ctx.host.set_background(self.background);
        self.start_level(ctx);
    }

    fn tick(&mut self, ctx: &mut TickContext<'_, StrayTimer>) {
        if self.phase == Phase::GameOver {
            return;
        }

        for (_, body) in self.bodies.iter_mut() {
            if let Body::Ball(ball) = body {
                ball.pos += ball.vel;
            }
        }

        if self.balls().any(|(_, ball)| Self::ball_out_of_bounds(ball)) {
            self.game_over(ctx);
            return;
        }

        if self.balls().next().is_none() {
            self.next_level(ctx);
        }
    }

    fn input(&mut self, event: &InputEvent, ctx: &mut TickContext<'_, StrayTimer>) {
        if self.phase == Phase::GameOver {
            return;
        }
        match *event {
            InputEvent::PointerDown(p) => {
                if self.drag_start.is_none() {
                    self.drag_start = Some(clamp_point(p));
                }
            }
            InputEvent::PointerMove(p) => {
                if let Some(from) = self.drag_start {
                    self.preview = Some(Segment::new(from, clamp_point(p)).clamped(LINE_MAX_LENGTH));
                }
            }
            InputEvent::PointerUp(p) => self.finish_line(p, ctx),
            _ => {}
        }
    }

    fn timer(&mut self, timer: StrayTimer, _ctx: &mut TickContext<'_, StrayTimer>) {
        match timer {
            StrayTimer::Launch(id) => {
                if let Some(ball) = self.ball_mut(id) {
                    ball.vel = ball.launch_vel;
                    log::debug!("Ball {:?} launched", id);
                }
            }
        }
    }

    fn collision(&mut self, a: EntityId, b: EntityId, ctx: &mut TickContext<'_, StrayTimer>) {
        if self.phase == Phase::GameOver {
            return;
        }
        match (self.bodies.get(a), self.bodies.get(b)) {
            (Some(Body::Ball(_)), Some(Body::Target(_))) => self.ball_hits_target(a, b, ctx),
            (Some(Body::Target(_)), Some(Body::Ball(_))) => self.ball_hits_target(b, a, ctx),
            (Some(Body::Ball(_)), Some(Body::UserLine(segment)))
            | (Some(Body::UserLine(segment)), Some(Body::Ball(_))) => {
                let segment = *segment;
                let ball_id = if matches!(self.bodies.get(a), Some(Body::Ball(_))) { a } else { b };
                if let Some(ball) = self.ball_mut(ball_id) {
                    ball.vel = reflect(ball.vel, &segment);
                }
                Self::bounce(ctx);
            }
            (Some(Body::Ball(first)), Some(Body::Ball(second))) => {
                let (va, vb) = (first.vel, second.vel);
                if let Some(ball) = self.ball_mut(a) {
                    ball.vel = vb;
                }
                if let Some(ball) = self.ball_mut(b) {
                    ball.vel = va;
                }
                Self::bounce(ctx);
            }
            _ => log::debug!("Ignoring contact {:?}/{:?}", a, b),
        }
    }

    fn contacts(&self) -> Vec<(EntityId, EntityId)> {
        let mut pairs = Vec::new();
        let balls: Vec<(EntityId, &Ball)> = self.balls().collect();
        for (i, (ball_id, ball)) in balls.iter().enumerate() {
            for (other_id, other) in &balls[i + 1..] {
                if ball.pos.distance(other.pos) < BALL_RADIUS * 2.0 {
                    pairs.push((*ball_id, *other_id));
                }
            }
            for (id, body) in self.bodies.iter() {
                let touching = match body {
                    Body::Target(target) => {
                        let r = target.rect();
                        let nearest = ball
                            .pos
                            .clamp(Vec2::new(r.x, r.y), Vec2::new(r.right(), r.bottom()));
                        nearest.distance(ball.pos) < BALL_RADIUS
                    }
                    Body::UserLine(segment) => {
                        let d = segment.to - segment.from;
                        let t = if d.length_squared() > 0.0 {
                            ((ball.pos - segment.from).dot(d) / d.length_squared()).clamp(0.0, 1.0)
                        } else {
                            0.0
                        };
                        let nearest = segment.from + d * t;
                        nearest.distance(ball.pos) < BALL_RADIUS + LINE_WIDTH / 2.0
                    }
                    Body::Ball(_) => false,
                };
                if touching {
                    pairs.push((*ball_id, id));
                }
            }
        }
        pairs
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
    use crate::platform::{HostCall, RecordingHost};
    use crate::sim::registry::ContactTracker;

    fn arcade() -> Arcade<StrayLines, RecordingHost> {
        Arcade::new(Store::memory(), RecordingHost::new(), 5, 0.0)
    }

    fn only_ball(game: &StrayLines) -> EntityId {
        let ids: Vec<EntityId> = game.balls().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 1);
        ids[0]
    }

    fn only_target(game: &StrayLines) -> EntityId {
        let ids: Vec<EntityId> = game.targets().map(|(id, _)| id).collect();
        assert_eq!(ids.len(), 1);
        ids[0]
    }

    /// Park the ball in the middle of the screen so it can't leave
    fn park_ball(arcade: &mut Arcade<StrayLines, RecordingHost>) -> EntityId {
        let game = arcade.session_mut().game_mut();
        let id = only_ball(game);
        if let Some(ball) = game.ball_mut(id) {
            ball.pos = Vec2::new(450.0, 450.0);
            ball.launch_vel = Vec2::ZERO;
            ball.vel = Vec2::ZERO;
        }
        id
    }

    fn draw(arcade: &mut Arcade<StrayLines, RecordingHost>, from: Vec2, to: Vec2, now: f64) {
        arcade.input(InputEvent::PointerDown(from), now);
        arcade.input(InputEvent::PointerMove(to), now);
        arcade.input(InputEvent::PointerUp(to), now);
    }

    #[test]
    fn test_first_level() {
        let arcade = arcade();
        let game = arcade.game();
        assert_eq!(game.level, 0);
        let ball_id = only_ball(game);
        let target_id = only_target(game);
        let (Some(Body::Ball(ball)), Some(Body::Target(target))) =
            (game.bodies.get(ball_id), game.bodies.get(target_id))
        else {
            panic!("missing bodies");
        };
        assert_eq!(ball.color, target.color);
        assert_eq!(ball.vel, Vec2::ZERO);
        assert!((230.0..=670.0).contains(&target.center.x));
        assert_eq!(game.remaining_lines, LINES_PER_BALL);
        assert_eq!(game.scores.label(), "0/1");
    }

    #[test]
    fn test_first_ball_launches_at_once() {
        let mut arcade = arcade();
        arcade.frame(25.0, 25.0, |_, _| {});
        arcade.frame(50.0, 25.0, |_, _| {});
        let game = arcade.game();
        let (_, ball) = game.balls().next().expect("ball");
        let speed = ball.vel.length();
        assert!((BALL_SPEED_MIN..BALL_SPEED_MAX + 1e-4).contains(&speed));
    }

    #[test]
    fn test_line_rules() {
        let mut arcade = arcade();
        park_ball(&mut arcade);

        // Too short
        draw(&mut arcade, Vec2::new(300.0, 300.0), Vec2::new(305.0, 305.0), 0.0);
        assert_eq!(arcade.game().user_lines().count(), 0);

        // Along the left edge, after clamping
        draw(&mut arcade, Vec2::new(-20.0, 300.0), Vec2::new(-5.0, 500.0), 0.0);
        assert_eq!(arcade.game().user_lines().count(), 0);

        // Long drags are cut to the maximum length
        draw(&mut arcade, Vec2::new(100.0, 600.0), Vec2::new(600.0, 600.0), 0.0);
        let game = arcade.game();
        let (_, line) = game.user_lines().next().expect("line");
        assert!((line.length() - LINE_MAX_LENGTH).abs() < 1e-3);
        assert_eq!(game.remaining_lines, LINES_PER_BALL - 1);
        assert!(game.preview.is_none());
    }

    #[test]
    fn test_empty_stock_shakes() {
        let mut arcade = arcade();
        park_ball(&mut arcade);
        arcade.session_mut().game_mut().remaining_lines = 0;
        draw(&mut arcade, Vec2::new(100.0, 600.0), Vec2::new(200.0, 600.0), 0.0);
        assert_eq!(arcade.game().user_lines().count(), 0);
        let host = arcade.host();
        assert_eq!(host.count(|c| *c == HostCall::Shake), 1);
        assert_eq!(host.count(|c| *c == HostCall::Vibrate(vec![50, 70, 50])), 1);
    }

    #[test]
    fn test_matching_target_scores_and_next_level() {
        let mut arcade = arcade();
        let ball = park_ball(&mut arcade);
        let target = only_target(arcade.game());
        draw(&mut arcade, Vec2::new(100.0, 600.0), Vec2::new(200.0, 600.0), 0.0);

        arcade.collision(target, ball, 10.0);
        let game = arcade.game();
        assert_eq!(game.scores.score, 1);
        assert!(game.balls().next().is_none());
        let (_, t) = game.targets().next().expect("target");
        assert!(t.retired);

        arcade.frame(25.0, 25.0, |_, _| {});
        let game = arcade.game();
        assert_eq!(game.level, 1);
        assert_eq!(game.balls().count(), 1);
        assert_eq!(game.user_lines().count(), 0);
        assert_eq!(game.remaining_lines, LINES_PER_BALL);
        assert_eq!(game.phase, Phase::Playing);
    }

    #[test]
    fn test_wrong_target_ends_game_without_scoring() {
        let mut arcade = arcade();
        let ball = park_ball(&mut arcade);
        let target = only_target(arcade.game());
        if let Some(Body::Target(t)) = arcade.session_mut().game_mut().bodies.get_mut(target) {
            t.color = 0x123456;
        }
        arcade.collision(ball, target, 10.0);
        let game = arcade.game();
        assert_eq!(game.phase, Phase::GameOver);
        assert_eq!(game.scores.score, 0);
        assert_eq!(game.balls().count(), 1);
        assert_eq!(arcade.host().plays(Sound::Lose), 1);
    }

    #[test]
    fn test_unknown_contacts_ignored() {
        let mut arcade = arcade();
        let ball = park_ball(&mut arcade);
        arcade.collision(ball, EntityId(999), 0.0);
        arcade.collision(EntityId(998), EntityId(999), 0.0);
        assert_eq!(arcade.game().phase, Phase::Playing);
        assert_eq!(arcade.game().balls().count(), 1);
        assert_eq!(arcade.host().count(|c| matches!(c, HostCall::Shake | HostCall::Vibrate(_))), 0);
    }

    #[test]
    fn test_out_of_bounds_before_level_clear() {
        let mut arcade = arcade();
        let id = park_ball(&mut arcade);
        if let Some(ball) = arcade.session_mut().game_mut().ball_mut(id) {
            ball.pos = Vec2::new(-30.0, 450.0);
        }
        arcade.frame(25.0, 25.0, |_, _| {});
        let game = arcade.game();
        assert_eq!(game.phase, Phase::GameOver);
        assert_eq!(game.level, 0);
    }

    #[test]
    fn test_line_bounce() {
        let mut arcade = arcade();
        let id = park_ball(&mut arcade);
        draw(&mut arcade, Vec2::new(300.0, 440.0), Vec2::new(300.0, 460.0), 0.0);
        let line = arcade.game().user_lines().map(|(id, _)| id).next().expect("line");
        if let Some(ball) = arcade.session_mut().game_mut().ball_mut(id) {
            ball.vel = Vec2::new(-1.5, 0.5);
        }
        arcade.collision(line, id, 0.0);
        let game = arcade.game();
        let (_, ball) = game.balls().next().expect("ball");
        assert!((ball.vel - Vec2::new(1.5, 0.5)).length() < 1e-5);
        assert_eq!(arcade.host().count(|c| *c == HostCall::Vibrate(vec![100])), 1);
    }

    #[test]
    fn test_contacts_start_once() {
        let mut arcade = arcade();
        let ball = park_ball(&mut arcade);
        let target = only_target(arcade.game());
        let center = arcade.game().targets().next().map(|(_, t)| t.center).expect("target");
        if let Some(b) = arcade.session_mut().game_mut().ball_mut(ball) {
            b.pos = center + Vec2::new(TARGET_SIDE / 2.0 + BALL_RADIUS - 1.0, 0.0);
        }

        let mut tracker = ContactTracker::new();
        let game = arcade.game();
        assert_eq!(tracker.begin(game.contacts()), vec![(ball.min(target), ball.max(target))]);
        assert!(tracker.begin(game.contacts()).is_empty());
        assert!(tracker.begin(Vec::new()).is_empty());
    }

    #[test]
    fn test_detected_contact_scores_once() {
        let mut arcade = arcade();
        let ball = park_ball(&mut arcade);
        let center = arcade.game().targets().next().map(|(_, t)| t.center).expect("target");
        if let Some(b) = arcade.session_mut().game_mut().ball_mut(ball) {
            b.pos = center + Vec2::new(0.0, TARGET_SIDE / 2.0 + BALL_RADIUS - 2.0);
        }
        assert_eq!(arcade.detect_contacts(0.0), 1);
        assert_eq!(arcade.detect_contacts(0.0), 0);
        assert_eq!(arcade.game().scores.score, 1);
    }

    #[test]
    fn test_long_frame_checks_contacts_every_tick() {
        let mut arcade = arcade();
        arcade.set_contact_detection(true);
        let ball = park_ball(&mut arcade);
        let target = only_target(arcade.game());
        let game = arcade.session_mut().game_mut();
        if let Some(Body::Target(t)) = game.bodies.get_mut(target) {
            t.center = Vec2::new(440.0, 450.0);
            t.color = 0x123456;
        }
        if let Some(b) = game.ball_mut(ball) {
            b.pos = Vec2::new(400.0, 450.0);
            b.launch_vel = Vec2::new(1.8, 0.0);
        }

        // The ball would be past the target by the end of this frame
        let report = arcade.frame(900.0, 900.0, |_, _| {});
        assert_eq!(report.ticks, 36);
        assert_eq!(report.contacts, 1);
        let game = arcade.game();
        assert_eq!(game.phase, Phase::GameOver);
        assert_eq!(game.scores.score, 0);
        assert_eq!(arcade.host().plays(Sound::Lose), 1);
    }

    #[test]
    fn test_contact_detection_is_off_by_default() {
        let mut arcade = arcade();
        let ball = park_ball(&mut arcade);
        let center = arcade.game().targets().next().map(|(_, t)| t.center).expect("target");
        if let Some(b) = arcade.session_mut().game_mut().ball_mut(ball) {
            b.pos = center;
        }
        let report = arcade.frame(25.0, 25.0, |_, _| {});
        assert_eq!(report.contacts, 0);
        assert_eq!(arcade.game().scores.score, 0);
    }
}

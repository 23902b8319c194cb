//! One play-through of a game
//!
//! A session owns the game state, its frame driver and every timer the game
//! scheduled. Restarting tears the whole session down and builds a new one,
//! so nothing from the old play-through can fire into the new one.

use std::fmt;

use crate::audio::Sound;
use crate::highscores::ScoreBoard;
use crate::input::{InputEvent, InputState};
use crate::menu::MenuState;
use crate::persistence::Store;
use crate::platform::Host;
use crate::settings::Settings;

use super::frame::FrameDriver;
use super::registry::{ContactTracker, EntityId};
use super::timers::{TimerHandle, TimerQueue};

/// A game's state machine, driven by fixed ticks and discrete events
pub trait Game {
    /// Timer payloads the game schedules for itself
    type Timer: Clone + fmt::Debug;

    /// Name, also the storage key for the game's save
    const NAME: &'static str;

    /// Fresh round state for a new session
    fn new(seed: u64, store: &Store) -> Self;

    /// Called once when the session starts, before any tick
    fn begin(&mut self, _ctx: &mut TickContext<'_, Self::Timer>) {}

    /// One fixed-step simulation advance
    fn tick(&mut self, ctx: &mut TickContext<'_, Self::Timer>);

    /// Discrete input not consumed by the menu overlay
    fn input(&mut self, _event: &InputEvent, _ctx: &mut TickContext<'_, Self::Timer>) {}

    /// A timer this game scheduled came due
    fn timer(&mut self, _timer: Self::Timer, _ctx: &mut TickContext<'_, Self::Timer>) {}

    /// The host's physics reported two registered objects touching
    fn collision(&mut self, _a: EntityId, _b: EntityId, _ctx: &mut TickContext<'_, Self::Timer>) {}

    /// Pairs of registered objects touching right now, for hosts without a
    /// physics engine of their own
    fn contacts(&self) -> Vec<(EntityId, EntityId)> {
        Vec::new()
    }

    /// In the phase that pausing freezes
    fn is_active(&self) -> bool;

    /// In the terminal phase
    fn is_over(&self) -> bool;

    fn scores(&self) -> &ScoreBoard;
}

/// Timers owned by a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionTimer<T> {
    /// Delayed restart after GameOver
    Restart,
    Game(T),
}

/// Everything outside the session a game may read or call during one event
pub struct Env<'a> {
    pub now_ms: f64,
    pub input: &'a InputState,
    pub menu: &'a MenuState,
    pub settings: &'a Settings,
    pub host: &'a mut dyn Host,
}

/// Handed to the game for each tick, event or timer
pub struct TickContext<'a, T> {
    pub now_ms: f64,
    /// Fixed step in seconds during a tick, zero for events and timers
    pub dt: f32,
    pub input: &'a InputState,
    pub menu: &'a MenuState,
    pub settings: &'a Settings,
    pub host: &'a mut dyn Host,
    timers: &'a mut TimerQueue<SessionTimer<T>>,
    restart_requested: bool,
}

impl<'a, T> TickContext<'a, T> {
    fn new(env: &'a mut Env<'_>, timers: &'a mut TimerQueue<SessionTimer<T>>) -> Self {
        Self {
            now_ms: env.now_ms,
            dt: 0.0,
            input: env.input,
            menu: env.menu,
            settings: env.settings,
            host: &mut *env.host,
            timers,
            restart_requested: false,
        }
    }

    /// Play a sound unless muted
    pub fn play(&mut self, sound: Sound) {
        if !self.menu.muted {
            self.host.play_sound(sound, self.menu.effective_volume());
        }
    }

    /// Schedule `timer` after `delay_ms` of wall-clock time
    pub fn after(&mut self, delay_ms: f64, timer: T) -> TimerHandle {
        self.timers
            .schedule_once(self.now_ms, delay_ms, SessionTimer::Game(timer))
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle)
    }

    /// Terminal transition side effects: the terminal sound once, and the
    /// automatic restart after the configured delay
    pub fn game_over(&mut self, sound: Sound) -> TimerHandle {
        self.play(sound);
        let delay = self.settings.game_over_delay_ms;
        log::info!("Game over, restarting in {} ms", delay);
        self.timers
            .schedule_once(self.now_ms, delay, SessionTimer::Restart)
    }

    /// Ask for a new session as soon as the current event finishes
    pub fn request_restart(&mut self) {
        self.restart_requested = true;
    }
}

/// What the arcade must do after feeding the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub ticks: u32,
    /// Contacts reported to the game
    pub contacts: usize,
    pub restart: bool,
}

pub struct Session<G: Game> {
    id: u64,
    seed: u64,
    started_ms: f64,
    game: G,
    frame: FrameDriver,
    timers: TimerQueue<SessionTimer<G::Timer>>,
    contacts: ContactTracker,
}

impl<G: Game> fmt::Debug for Session<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("game", &G::NAME)
            .field("id", &self.id)
            .field("seed", &self.seed)
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}

impl<G: Game> Session<G> {
    pub fn new(id: u64, seed: u64, store: &Store, settings: &Settings, now_ms: f64) -> Self {
        log::info!("{}: session {} (seed {})", G::NAME, id, seed);
        Self {
            id,
            seed,
            started_ms: now_ms,
            game: G::new(seed, store),
            frame: FrameDriver::new(
                settings.tick_rate_for(G::NAME),
                settings.stall_threshold(),
            ),
            timers: TimerQueue::new(id),
            contacts: ContactTracker::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn started_ms(&self) -> f64 {
        self.started_ms
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    /// Direct access for hosts and tests that stage a scenario
    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    pub fn frame(&self) -> &FrameDriver {
        &self.frame
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Cancel everything this session scheduled
    pub fn teardown(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        log::debug!(
            "{}: session {} torn down, {} timers cancelled",
            G::NAME,
            self.id,
            cancelled
        );
        cancelled
    }

    /// Let the game schedule its opening timers and host effects
    pub fn begin(&mut self, env: &mut Env<'_>) {
        let mut ctx = TickContext::new(env, &mut self.timers);
        self.game.begin(&mut ctx);
    }

    /// Fire timers due at `env.now_ms`; stops at the first restart
    pub fn poll_timers(&mut self, env: &mut Env<'_>) -> bool {
        while let Some(timer) = self.timers.pop_due(env.now_ms) {
            match timer {
                SessionTimer::Restart => return true,
                SessionTimer::Game(t) => {
                    let mut ctx = TickContext::new(env, &mut self.timers);
                    self.game.timer(t, &mut ctx);
                    if ctx.restart_requested {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Feed one host frame callback through the frame driver.
    ///
    /// Ticks are skipped while the menu is paused and the game is in its
    /// active phase, and once a tick requests a restart. With
    /// `detect_contacts` the game's own overlap test runs after every tick.
    pub fn advance(&mut self, elapsed_ms: f64, detect_contacts: bool, env: &mut Env<'_>) -> Outcome {
        let mut restart = false;
        let mut contacts = 0;
        let game = &mut self.game;
        let timers = &mut self.timers;
        let tracker = &mut self.contacts;
        let ticks = self.frame.on_host_callback_ms(elapsed_ms, |step| {
            if restart || (env.menu.paused && game.is_active()) {
                return;
            }
            let mut ctx = TickContext::new(env, timers);
            ctx.dt = step.as_secs_f32();
            game.tick(&mut ctx);
            restart = ctx.restart_requested;
            if detect_contacts && !restart {
                let (reported, restart_requested) = Self::report_contacts(game, tracker, timers, env);
                contacts += reported;
                restart = restart_requested;
            }
        });
        Outcome {
            ticks,
            contacts,
            restart,
        }
    }

    /// Run the game's overlap test once; returns the contacts reported and
    /// whether one requested a restart
    pub fn detect_contacts(&mut self, env: &mut Env<'_>) -> (usize, bool) {
        Self::report_contacts(&mut self.game, &mut self.contacts, &mut self.timers, env)
    }

    /// Report each pair that started touching since the last check
    fn report_contacts(
        game: &mut G,
        tracker: &mut ContactTracker,
        timers: &mut TimerQueue<SessionTimer<G::Timer>>,
        env: &mut Env<'_>,
    ) -> (usize, bool) {
        let mut reported = 0;
        for (a, b) in tracker.begin(game.contacts()) {
            let mut ctx = TickContext::new(env, timers);
            game.collision(a, b, &mut ctx);
            reported += 1;
            if ctx.restart_requested {
                return (reported, true);
            }
        }
        (reported, false)
    }

    /// Forward an input event; true if it requested a restart
    pub fn input(&mut self, event: &InputEvent, env: &mut Env<'_>) -> bool {
        let mut ctx = TickContext::new(env, &mut self.timers);
        self.game.input(event, &mut ctx);
        ctx.restart_requested
    }

    pub fn collision(&mut self, a: EntityId, b: EntityId, env: &mut Env<'_>) -> bool {
        let mut ctx = TickContext::new(env, &mut self.timers);
        self.game.collision(a, b, &mut ctx);
        ctx.restart_requested
    }
}

//! Arcade runner
//!
//! Owns the menu overlay, storage, host and the current session, and is the
//! single place host callbacks enter:
//! - [`Arcade::frame`] per rendered frame: due timers, then fixed ticks, then
//!   exactly one render
//! - [`Arcade::input`] per input event: overlay first, then the game
//! - [`Arcade::collision`] per physics contact reported by the host; hosts
//!   without physics turn on [`Arcade::set_contact_detection`] instead

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::input::{InputEvent, InputState};
use crate::menu::{Menu, MenuOutcome, MenuState};
use crate::persistence::Store;
use crate::platform::Host;
use crate::settings::Settings;
use crate::sim::registry::EntityId;
use crate::sim::session::{Env, Game, Session};

/// Result of one host frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Logic ticks run (including ones skipped for pause)
    pub ticks: u32,
    /// Contacts found by per-tick detection
    pub contacts: usize,
    /// A new session started during this frame
    pub restarted: bool,
}

pub struct Arcade<G: Game, H: Host> {
    settings: Settings,
    store: Store,
    menu: Menu,
    host: H,
    input: InputState,
    seeds: Pcg32,
    contact_detection: bool,
    session: Session<G>,
}

impl<G: Game, H: Host> Arcade<G, H> {
    /// Start an arcade with settings loaded from `store`
    pub fn new(store: Store, host: H, seed: u64, now_ms: f64) -> Self {
        let settings = Settings::load(&store);
        Self::with_settings(store, settings, host, seed, now_ms)
    }

    pub fn with_settings(store: Store, settings: Settings, host: H, seed: u64, now_ms: f64) -> Self {
        let menu = Menu::load(&store, &settings);
        let mut seeds = Pcg32::seed_from_u64(seed);
        let session = Session::new(1, seeds.next_u64(), &store, &settings, now_ms);
        let mut arcade = Self {
            settings,
            store,
            menu,
            host,
            input: InputState::new(),
            seeds,
            contact_detection: false,
            session,
        };
        arcade.begin_session(now_ms);
        arcade
    }

    fn begin_session(&mut self, now_ms: f64) {
        let mut env = Env {
            now_ms,
            input: &self.input,
            menu: self.menu.state(),
            settings: &self.settings,
            host: &mut self.host,
        };
        self.session.begin(&mut env);
    }

    pub fn game(&self) -> &G {
        self.session.game()
    }

    pub fn session(&self) -> &Session<G> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<G> {
        &mut self.session
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut Menu {
        &mut self.menu
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn input_state(&self) -> &InputState {
        &self.input
    }

    /// Run the game's own overlap test after every tick, for hosts without
    /// a physics engine reporting [`Arcade::collision`]
    pub fn set_contact_detection(&mut self, on: bool) {
        self.contact_detection = on;
    }

    pub fn contact_detection(&self) -> bool {
        self.contact_detection
    }

    /// One host frame callback. `render` is called exactly once, after all
    /// ticks for this frame.
    pub fn frame<R>(&mut self, now_ms: f64, elapsed_ms: f64, render: R) -> FrameReport
    where
        R: FnOnce(&G, &MenuState),
    {
        let mut restarted = self.poll_timers(now_ms);

        let mut env = Env {
            now_ms,
            input: &self.input,
            menu: self.menu.state(),
            settings: &self.settings,
            host: &mut self.host,
        };
        let outcome = self.session.advance(elapsed_ms, self.contact_detection, &mut env);
        if outcome.restart {
            self.restart(now_ms);
            restarted = true;
        }

        render(self.session.game(), self.menu.state());

        FrameReport {
            ticks: outcome.ticks,
            contacts: outcome.contacts,
            restarted,
        }
    }

    /// Fire overlay and session timers due at `now_ms`. Hosts call this from
    /// a wall-clock timer too, so delays elapse while frames are suspended.
    /// Returns true if a new session started.
    pub fn poll_timers(&mut self, now_ms: f64) -> bool {
        self.menu.poll(now_ms);

        let mut env = Env {
            now_ms,
            input: &self.input,
            menu: self.menu.state(),
            settings: &self.settings,
            host: &mut self.host,
        };
        if self.session.poll_timers(&mut env) {
            self.restart(now_ms);
            return true;
        }
        false
    }

    /// Dispatch one input event
    pub fn input(&mut self, event: InputEvent, now_ms: f64) {
        let outcome = self.menu.dispatch(&event, now_ms, &mut self.host);

        // Presses the overlay took never reach polled input; releases always
        // do, so the pointer can't stay down
        let pointer_press = matches!(event, InputEvent::PointerDown(_) | InputEvent::PointerMove(_));
        if outcome == MenuOutcome::Ignored || !pointer_press {
            self.input.apply(&event);
        }

        match outcome {
            MenuOutcome::Handled => return,
            MenuOutcome::Restart => {
                self.restart(now_ms);
                return;
            }
            MenuOutcome::Ignored => {}
        }

        let mut env = Env {
            now_ms,
            input: &self.input,
            menu: self.menu.state(),
            settings: &self.settings,
            host: &mut self.host,
        };
        if self.session.input(&event, &mut env) {
            self.restart(now_ms);
        }
    }

    /// Physics contact between two registered objects
    pub fn collision(&mut self, a: EntityId, b: EntityId, now_ms: f64) {
        let mut env = Env {
            now_ms,
            input: &self.input,
            menu: self.menu.state(),
            settings: &self.settings,
            host: &mut self.host,
        };
        if self.session.collision(a, b, &mut env) {
            self.restart(now_ms);
        }
    }

    /// Report every contact that started since the last check, using the
    /// game's own overlap test. Returns how many were reported.
    pub fn detect_contacts(&mut self, now_ms: f64) -> usize {
        let mut env = Env {
            now_ms,
            input: &self.input,
            menu: self.menu.state(),
            settings: &self.settings,
            host: &mut self.host,
        };
        let (reported, restart) = self.session.detect_contacts(&mut env);
        if restart {
            self.restart(now_ms);
        }
        reported
    }

    /// Tear down the current session and start a new one
    pub fn restart(&mut self, now_ms: f64) {
        self.session.teardown();
        self.menu.on_restart();
        let id = self.session.id() + 1;
        let seed = self.seeds.next_u64();
        self.session = Session::new(id, seed, &self.store, &self.settings, now_ms);
        self.begin_session(now_ms);
    }
}

/// Object-safe view of an arcade for hosts that pick the game at runtime
pub trait Driver {
    fn name(&self) -> &'static str;
    fn frame(&mut self, now_ms: f64, elapsed_ms: f64) -> FrameReport;
    fn input(&mut self, event: InputEvent, now_ms: f64);
    fn collision(&mut self, a: EntityId, b: EntityId, now_ms: f64);
    fn detect_contacts(&mut self, now_ms: f64) -> usize;
    fn set_contact_detection(&mut self, on: bool);
    fn poll_timers(&mut self, now_ms: f64) -> bool;
    fn session_id(&self) -> u64;
    /// (score, best)
    fn score(&self) -> (u32, u32);
    fn is_over(&self) -> bool;
    /// Renderable state as JSON
    fn snapshot_json(&self) -> String;
}

#[derive(Serialize)]
struct Snapshot<'a, G> {
    game: &'static str,
    session: u64,
    menu: &'a MenuState,
    state: &'a G,
}

impl<G: Game + Serialize, H: Host> Driver for Arcade<G, H> {
    fn name(&self) -> &'static str {
        G::NAME
    }

    fn frame(&mut self, now_ms: f64, elapsed_ms: f64) -> FrameReport {
        Arcade::frame(self, now_ms, elapsed_ms, |_, _| {})
    }

    fn input(&mut self, event: InputEvent, now_ms: f64) {
        Arcade::input(self, event, now_ms)
    }

    fn collision(&mut self, a: EntityId, b: EntityId, now_ms: f64) {
        Arcade::collision(self, a, b, now_ms)
    }

    fn detect_contacts(&mut self, now_ms: f64) -> usize {
        Arcade::detect_contacts(self, now_ms)
    }

    fn set_contact_detection(&mut self, on: bool) {
        Arcade::set_contact_detection(self, on)
    }

    fn poll_timers(&mut self, now_ms: f64) -> bool {
        Arcade::poll_timers(self, now_ms)
    }

    fn session_id(&self) -> u64 {
        self.session.id()
    }

    fn score(&self) -> (u32, u32) {
        let scores = self.game().scores();
        (scores.score, scores.highest)
    }

    fn is_over(&self) -> bool {
        self.game().is_over()
    }

    fn snapshot_json(&self) -> String {
        let snapshot = Snapshot {
            game: G::NAME,
            session: self.session.id(),
            menu: self.menu.state(),
            state: self.session.game(),
        };
        serde_json::to_string(&snapshot).unwrap_or_else(|e| {
            log::warn!("Snapshot failed: {}", e);
            String::from("{}")
        })
    }
}

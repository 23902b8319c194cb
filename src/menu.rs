//! Menu overlay shared by all games
//!
//! Mute, pause, fullscreen and volume, toggled from keys or overlay icons
//! and saved after every change. Games only query it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::input::{InputEvent, Key};
use crate::persistence::Store;
use crate::platform::Host;
use crate::settings::Settings;
use crate::sim::geom::Rect;
use crate::sim::timers::{TimerHandle, TimerQueue};

/// Persisted overlay state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MenuState {
    #[serde(rename = "mute", default)]
    pub muted: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    Settings::default().default_volume
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            muted: false,
            paused: false,
            fullscreen: false,
            volume: default_volume(),
        }
    }
}

impl MenuState {
    /// Volume actually applied to sounds
    pub fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }
}

/// What a dispatched input event did to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// Not an overlay event; forward to the game
    Ignored,
    /// Consumed by the overlay
    Handled,
    /// The player asked for a new session
    Restart,
}

/// Overlay icons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuIcon {
    VolumeDown,
    VolumeUp,
    Fullscreen,
    Home,
}

impl MenuIcon {
    const ALL: [MenuIcon; 4] = [
        MenuIcon::VolumeDown,
        MenuIcon::VolumeUp,
        MenuIcon::Fullscreen,
        MenuIcon::Home,
    ];

    /// Sprites are 90px squares along the top edge with an inset hit area
    pub fn hit_area(&self) -> Rect {
        let x = match self {
            MenuIcon::VolumeDown => 0.0,
            MenuIcon::VolumeUp => 155.0,
            MenuIcon::Fullscreen => 235.0,
            MenuIcon::Home => 330.0,
        };
        Rect::new(x + 9.0, 9.0, 72.0, 72.0)
    }

    pub fn at(p: Vec2) -> Option<Self> {
        Self::ALL.into_iter().find(|icon| icon.hit_area().contains(p))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MenuTimer {
    VolumeRepeat(f32),
}

/// The overlay: state, its persistence, and the volume hold repeat
#[derive(Debug)]
pub struct Menu {
    state: MenuState,
    store: Store,
    volume_step: f32,
    volume_repeat_ms: f64,
    timers: TimerQueue<MenuTimer>,
    hold: Option<TimerHandle>,
}

impl Menu {
    /// Storage key shared by every game
    pub const STORAGE_KEY: &'static str = "games2d-menu";

    /// Load the overlay state. Mute and volume are restored; pause and
    /// fullscreen always start off (fullscreen needs a fresh user gesture).
    pub fn load(store: &Store, settings: &Settings) -> Self {
        let state = match store.load::<MenuState>(Self::STORAGE_KEY) {
            Some(saved) => {
                log::info!("Loaded menu state");
                MenuState {
                    paused: false,
                    fullscreen: false,
                    volume: saved.volume.clamp(0.0, 1.0),
                    ..saved
                }
            }
            None => MenuState {
                volume: settings.default_volume.clamp(0.0, 1.0),
                ..MenuState::default()
            },
        };
        Self {
            state,
            store: store.clone(),
            volume_step: settings.volume_step,
            volume_repeat_ms: settings.volume_repeat_ms,
            timers: TimerQueue::default(),
            hold: None,
        }
    }

    fn save(&self) {
        self.store.save(Self::STORAGE_KEY, &self.state);
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    pub fn is_fullscreen(&self) -> bool {
        self.state.fullscreen
    }

    pub fn volume(&self) -> f32 {
        self.state.volume
    }

    pub fn effective_volume(&self) -> f32 {
        self.state.effective_volume()
    }

    pub fn is_holding_volume(&self) -> bool {
        self.hold.is_some()
    }

    pub fn toggle_mute(&mut self) {
        self.state.muted = !self.state.muted;
        log::debug!("Mute: {}", self.state.muted);
        self.save();
    }

    pub fn toggle_pause(&mut self) {
        self.state.paused = !self.state.paused;
        log::debug!("Paused: {}", self.state.paused);
        self.save();
    }

    pub fn toggle_fullscreen(&mut self, host: &mut dyn Host) {
        self.state.fullscreen = !self.state.fullscreen;
        host.set_fullscreen(self.state.fullscreen);
        self.save();
    }

    /// Change volume by `delta`, clamped to [0, 1]
    pub fn adjust_volume(&mut self, delta: f32) {
        self.state.volume = (self.state.volume + delta).clamp(0.0, 1.0);
        self.save();
    }

    /// Start a press-and-hold: adjust now, then every repeat interval
    pub fn press_volume(&mut self, delta: f32, now_ms: f64) {
        self.release_volume();
        self.adjust_volume(delta);
        let handle = self.timers.schedule_repeating(
            now_ms,
            self.volume_repeat_ms,
            MenuTimer::VolumeRepeat(delta),
        );
        self.hold = Some(handle);
    }

    /// End a press-and-hold. No-op if nothing is held.
    pub fn release_volume(&mut self) {
        if let Some(handle) = self.hold.take() {
            self.timers.cancel(handle);
        }
    }

    /// Fire due overlay timers; returns how many fired
    pub fn poll(&mut self, now_ms: f64) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now_ms) {
            match timer {
                MenuTimer::VolumeRepeat(delta) => self.adjust_volume(delta),
            }
            fired += 1;
        }
        fired
    }

    /// Session restart: un-pause and drop any held repeat
    pub fn on_restart(&mut self) {
        self.release_volume();
        if self.state.paused {
            self.state.paused = false;
            self.save();
        }
    }

    /// Single entry point for input aimed at the overlay
    pub fn dispatch(&mut self, event: &InputEvent, now_ms: f64, host: &mut dyn Host) -> MenuOutcome {
        match *event {
            InputEvent::KeyDown(Key::Char(c)) => match c {
                'r' | 'n' => MenuOutcome::Restart,
                'm' => {
                    self.toggle_mute();
                    MenuOutcome::Handled
                }
                'p' => {
                    self.toggle_pause();
                    MenuOutcome::Handled
                }
                'f' => {
                    self.toggle_fullscreen(host);
                    MenuOutcome::Handled
                }
                '-' => {
                    self.press_volume(-self.volume_step, now_ms);
                    MenuOutcome::Handled
                }
                '+' | '=' => {
                    self.press_volume(self.volume_step, now_ms);
                    MenuOutcome::Handled
                }
                _ => MenuOutcome::Ignored,
            },
            InputEvent::KeyUp(Key::Char('-' | '+' | '=')) => {
                self.release_volume();
                MenuOutcome::Handled
            }
            InputEvent::PointerDown(p) => match MenuIcon::at(p) {
                Some(MenuIcon::VolumeDown) => {
                    self.press_volume(-self.volume_step, now_ms);
                    MenuOutcome::Handled
                }
                Some(MenuIcon::VolumeUp) => {
                    self.press_volume(self.volume_step, now_ms);
                    MenuOutcome::Handled
                }
                Some(_) => MenuOutcome::Handled,
                None => MenuOutcome::Ignored,
            },
            InputEvent::PointerUp(p) => {
                if self.hold.is_some() {
                    self.release_volume();
                    return MenuOutcome::Handled;
                }
                match MenuIcon::at(p) {
                    Some(MenuIcon::Fullscreen) => {
                        self.toggle_fullscreen(host);
                        MenuOutcome::Handled
                    }
                    Some(MenuIcon::Home) => {
                        host.navigate_home();
                        MenuOutcome::Handled
                    }
                    Some(_) => MenuOutcome::Handled,
                    None => MenuOutcome::Ignored,
                }
            }
            _ => MenuOutcome::Ignored,
        }
    }
}

//! Platform abstraction layer
//!
//! The embedding host supplies:
//! - Audio playback
//! - Fullscreen, vibration and page navigation
//! - Camera effects and background colour for the renderer
//!
//! Games reach these only through [`Host`]; [`NullHost`] and
//! [`RecordingHost`] run headless.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::audio::Sound;

/// Calls from the game core out to the embedding environment.
///
/// Every method defaults to a no-op so hosts implement only what they have.
pub trait Host {
    fn play_sound(&mut self, _sound: Sound, _volume: f32) {}
    fn stop_sound(&mut self, _sound: Sound) {}
    fn set_fullscreen(&mut self, _on: bool) {}
    fn vibrate(&mut self, _pattern_ms: &[u32]) {}
    fn shake_camera(&mut self, _duration_ms: f64, _intensity: f32) {}
    fn flash_camera(&mut self, _duration_ms: f64) {}
    fn set_background(&mut self, _color: u32) {}
    fn navigate_home(&mut self) {}
}

/// Host that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}

/// One recorded host call
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    PlaySound(Sound, f32),
    StopSound(Sound),
    Fullscreen(bool),
    Vibrate(Vec<u32>),
    Shake,
    Flash,
    Background(u32),
    Home,
}

/// Host that records calls, for tests and the headless demo
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `sound` was played
    pub fn plays(&self, sound: Sound) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::PlaySound(s, _) if *s == sound))
            .count()
    }

    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Host for RecordingHost {
    fn play_sound(&mut self, sound: Sound, volume: f32) {
        self.calls.push(HostCall::PlaySound(sound, volume));
    }

    fn stop_sound(&mut self, sound: Sound) {
        self.calls.push(HostCall::StopSound(sound));
    }

    fn set_fullscreen(&mut self, on: bool) {
        self.calls.push(HostCall::Fullscreen(on));
    }

    fn vibrate(&mut self, pattern_ms: &[u32]) {
        self.calls.push(HostCall::Vibrate(pattern_ms.to_vec()));
    }

    fn shake_camera(&mut self, _duration_ms: f64, _intensity: f32) {
        self.calls.push(HostCall::Shake);
    }

    fn flash_camera(&mut self, _duration_ms: f64) {
        self.calls.push(HostCall::Flash);
    }

    fn set_background(&mut self, color: u32) {
        self.calls.push(HostCall::Background(color));
    }

    fn navigate_home(&mut self) {
        self.calls.push(HostCall::Home);
    }
}

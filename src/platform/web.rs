//! Browser host
//!
//! Sounds go through the Web Audio synth. Camera effects and the background
//! colour are forwarded to the page's renderer through optional global hooks
//! (`games2dShake`, `games2dFlash`, `games2dBackground`).

use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

use super::Host;
use crate::audio::{AudioManager, Sound};

#[wasm_bindgen(inline_js = "
    export function camera_shake(duration, intensity) {
        if (window.games2dShake) window.games2dShake(duration, intensity);
    }
    export function camera_flash(duration) {
        if (window.games2dFlash) window.games2dFlash(duration);
    }
    export function background(color) {
        if (window.games2dBackground) window.games2dBackground(color);
    }
")]
extern "C" {
    fn camera_shake(duration: f64, intensity: f32);
    fn camera_flash(duration: f64);
    fn background(color: u32);
}

/// Running as an installed app rather than a browser tab
fn is_installed() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(display-mode: standalone)").ok().flatten())
        .is_some_and(|q| q.matches())
}

pub struct WebHost {
    audio: AudioManager,
}

impl Default for WebHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WebHost {
    pub fn new() -> Self {
        Self {
            audio: AudioManager::new(),
        }
    }
}

impl Host for WebHost {
    fn play_sound(&mut self, sound: Sound, volume: f32) {
        self.audio.play(sound, volume);
    }

    fn set_fullscreen(&mut self, on: bool) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let result = if on {
            match document.document_element() {
                Some(el) => el.request_fullscreen(),
                None => return,
            }
        } else {
            document.exit_fullscreen();
            Ok(())
        };
        if let Err(e) = result {
            log::warn!("Fullscreen request failed: {:?}", e);
        }
    }

    fn vibrate(&mut self, pattern_ms: &[u32]) {
        if !is_installed() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let pattern: js_sys::Array = pattern_ms.iter().map(|ms| JsValue::from(*ms)).collect();
        window.navigator().vibrate_with_pattern(&pattern);
    }

    fn shake_camera(&mut self, duration_ms: f64, intensity: f32) {
        camera_shake(duration_ms, intensity);
    }

    fn flash_camera(&mut self, duration_ms: f64) {
        camera_flash(duration_ms);
    }

    fn set_background(&mut self, color: u32) {
        background(color);
    }

    fn navigate_home(&mut self) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href("../") {
                log::warn!("Navigation failed: {:?}", e);
            }
        }
    }
}

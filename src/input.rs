//! Input events and polled input state

use std::collections::BTreeSet;

use glam::Vec2;
use serde::Serialize;

/// A named key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Char(char),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => Some(Key::Left),
            "ArrowRight" | "Right" => Some(Key::Right),
            "ArrowUp" | "Up" => Some(Key::Up),
            "ArrowDown" | "Down" => Some(Key::Down),
            " " | "Spacebar" => Some(Key::Space),
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Key::Char(c.to_ascii_lowercase())),
                    _ => None,
                }
            }
        }
    }
}

/// A discrete input event delivered between host frames
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp(Vec2),
}

/// Keys and pointer as seen by per-tick polling
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<Key>,
    pointer: Option<Vec2>,
    pointer_down: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into the held state
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => {
                self.held.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(&key);
            }
            InputEvent::PointerDown(p) => {
                self.pointer = Some(p);
                self.pointer_down = true;
            }
            InputEvent::PointerMove(p) => self.pointer = Some(p),
            InputEvent::PointerUp(p) => {
                self.pointer = Some(p);
                self.pointer_down = false;
            }
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn any_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.is_down(*k))
    }

    /// Pointer position while the pointer is pressed
    pub fn pressed_pointer(&self) -> Option<Vec2> {
        if self.pointer_down { self.pointer } else { None }
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Release everything (focus lost)
    pub fn clear(&mut self) {
        self.held.clear();
        self.pointer_down = false;
    }
}

/// Which half of a `width`-wide screen a pressed pointer is in, ignoring
/// presses in the top `dead_zone` pixels (the menu strip)
pub fn pointer_side(input: &InputState, width: f32, dead_zone: f32) -> Option<Side> {
    let p = input.pressed_pointer()?;
    if p.y <= dead_zone {
        return None;
    }
    Some(if p.x < width / 2.0 { Side::Left } else { Side::Right })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom() {
        assert_eq!(Key::from_dom("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_dom("M"), Some(Key::Char('m')));
        assert_eq!(Key::from_dom("Shift"), None);
    }

    #[test]
    fn test_pointer_side_dead_zone() {
        let mut input = InputState::new();
        input.apply(&InputEvent::PointerDown(Vec2::new(10.0, 50.0)));
        assert_eq!(pointer_side(&input, 450.0, 70.0), None);
        input.apply(&InputEvent::PointerMove(Vec2::new(400.0, 200.0)));
        assert_eq!(pointer_side(&input, 450.0, 70.0), Some(Side::Right));
        input.apply(&InputEvent::PointerUp(Vec2::new(400.0, 200.0)));
        assert_eq!(pointer_side(&input, 450.0, 70.0), None);
    }
}

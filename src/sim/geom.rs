//! Axis-aligned rectangles and line segments
//!
//! Screen space: origin top-left, +y down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of size `w`×`h` centered on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap: rectangles that only share an edge do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Wrap the top-left corner into `[0, width) × [0, height)`
    pub fn wrapped(mut self, width: f32, height: f32) -> Self {
        self.x = self.x.rem_euclid(width);
        self.y = self.y.rem_euclid(height);
        self
    }
}

/// True if `rect` overlaps any rectangle in `others`
pub fn overlaps_any<'a, I>(rect: &Rect, others: I) -> bool
where
    I: IntoIterator<Item = &'a Rect>,
{
    others.into_iter().any(|o| rect.overlaps(o))
}

/// A straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Vec2,
    pub to: Vec2,
}

impl Segment {
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self { from, to }
    }

    pub fn length(&self) -> f32 {
        self.from.distance(self.to)
    }

    /// Direction angle in radians (atan2 of to - from)
    pub fn angle(&self) -> f32 {
        let d = self.to - self.from;
        d.y.atan2(d.x)
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.from + self.to) * 0.5
    }

    /// Shorten the segment (keeping `from`) so it is at most `max_len` long
    pub fn clamped(&self, max_len: f32) -> Self {
        let len = self.length();
        if len <= max_len || len == 0.0 {
            return *self;
        }
        let dir = (self.to - self.from) / len;
        Self::new(self.from, self.from + dir * max_len)
    }
}

/// Clamp a point into `[0, width - 1] × [0, height - 1]`
pub fn clamp_to_screen(p: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(p.x.clamp(0.0, width - 1.0), p.y.clamp(0.0, height - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_contact_is_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        let c = Rect::new(9.5, 9.5, 2.0, 2.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_wrapped_negative() {
        let r = Rect::new(-3.0, 380.0, 2.0, 2.0).wrapped(450.0, 375.0);
        assert_eq!(r.x, 447.0);
        assert_eq!(r.y, 5.0);
    }

    #[test]
    fn test_segment_clamped() {
        let s = Segment::new(Vec2::ZERO, Vec2::new(300.0, 400.0));
        let c = s.clamped(170.0);
        assert!((c.length() - 170.0).abs() < 1e-3);
        assert!((c.angle() - s.angle()).abs() < 1e-6);
        assert_eq!(s.clamped(1000.0), s);
    }
}

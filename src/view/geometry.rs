//! Minimal geometry for hit testing drop points.

/// A point in view-local coordinates (origin at the view's top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds of a view inside its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 120.0, 40.0)
    }
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether a view-local point lies in the upper half.
    pub fn is_upper_half(&self, local: Point) -> bool {
        local.y < self.height / 2.0
    }
}

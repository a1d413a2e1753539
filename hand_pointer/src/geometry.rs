//! Points, shapes and the surface they live on.
//!
//! All coordinates here are screen pixels with the origin at the top-left,
//! `y` growing downwards — the same convention the framebuffer uses.

use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A 2D position in screen pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self { Point { x, y } }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Linear interpolation: `t` = 0.0 → `self`, `t` = 1.0 → `other`.
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point {
            x: self.x * (1.0 - t) + other.x * t,
            y: self.y * (1.0 - t) + other.y * t,
        }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self { Point { x, y } }
}

// ════════════════════════════════════════════════════════════════════════════
// Rect
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned rectangle.  Edges are inclusive on all four sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left:   f32,
    pub top:    f32,
    pub right:  f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Rect { left, top, right, bottom }
    }

    /// Build from a top-left corner and a size, the way layouts declare keys.
    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { left: x, top: y, right: x + w, bottom: y + h }
    }

    pub fn width(&self)  -> f32 { self.right - self.left }
    pub fn height(&self) -> f32 { self.bottom - self.top }

    pub fn center(&self) -> Point {
        Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Polygon
// ════════════════════════════════════════════════════════════════════════════

/// Simple polygon given by its vertices in order (either winding).
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self { Polygon { vertices } }

    /// Even-odd ray cast towards +x.  Degenerate polygons (< 3 vertices)
    /// contain nothing.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.vertices.len();
        if n < 3 { return false; }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[j];
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Shape
// ════════════════════════════════════════════════════════════════════════════

/// The geometric footprint of a hit region.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
}

impl Shape {
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Shape::Rect(r)    => r.contains(p),
            Shape::Polygon(g) => g.contains(p),
        }
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self { Shape::Rect(r) }
}

// ════════════════════════════════════════════════════════════════════════════
// Surface
// ════════════════════════════════════════════════════════════════════════════

/// Pixel dimensions of the drawing surface pointer coordinates map onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    width:  u32,
    height: u32,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptySurface { width, height });
        }
        Ok(Surface { width, height })
    }

    pub fn width(&self)  -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    /// Map a normalized `[0,1]²` position onto the surface.
    pub fn denormalize(&self, nx: f32, ny: f32) -> Point {
        Point::new(nx * self.width as f32, ny * self.height as f32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

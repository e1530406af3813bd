//! Pointer and element geometry.
//!
//! Coordinates are CSS-style pixels: x grows to the right, y grows downward.
//! Element rectangles are half open, so two adjacent rows never both claim
//! the pixel on their shared edge.

/// A pointer position or element origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance, as used by drag thresholds.
    #[inline]
    pub fn distance_to(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    #[inline]
    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Offset size of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Element bounds: an origin plus an offset size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left() + self.width()
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top() + self.height()
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Whether `point` hits the element. Right and bottom edges are exclusive.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        (self.left()..self.right()).contains(&point.x)
            && (self.top()..self.bottom()).contains(&point.y)
    }

    /// A strip of `width` along the left edge.
    #[inline]
    pub fn with_width(&self, width: f32) -> Rect {
        Rect::new(self.left(), self.top(), width, self.height())
    }

    /// A strip of `height` along the top edge.
    #[inline]
    pub fn with_height(&self, height: f32) -> Rect {
        Rect::new(self.left(), self.top(), self.width(), height)
    }

    /// The element moved by a translation.
    #[inline]
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            origin: self.origin.offset(dx, dy),
            size: self.size,
        }
    }
}

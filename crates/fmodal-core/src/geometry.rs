#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.
//!
//! All values are `f64` so that centering arithmetic keeps half pixels the
//! way a browser layout engine does (`(1023 - 600) / 2 == 211.5`).

/// A point (or offset) in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// The document origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Zero-sized.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Check if either dimension is zero (or negative).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Component-wise maximum.
    #[inline]
    pub fn max(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Grow by the given sides on every edge.
    #[inline]
    pub fn outset(self, sides: Sides) -> Size {
        Size::new(
            self.width + sides.horizontal_sum(),
            self.height + sides.vertical_sum(),
        )
    }
}

/// An axis-aligned rectangle.
///
/// Origin at the top-left of the document; `x`/`y` grow right/down.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Width and height.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// Per-edge lengths for padding, border, and margin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    /// Equal value on every edge.
    pub const fn all(val: f64) -> Self {
        Self::new(val, val, val, val)
    }

    /// Create sides with explicit values (CSS order: top, right, bottom, left).
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Sum of left and right.
    #[inline]
    pub fn horizontal_sum(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom.
    #[inline]
    pub fn vertical_sum(&self) -> f64 {
        self.top + self.bottom
    }
}

impl From<f64> for Sides {
    fn from(val: f64) -> Self {
        Self::all(val)
    }
}

impl From<(f64, f64)> for Sides {
    fn from((vertical, horizontal): (f64, f64)) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Sides, Size};

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert!(rect.contains(Point::new(2.0, 3.0)));
        assert!(rect.contains(Point::new(5.5, 7.5)));
        assert!(!rect.contains(Point::new(6.0, 3.0)));
        assert!(!rect.contains(Point::new(2.0, 8.0)));
    }

    #[test]
    fn rect_from_size_is_at_origin() {
        let rect = Rect::from_size(Size::new(1024.0, 3000.0));
        assert_eq!(rect.origin(), Point::ORIGIN);
        assert_eq!(rect.right(), 1024.0);
        assert_eq!(rect.bottom(), 3000.0);
    }

    #[test]
    fn size_outset_adds_both_edges() {
        let size = Size::new(100.0, 50.0).outset(Sides::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(size, Size::new(106.0, 54.0));
    }

    #[test]
    fn size_max_is_componentwise() {
        let a = Size::new(10.0, 40.0);
        let b = Size::new(30.0, 20.0);
        assert_eq!(a.max(b), Size::new(30.0, 40.0));
    }

    #[test]
    fn empty_sizes() {
        assert!(Size::ZERO.is_empty());
        assert!(Size::new(10.0, 0.0).is_empty());
        assert!(!Size::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn sides_conversions() {
        assert_eq!(Sides::from(3.0), Sides::all(3.0));
        assert_eq!(Sides::from((1.0, 2.0)), Sides::new(1.0, 2.0, 1.0, 2.0));
        assert_eq!(Sides::new(1.0, 2.0, 3.0, 4.0).horizontal_sum(), 6.0);
        assert_eq!(Sides::new(1.0, 2.0, 3.0, 4.0).vertical_sum(), 4.0);
    }
}

// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integral and three-dimensional geometry.
//!
//! Float 2D geometry comes from [`kurbo`]. This module adds the integral
//! device-pixel types used by tiling and hit testing, and the small amount of
//! 3D vector math needed for plane classification.

use core::ops::{Add, Mul, Sub};

use kurbo::{Point, Rect};

/// A point in integral device-pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntPoint {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl IntPoint {
    /// The origin.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rounds a float point to the nearest integral point.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "device coordinates fit in i32; float-to-int casts saturate"
    )]
    pub fn rounded(point: Point) -> Self {
        Self {
            x: point.x.round() as i32,
            y: point.y.round() as i32,
        }
    }
}

/// A size in integral device-pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntSize {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntSize {
    /// Creates a size.
    #[inline]
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero or negative.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns the number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }
}

/// An axis-aligned rectangle in integral device-pixel space.
///
/// Stored as origin plus size. A rectangle with a non-positive width or height
/// is empty; empty rectangles never intersect anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from origin and size components.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from a location and a size.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(origin: IntPoint, size: IntSize) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Creates a rectangle from its edges.
    #[inline]
    #[must_use]
    pub const fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Returns the smallest integral rectangle that contains `rect`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "device coordinates fit in i32; float-to-int casts saturate"
    )]
    pub fn enclosing(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::from_ltrb(
            rect.x0.floor() as i32,
            rect.y0.floor() as i32,
            rect.x1.ceil() as i32,
            rect.y1.ceil() as i32,
        )
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn max_x(self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn max_y(self) -> i32 {
        self.y + self.height
    }

    /// Returns the origin.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> IntPoint {
        IntPoint::new(self.x, self.y)
    }

    /// Returns the size.
    #[inline]
    #[must_use]
    pub const fn size(self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    /// Returns the overlapping area, or an empty rectangle.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.max_x().min(other.max_x());
        let bottom = self.max_y().min(other.max_y());
        if left >= right || top >= bottom {
            Self::ZERO
        } else {
            Self::from_ltrb(left, top, right, bottom)
        }
    }

    /// Returns the smallest rectangle containing both rectangles.
    ///
    /// Empty operands are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::from_ltrb(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Returns `true` if `other` lies entirely within this rectangle.
    #[must_use]
    pub const fn contains_rect(self, other: Self) -> bool {
        !other.is_empty()
            && other.x >= self.x
            && other.y >= self.y
            && other.max_x() <= self.max_x()
            && other.max_y() <= self.max_y()
    }

    /// Returns `true` if the pixel at `point` lies within this rectangle.
    #[must_use]
    pub const fn contains(self, point: IntPoint) -> bool {
        point.x >= self.x && point.x < self.max_x() && point.y >= self.y && point.y < self.max_y()
    }

    /// Grows the rectangle by `dx` horizontally and `dy` vertically on each side.
    #[must_use]
    pub const fn inflate(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x - dx,
            self.y - dy,
            self.width + 2 * dx,
            self.height + 2 * dy,
        )
    }

    /// Translates the rectangle.
    #[must_use]
    pub const fn translate(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Scales the rectangle and returns the smallest integral rectangle
    /// enclosing the result.
    #[must_use]
    pub fn scaled_enclosing(self, scale: f32) -> Self {
        Self::enclosing(self.to_rect().scale_from_origin(f64::from(scale)))
    }

    /// Converts to a float rectangle.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.max_x()),
            f64::from(self.max_y()),
        )
    }

    /// Returns the centre of the rectangle.
    #[must_use]
    pub fn center(self) -> Point {
        self.to_rect().center()
    }
}

/// A point (or direction) in three dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

/// Three-component vectors share the point representation.
pub type Vec3 = Point3;

impl Point3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Lifts a 2D point onto the z = 0 plane.
    #[inline]
    #[must_use]
    pub const fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0)
    }

    /// Drops the z component.
    #[inline]
    #[must_use]
    pub const fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            Self::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Linear interpolation towards `other`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Add for Point3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_of_disjoint_rects_is_empty() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(10, 0, 10, 10);
        assert!(!a.intersects(b));
        assert!(a.intersection(b).is_empty());
    }

    #[test]
    fn intersection_clips_to_overlap() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(b), IntRect::new(5, 5, 5, 5));
    }

    #[test]
    fn union_ignores_empty() {
        let a = IntRect::new(3, 3, 4, 4);
        assert_eq!(a.union(IntRect::ZERO), a);
        assert_eq!(IntRect::ZERO.union(a), a);
        assert_eq!(
            a.union(IntRect::new(10, 0, 1, 1)),
            IntRect::from_ltrb(3, 0, 11, 7)
        );
    }

    #[test]
    fn scaled_enclosing_rounds_outwards() {
        let r = IntRect::new(1, 1, 3, 3);
        assert_eq!(r.scaled_enclosing(1.5), IntRect::from_ltrb(1, 1, 6, 6));
    }

    #[test]
    fn contains_point_is_half_open() {
        let r = IntRect::new(0, 0, 2, 2);
        assert!(r.contains(IntPoint::new(1, 1)));
        assert!(!r.contains(IntPoint::new(2, 1)));
    }

    #[test]
    fn cross_product_of_axes() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    }
}

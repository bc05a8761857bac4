//! World-space math shared by the simulation and the wire protocol.
//!
//! Positions, velocities, and directions all use [`Vec2`] in `f64` world
//! units. The wire protocol serializes it directly with `serde`.

use serde::{Deserialize, Serialize};

/// A 2D vector in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// The unit vector along +X, used as the default facing direction.
    pub const UNIT_X: Self = Self::new(1.0, 0.0);

    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared length, avoids the `sqrt`.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Squared distance to another point, avoids the `sqrt`.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    /// Normalizes the vector. Zero vectors normalize to [`Vec2::UNIT_X`]
    /// rather than producing NaN — per the simulation-arithmetic error
    /// policy, degenerate input coerces to a sensible default instead of
    /// raising.
    #[must_use]
    pub fn normalize_or_unit_x(self) -> Self {
        let len = self.length();
        if len < f64::EPSILON {
            Self::UNIT_X
        } else {
            self * (1.0 / len)
        }
    }

    /// Normalizes the vector, returning `None` for (near-)zero input.
    #[must_use]
    pub fn normalize(self) -> Option<Self> {
        let len = self.length();
        if len < f64::EPSILON {
            None
        } else {
            Some(self * (1.0 / len))
        }
    }

    /// Returns the perpendicular vector, rotated 90 degrees counterclockwise.
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Rotates this (unit) vector by `angle` radians.
    #[must_use]
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// The signed angle (radians) required to rotate `self` onto `target`,
    /// in `(-pi, pi]`. Used to turn-rate-limit facing direction.
    #[must_use]
    pub fn signed_angle_to(self, target: Self) -> f64 {
        let cross = self.x * target.y - self.y * target.x;
        let dot = self.dot(target);
        cross.atan2(dot)
    }

    /// True if both components are within `eps` of `other`.
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }

    /// Clamps each component to the given rectangle.
    #[must_use]
    pub fn clamp_rect(self, min: Self, max: Self) -> Self {
        Self::new(self.x.clamp(min.x, max.x), self.y.clamp(min.y, max.y))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// An axis-aligned rectangle, `[x, y, x+w, y+h]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// True if the point lies inside the rectangle, inclusive of edges.
    #[must_use]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// The point on (or inside) this rectangle closest to `p`.
    #[must_use]
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.x, self.x + self.w),
            p.y.clamp(self.y, self.y + self.h),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_scale() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a + b, Vec2::new(4.0, 6.0));
        assert_eq!(b - a, Vec2::new(2.0, 2.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn zero_vector_normalizes_to_unit_x() {
        assert_eq!(Vec2::ZERO.normalize_or_unit_x(), Vec2::UNIT_X);
        assert_eq!(Vec2::ZERO.normalize(), None);
    }

    #[test]
    fn normalize_preserves_direction() {
        let v = Vec2::new(3.0, 4.0).normalize().unwrap();
        assert!((v.length() - 1.0).abs() < 1e-9);
        assert!((v.x - 0.6).abs() < 1e-9);
    }

    #[test]
    fn rect_contains_and_closest_point() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(5.0, 5.0)));
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(!r.contains(Vec2::new(-1.0, 5.0)));
        assert_eq!(r.closest_point(Vec2::new(-5.0, 5.0)), Vec2::new(0.0, 5.0));
    }

    #[test]
    fn signed_angle_to_matches_rotate() {
        let a = Vec2::new(1.0, 0.0);
        let b = a.rotate(std::f64::consts::FRAC_PI_2);
        let angle = a.signed_angle_to(b);
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }
}

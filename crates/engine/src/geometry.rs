use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    pub const ONE: Vec2 = Vec2 { x: 1.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Vector pointing from `self` to `destination`.
    pub fn difference(self, destination: Vec2) -> Vec2 {
        destination - self
    }

    pub fn dist(self, other: Vec2) -> f32 {
        self.difference(other).length()
    }

    /// Unit vector in the same direction. A zero-length input divides by zero
    /// and yields NaN components; use [`Vec2::normalize_or_zero`] when the
    /// input may be degenerate.
    pub fn normalize(self) -> Vec2 {
        let len = self.length();
        Vec2 {
            x: self.x / len,
            y: self.y / len,
        }
    }

    pub fn normalize_or_zero(self) -> Vec2 {
        if self.x == 0.0 && self.y == 0.0 {
            return Vec2::ZERO;
        }
        let normalized = self.normalize();
        if normalized.x.is_finite() && normalized.y.is_finite() {
            normalized
        } else {
            Vec2::ZERO
        }
    }

    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Angle in radians of the direction from `self` to `destination`.
    pub fn angle_to(self, destination: Vec2) -> f32 {
        let delta = self.difference(destination);
        delta.y.atan2(delta.x)
    }

    pub fn from_angle(radians: f32, magnitude: f32) -> Vec2 {
        Vec2 {
            x: radians.cos() * magnitude,
            y: radians.sin() * magnitude,
        }
    }

    pub fn abs(self) -> Vec2 {
        Vec2 {
            x: self.x.abs(),
            y: self.y.abs(),
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x / rhs, self.y / rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl DivAssign<f32> for Vec2 {
    fn div_assign(&mut self, rhs: f32) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "{actual} vs {expected}"
        );
    }

    #[test]
    fn arithmetic_operators_are_component_wise() {
        let mut v = Vec2::new(1.0, 2.0) + Vec2::new(3.0, 4.0);
        assert_eq!(v, Vec2::new(4.0, 6.0));
        v -= Vec2::new(1.0, 1.0);
        assert_eq!(v, Vec2::new(3.0, 5.0));
        v *= 2.0;
        assert_eq!(v, Vec2::new(6.0, 10.0));
        v /= 2.0;
        assert_eq!(v, Vec2::new(3.0, 5.0));
        assert_eq!(-v, Vec2::new(-3.0, -5.0));
        assert_eq!(v * 0.5, Vec2::new(1.5, 2.5));
        assert_eq!(v / 5.0, Vec2::new(0.6, 1.0));
    }

    #[test]
    fn dist_and_difference_point_from_self_to_destination() {
        let a = Vec2::new(1.0, 1.0);
        let b = Vec2::new(4.0, 5.0);
        assert_eq!(a.difference(b), Vec2::new(3.0, 4.0));
        assert_close(a.dist(b), 5.0);
        assert_close(b.dist(a), 5.0);
    }

    #[test]
    fn normalize_of_zero_is_nan_but_guarded_variant_is_zero() {
        let raw = Vec2::ZERO.normalize();
        assert!(raw.x.is_nan() && raw.y.is_nan());
        assert_eq!(Vec2::ZERO.normalize_or_zero(), Vec2::ZERO);
    }

    #[test]
    fn normalize_produces_unit_length() {
        let n = Vec2::new(3.0, -4.0).normalize_or_zero();
        assert_close(n.length(), 1.0);
        assert_close(n.x, 0.6);
        assert_close(n.y, -0.8);
    }

    #[test]
    fn cross_sign_follows_winding() {
        assert_close(Vec2::new(1.0, 0.0).cross(Vec2::new(0.0, 1.0)), 1.0);
        assert_close(Vec2::new(0.0, 1.0).cross(Vec2::new(1.0, 0.0)), -1.0);
        assert_close(Vec2::new(2.0, 2.0).cross(Vec2::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn angle_round_trips_through_from_angle() {
        let origin = Vec2::new(10.0, 10.0);
        let target = Vec2::new(10.0, 20.0);
        let angle = origin.angle_to(target);
        let step = Vec2::from_angle(angle, 2.0);
        assert_close(step.x, 0.0);
        assert_close(step.y, 2.0);
    }
}

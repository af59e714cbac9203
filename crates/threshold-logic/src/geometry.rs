//! World-space vector math.
//!
//! The landscape lies on the XZ plane with Y up. Grid cell `(x, z)` maps to
//! world `(x, 0.5, -z)`, so most distance checks ignore the Y axis.

use serde::{Deserialize, Serialize};

/// 3D world position or direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance on the ground plane, ignoring height.
    pub fn planar_distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Speed on the ground plane when `self` is a velocity.
    pub fn planar_length(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            *self * (1.0 / len)
        } else {
            Self::ZERO
        }
    }

    /// Step from `self` toward `target` by at most `max_step`.
    ///
    /// Returns the new point and whether `target` was reached.
    pub fn step_towards(&self, target: Self, max_step: f32) -> (Self, bool) {
        let diff = target - *self;
        let distance = diff.length();
        if distance <= max_step || distance <= f32::EPSILON {
            (target, true)
        } else {
            (*self + diff.normalize() * max_step, false)
        }
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.5, 0.0);
        let b = Vec3::new(3.0, 10.0, -4.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_step_towards_stops_at_target() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let target = Vec3::new(1.0, 0.0, 0.0);

        let (mid, arrived) = start.step_towards(target, 0.25);
        assert!(!arrived);
        assert!((mid.x - 0.25).abs() < 1e-5);

        let (end, arrived) = mid.step_towards(target, 5.0);
        assert!(arrived);
        assert_eq!(end, target);
    }
}

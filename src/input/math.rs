use std::ops::{Add, Mul, Sub};

/// Normalized 2D point or direction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }

    /// Linear interpolation, `t` clamped to `[0, 1]`
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self + (target - self) * t
    }
}

impl From<[f32; 2]> for Vec2 {
    fn from([x, y]: [f32; 2]) -> Self {
        Self::new(x, y)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

/// 3-axis vector with `y` pointing up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction. The zero vector is returned as is.
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length <= f32::EPSILON {
            return Self::ZERO;
        }
        Self::new(self.x / length, self.y / length, self.z / length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_moves_fraction_of_the_way() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(1.0, 0.5);
        assert_eq!(start.lerp(end, 0.5), Vec2::new(0.5, 0.25));
        assert_eq!(start.lerp(end, 2.0), end);
    }

    #[test]
    fn normalized_guards_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        let unit = Vec3::new(0.0, 3.0, 4.0).normalized();
        assert!((unit.length() - 1.0).abs() < 1e-6);
        assert!((unit.y - 0.6).abs() < 1e-6);
    }
}

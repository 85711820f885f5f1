//! Homogeneous 4-component vector

use bytemuck::{Pod, Zeroable};
use serde::{Serialize, Deserialize};

use crate::Vec3;

/// 4-component vector with x, y, z, w
///
/// Output vertex positions are stored homogeneously: points carry `w = 1.0`
/// so the buffer can be fed to a vertex shader without conversion.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };

    /// Create a new Vec4
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Homogeneous point (`w = 1.0`)
    #[inline]
    pub const fn point(p: Vec3) -> Self {
        Self { x: p.x, y: p.y, z: p.z, w: 1.0 }
    }

    /// Drop the w component
    #[inline]
    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// True when every component is finite
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }
}

impl std::ops::Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
            self.w - other.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_has_unit_w() {
        let p = Vec4::point(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(p.xyz(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_point_difference_is_direction() {
        let a = Vec4::point(Vec3::new(1.0, 1.0, 1.0));
        let b = Vec4::point(Vec3::new(2.0, 3.0, 4.0));
        let d = b - a;
        assert_eq!(d.w, 0.0);
        assert_eq!(d.xyz(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_is_finite() {
        assert!(Vec4::point(Vec3::ONE).is_finite());
        assert!(!Vec4::new(0.0, 0.0, 0.0, f32::NAN).is_finite());
    }

    #[test]
    fn test_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Vec4>(), 16);
        assert_eq!(std::mem::align_of::<Vec4>(), 4);
    }
}

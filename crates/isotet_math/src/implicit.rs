//! Implicit scalar functions of position
//!
//! An [`ImplicitFunction`] is the usual way to produce a test or demo volume:
//! sample it at every vertex of a tetrahedral mesh and extract a level set.
//! Any `Fn(Vec3) -> f32 + Sync` closure is an implicit function as well.

use crate::Vec3;

/// A scalar field defined everywhere in space
pub trait ImplicitFunction: Sync {
    /// Field value at `p`
    fn value(&self, p: Vec3) -> f32;
}

impl<F> ImplicitFunction for F
where
    F: Fn(Vec3) -> f32 + Sync,
{
    #[inline]
    fn value(&self, p: Vec3) -> f32 {
        self(p)
    }
}

/// Distance from a center point minus a radius (negative inside)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl ImplicitFunction for Sphere {
    #[inline]
    fn value(&self, p: Vec3) -> f32 {
        (p - self.center).length() - self.radius
    }
}

/// Signed distance to a plane `dot(normal, p) = offset`
///
/// `normal` is normalized on construction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    normal: Vec3,
    offset: f32,
}

impl Plane {
    pub fn new(normal: Vec3, offset: f32) -> Self {
        Self { normal: normal.normalized(), offset }
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl ImplicitFunction for Plane {
    #[inline]
    fn value(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.offset
    }
}

/// Torus around the z axis, centered at the origin
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Torus {
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Torus {
    pub fn new(major_radius: f32, minor_radius: f32) -> Self {
        Self { major_radius, minor_radius }
    }
}

impl ImplicitFunction for Torus {
    #[inline]
    fn value(&self, p: Vec3) -> f32 {
        let ring = (p.x * p.x + p.y * p.y).sqrt() - self.major_radius;
        (ring * ring + p.z * p.z).sqrt() - self.minor_radius
    }
}

/// Gyroid triply periodic surface `sin x cos y + sin y cos z + sin z cos x`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gyroid {
    /// Spatial frequency multiplier
    pub scale: f32,
}

impl Gyroid {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl ImplicitFunction for Gyroid {
    #[inline]
    fn value(&self, p: Vec3) -> f32 {
        let q = p * self.scale;
        q.x.sin() * q.y.cos() + q.y.sin() * q.z.cos() + q.z.sin() * q.x.cos()
    }
}

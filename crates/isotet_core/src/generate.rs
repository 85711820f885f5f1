//! Stage 4: geometry generation
//!
//! Each valid cell owns a window of output vertices. The cell walks its
//! triangle table row, interpolates one crossing point per listed edge, then
//! assigns a flat normal to each triangle in its window.

use isotet_math::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::classify::CellClass;
use crate::parallel::ParallelBackend;
use crate::sink::OutputWindow;
use crate::source::{CellGeometry, ScalarField};
use crate::tables::{triangle_edge, EDGE_VERTICES};

/// Interpolation parameter used when an edge crossing cannot be computed
///
/// With strict below-the-isovalue classification a crossed edge always has
/// distinct endpoint values, so this only applies when corner values are
/// not finite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateEdge {
    /// Place the vertex halfway along the edge (`t = 0.5`)
    #[default]
    Midpoint,
    /// Place the vertex on the edge's first corner (`t = 0`)
    SnapToFirst,
}

impl DegenerateEdge {
    #[inline]
    pub fn fallback(self) -> f32 {
        match self {
            DegenerateEdge::Midpoint => 0.5,
            DegenerateEdge::SnapToFirst => 0.0,
        }
    }
}

/// Position of the isovalue crossing along an edge, in `[0, 1]`
///
/// Computed in `f64` so corner values far apart do not overflow the
/// difference.
#[inline]
pub fn edge_parameter(isovalue: f32, f0: f32, f1: f32, policy: DegenerateEdge) -> f32 {
    let denom = f64::from(f1) - f64::from(f0);
    let t = ((f64::from(isovalue) - f64::from(f0)) / denom) as f32;
    if denom == 0.0 || !t.is_finite() {
        policy.fallback()
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Unit normal of triangle `(a, b, c)`; zero for a degenerate triangle
#[inline]
pub fn face_normal(a: Vec4, b: Vec4, c: Vec4) -> Vec3 {
    (b - a).xyz().cross((c - a).xyz()).normalized()
}

/// Read-only inputs shared by every cell during generation
pub struct GenerateParams<'a, G: ?Sized, A: ?Sized> {
    pub input: &'a G,
    pub aux: &'a A,
    pub isovalue: f32,
    pub policy: DegenerateEdge,
}

impl<G: ?Sized, A: ?Sized> Clone for GenerateParams<'_, G, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: ?Sized, A: ?Sized> Copy for GenerateParams<'_, G, A> {}

/// Fill one cell's output window
///
/// `out.len()` must equal the cell's vertex count.
pub fn generate_cell<G, A>(params: GenerateParams<'_, G, A>, cell: usize, case_index: u8, out: OutputWindow<'_>)
where
    G: CellGeometry + ?Sized,
    A: ScalarField + ?Sized,
{
    let f = params.input.corner_scalars(cell);
    let p = params.input.corner_positions(cell);
    let s = params.aux.corner_scalars(cell);
    let case_index = case_index as usize;

    for v in 0..out.len() {
        let [v0, v1] = EDGE_VERTICES[triangle_edge(case_index, v)];
        let t = edge_parameter(params.isovalue, f[v0], f[v1], params.policy);
        out.positions[v] = Vec4::point(p[v0].lerp(p[v1], t));
        out.scalars[v] = s[v0] * (1.0 - t) + s[v1] * t;
    }

    for tri in (0..out.len()).step_by(3) {
        let normal = face_normal(out.positions[tri], out.positions[tri + 1], out.positions[tri + 2]);
        out.normals[tri..tri + 3].fill(normal);
    }
}

/// Run [`generate_cell`] for every valid cell, each into its own window
pub fn generate_geometry<B, G, A>(
    backend: &B,
    params: GenerateParams<'_, G, A>,
    classes: &[CellClass],
    valid_cells: &[usize],
    starts: &[usize],
    window: OutputWindow<'_>,
) where
    B: ParallelBackend,
    G: CellGeometry + ?Sized,
    A: ScalarField + ?Sized,
{
    backend.for_each_window(starts, window, |slot, out| {
        let cell = valid_cells[slot];
        let class = classes[cell];
        debug_assert_eq!(out.len(), class.vertex_count as usize);
        generate_cell(params, cell, class.case_index, out);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_cell;
    use crate::source::CellArrays;

    const UNIT_TET: [Vec3; 4] = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];

    fn generate_single(scalars: [f32; 4], aux: [f32; 4], isovalue: f32) -> (Vec<Vec4>, Vec<Vec3>, Vec<f32>) {
        let input = CellArrays::single(scalars, UNIT_TET);
        let aux = CellArrays::single(aux, UNIT_TET);
        let class = classify_cell(scalars, isovalue);
        let n = class.vertex_count as usize;
        let mut p = vec![Vec4::ZERO; n];
        let mut nrm = vec![Vec3::ZERO; n];
        let mut s = vec![0.0; n];
        let params = GenerateParams { input: &input, aux: &aux, isovalue, policy: DegenerateEdge::Midpoint };
        generate_cell(params, 0, class.case_index, OutputWindow::new(&mut p, &mut nrm, &mut s));
        (p, nrm, s)
    }

    #[test]
    fn test_edge_parameter() {
        assert_eq!(edge_parameter(0.5, 0.0, 1.0, DegenerateEdge::Midpoint), 0.5);
        assert_eq!(edge_parameter(0.25, 1.0, 0.0, DegenerateEdge::Midpoint), 0.75);
        assert_eq!(edge_parameter(2.0, 0.0, 1.0, DegenerateEdge::Midpoint), 1.0);
    }

    #[test]
    fn test_degenerate_edge_policy() {
        assert_eq!(edge_parameter(0.5, 0.5, 0.5, DegenerateEdge::Midpoint), 0.5);
        assert_eq!(edge_parameter(0.5, 0.5, 0.5, DegenerateEdge::SnapToFirst), 0.0);
        assert_eq!(edge_parameter(0.5, 0.0, f32::INFINITY, DegenerateEdge::Midpoint), 0.0);
        assert_eq!(edge_parameter(0.5, f32::NAN, 1.0, DegenerateEdge::Midpoint), 0.5);
        assert_eq!(edge_parameter(0.5, f32::NAN, 1.0, DegenerateEdge::SnapToFirst), 0.0);
    }

    #[test]
    fn test_edge_parameter_with_extreme_corners() {
        let t = edge_parameter(0.5, f32::MIN, f32::MAX, DegenerateEdge::Midpoint);
        assert!((t - 0.5).abs() < 1e-6, "t = {}", t);
        assert_eq!(edge_parameter(0.0, -1e30, 1e30, DegenerateEdge::SnapToFirst), 0.5);
    }

    #[test]
    fn test_extreme_corners_give_finite_scalars() {
        let (p, n, s) = generate_single([f32::MIN, f32::MAX, 0.0, 1.0], [f32::MIN, f32::MAX, 0.0, 1.0], 0.5);
        assert_eq!(p.len(), 6);
        assert!(p.iter().all(|v| v.is_finite()));
        assert!(n.iter().all(|v| v.is_finite()));
        assert!(s.iter().all(|v| v.is_finite()), "scalars {:?}", s);
    }

    #[test]
    fn test_zero_area_normal_is_zero() {
        let a = Vec4::point(Vec3::ZERO);
        let b = Vec4::point(Vec3::X);
        assert_eq!(face_normal(a, b, b), Vec3::ZERO);
    }

    #[test]
    fn test_single_corner_below() {
        let (p, n, s) = generate_single([0.0, 1.0, 1.0, 1.0], [0.0, 2.0, 4.0, 6.0], 0.5);
        assert_eq!(p.len(), 3);
        // Edges 0, 3, 2 of case 1: (0,1), (0,3), (0,2)
        assert_eq!(p[0], Vec4::new(0.5, 0.0, 0.0, 1.0));
        assert_eq!(p[1], Vec4::new(0.0, 0.0, 0.5, 1.0));
        assert_eq!(p[2], Vec4::new(0.0, 0.5, 0.0, 1.0));
        assert_eq!(s, vec![1.0, 3.0, 2.0]);

        // Normal faces away from the higher values
        let expected = Vec3::new(-1.0, -1.0, -1.0).normalized();
        for normal in &n {
            assert!((*normal - expected).length() < 1e-6, "normal {:?}", normal);
        }
    }

    #[test]
    fn test_two_corners_below_quad() {
        let (p, n, _) = generate_single([0.0, 0.0, 1.0, 1.0], [0.0; 4], 0.5);
        assert_eq!(p.len(), 6);
        for v in &p {
            assert_eq!(v.w, 1.0);
        }
        // Flat shading: constant within each triangle
        assert_eq!(n[0], n[1]);
        assert_eq!(n[1], n[2]);
        assert_eq!(n[3], n[4]);
        assert_eq!(n[4], n[5]);
        // Both halves of the quad lie in one plane through the edge midpoints
        assert!((n[0] - n[3]).length() < 1e-6);
    }
}

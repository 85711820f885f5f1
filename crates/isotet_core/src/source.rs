//! Cell data sources
//!
//! The extractor reads every cell through these traits: four corner scalars
//! for classification and interpolation, four corner positions for geometry.
//! A second [`ScalarField`] supplies the auxiliary scalar that is only
//! interpolated onto the output, so one field's isosurface can be colored by
//! another.

use std::sync::Arc;

use isotet_math::{ImplicitFunction, TetMesh, Vec3};
use rayon::prelude::*;

use crate::error::SourceError;

/// Per-cell corner scalars
pub trait ScalarField: Sync {
    /// Number of tetrahedral cells
    fn cell_count(&self) -> usize;

    /// Field value at each corner of `cell`, in corner order
    fn corner_scalars(&self, cell: usize) -> [f32; 4];
}

/// Per-cell corner scalars and physical corner coordinates
pub trait CellGeometry: ScalarField {
    /// Physical coordinate of each corner of `cell`, in corner order
    fn corner_positions(&self, cell: usize) -> [Vec3; 4];
}

/// Flat corner arrays, four consecutive entries per cell
#[derive(Clone, Debug, Default)]
pub struct CellArrays {
    scalars: Vec<f32>,
    positions: Vec<Vec3>,
}

impl CellArrays {
    /// Build from per-corner arrays holding exactly `4 * cell_count` entries
    pub fn new(cell_count: usize, scalars: Vec<f32>, positions: Vec<Vec3>) -> Result<Self, SourceError> {
        check_corner_len("corner scalars", cell_count, scalars.len())?;
        check_corner_len("corner positions", cell_count, positions.len())?;
        Ok(Self { scalars, positions })
    }

    /// Single-cell source, handy for probing one tetrahedron
    pub fn single(scalars: [f32; 4], positions: [Vec3; 4]) -> Self {
        Self { scalars: scalars.to_vec(), positions: positions.to_vec() }
    }
}

impl ScalarField for CellArrays {
    #[inline]
    fn cell_count(&self) -> usize {
        self.scalars.len() / 4
    }

    #[inline]
    fn corner_scalars(&self, cell: usize) -> [f32; 4] {
        let c = &self.scalars[cell * 4..cell * 4 + 4];
        [c[0], c[1], c[2], c[3]]
    }
}

impl CellGeometry for CellArrays {
    #[inline]
    fn corner_positions(&self, cell: usize) -> [Vec3; 4] {
        let c = &self.positions[cell * 4..cell * 4 + 4];
        [c[0], c[1], c[2], c[3]]
    }
}

/// Flat corner scalars without geometry, for use as the auxiliary source
#[derive(Clone, Debug, Default)]
pub struct CornerScalars {
    values: Vec<f32>,
}

impl CornerScalars {
    pub fn new(cell_count: usize, values: Vec<f32>) -> Result<Self, SourceError> {
        check_corner_len("corner scalars", cell_count, values.len())?;
        Ok(Self { values })
    }
}

impl ScalarField for CornerScalars {
    #[inline]
    fn cell_count(&self) -> usize {
        self.values.len() / 4
    }

    #[inline]
    fn corner_scalars(&self, cell: usize) -> [f32; 4] {
        let c = &self.values[cell * 4..cell * 4 + 4];
        [c[0], c[1], c[2], c[3]]
    }
}

fn check_corner_len(what: &'static str, cell_count: usize, actual: usize) -> Result<(), SourceError> {
    let expected = cell_count * 4;
    if actual != expected {
        return Err(SourceError::LengthMismatch { what, expected, actual });
    }
    Ok(())
}

/// A tetrahedral mesh with one scalar per mesh vertex
///
/// The mesh is shared so that several fields (the classified field and an
/// auxiliary coloring field, say) can sit on the same tetrahedra.
#[derive(Clone, Debug)]
pub struct TetMeshField {
    mesh: Arc<TetMesh>,
    values: Vec<f32>,
}

impl TetMeshField {
    /// Attach per-vertex values to a mesh
    pub fn new(mesh: Arc<TetMesh>, values: Vec<f32>) -> Result<Self, SourceError> {
        if values.len() != mesh.vertex_count() {
            return Err(SourceError::LengthMismatch {
                what: "vertex values",
                expected: mesh.vertex_count(),
                actual: values.len(),
            });
        }
        if let Some((tetrahedron, vertex)) = mesh.first_invalid_tetrahedron() {
            return Err(SourceError::VertexOutOfRange {
                tetrahedron,
                vertex,
                vertex_count: mesh.vertex_count(),
            });
        }
        Ok(Self { mesh, values })
    }

    /// Evaluate `function` at every mesh vertex in parallel
    pub fn sample<F>(mesh: Arc<TetMesh>, function: &F) -> Result<Self, SourceError>
    where
        F: ImplicitFunction + ?Sized,
    {
        let values: Vec<f32> = mesh.vertices().par_iter().map(|&p| function.value(p)).collect();
        Self::new(mesh, values)
    }

    #[inline]
    pub fn mesh(&self) -> &Arc<TetMesh> {
        &self.mesh
    }

    /// Per-vertex values
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest vertex value, ignoring non-finite ones
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl ScalarField for TetMeshField {
    #[inline]
    fn cell_count(&self) -> usize {
        self.mesh.tetrahedron_count()
    }

    #[inline]
    fn corner_scalars(&self, cell: usize) -> [f32; 4] {
        let [a, b, c, d] = self.mesh.tetrahedra()[cell].indices;
        [self.values[a], self.values[b], self.values[c], self.values[d]]
    }
}

impl CellGeometry for TetMeshField {
    #[inline]
    fn corner_positions(&self, cell: usize) -> [Vec3; 4] {
        self.mesh.corner_positions(cell)
    }
}

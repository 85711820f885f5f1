//! Tetrahedral mesh primitives
//!
//! A volume is handed to the extractor as a set of tetrahedra. This module
//! provides the indexed representation: one shared vertex array and a list of
//! tetrahedra referencing it.

use crate::Vec3;

/// A tetrahedron (3-simplex) defined by vertex indices
///
/// Corner order matters to the extractor: corner `i` of the tetrahedron is
/// `indices[i]`, and the classification bit for corner `i` has weight `1 << i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tetrahedron {
    /// Indices into the parent mesh's vertex array
    pub indices: [usize; 4],
}

impl Tetrahedron {
    /// Create a new tetrahedron with the given vertex indices
    #[inline]
    pub fn new(indices: [usize; 4]) -> Self {
        Self { indices }
    }
}

/// An indexed tetrahedral mesh
#[derive(Clone, Debug, Default)]
pub struct TetMesh {
    vertices: Vec<Vec3>,
    tetrahedra: Vec<Tetrahedron>,
}

impl TetMesh {
    /// Create a mesh from a vertex array and tetrahedra referencing it
    ///
    /// Indices are not checked here; see [`TetMesh::first_invalid_tetrahedron`].
    pub fn new(vertices: Vec<Vec3>, tetrahedra: Vec<Tetrahedron>) -> Self {
        Self { vertices, tetrahedra }
    }

    /// Get the vertices of this mesh
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Get the tetrahedra of this mesh
    #[inline]
    pub fn tetrahedra(&self) -> &[Tetrahedron] {
        &self.tetrahedra
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn tetrahedron_count(&self) -> usize {
        self.tetrahedra.len()
    }

    /// Physical positions of the four corners of a tetrahedron
    #[inline]
    pub fn corner_positions(&self, tet_idx: usize) -> [Vec3; 4] {
        let [a, b, c, d] = self.tetrahedra[tet_idx].indices;
        [self.vertices[a], self.vertices[b], self.vertices[c], self.vertices[d]]
    }

    /// Signed volume of a tetrahedron (positive for right-handed corner order)
    pub fn signed_volume(&self, tet_idx: usize) -> f32 {
        let [p0, p1, p2, p3] = self.corner_positions(tet_idx);
        (p1 - p0).dot((p2 - p0).cross(p3 - p0)) / 6.0
    }

    /// Find the first tetrahedron that references a vertex outside the vertex array
    ///
    /// Returns `(tetrahedron index, offending vertex index)`.
    pub fn first_invalid_tetrahedron(&self) -> Option<(usize, usize)> {
        let count = self.vertices.len();
        self.tetrahedra.iter().enumerate().find_map(|(tet_idx, tet)| {
            tet.indices
                .iter()
                .find(|&&v| v >= count)
                .map(|&v| (tet_idx, v))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tet() -> TetMesh {
        TetMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![Tetrahedron::new([0, 1, 2, 3])],
        )
    }

    #[test]
    fn test_corner_positions_follow_index_order() {
        let mesh = TetMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            vec![Tetrahedron::new([3, 2, 1, 0])],
        );
        assert_eq!(mesh.corner_positions(0), [Vec3::Z, Vec3::Y, Vec3::X, Vec3::ZERO]);
    }

    #[test]
    fn test_signed_volume() {
        let mesh = unit_tet();
        assert!((mesh.signed_volume(0) - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_index_detected() {
        let mesh = TetMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![Tetrahedron::new([0, 1, 2, 7])],
        );
        assert_eq!(mesh.first_invalid_tetrahedron(), Some((0, 7)));
        assert_eq!(unit_tet().first_invalid_tetrahedron(), None);
    }
}

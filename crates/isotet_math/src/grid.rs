//! Structured grid decomposition into tetrahedra
//!
//! A box is split into `nx * ny * nz` cubes; each cube is split into six
//! tetrahedra using the Kuhn (Freudenthal) triangulation. Every cube uses the
//! same main diagonal, so shared faces between neighbouring cubes are split
//! identically and the resulting mesh is conforming.

use crate::{Vec3, shape::{TetMesh, Tetrahedron}};

/// The six permutations of the three axes; each one is a monotone path from
/// cube corner `0b000` to `0b111`.
const AXIS_PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0],
];

fn is_odd_permutation(perm: &[usize; 3]) -> bool {
    let mut inversions = 0;
    for a in 0..3 {
        for b in (a + 1)..3 {
            if perm[a] > perm[b] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}

/// An axis-aligned box sampled on a regular lattice
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    /// Number of cubes along x, y, z
    pub resolution: [usize; 3],
    /// Minimum corner of the box
    pub min: Vec3,
    /// Maximum corner of the box
    pub max: Vec3,
}

impl GridSpec {
    /// Create a grid spec
    pub fn new(resolution: [usize; 3], min: Vec3, max: Vec3) -> Self {
        Self { resolution, min, max }
    }

    /// Grid with the same number of cubes along every axis
    pub fn cubic(resolution: usize, min: Vec3, max: Vec3) -> Self {
        Self::new([resolution; 3], min, max)
    }

    /// Number of lattice points along each axis
    #[inline]
    pub fn points_per_axis(&self) -> [usize; 3] {
        [self.resolution[0] + 1, self.resolution[1] + 1, self.resolution[2] + 1]
    }

    /// Number of cubes in the grid
    #[inline]
    pub fn cube_count(&self) -> usize {
        self.resolution[0] * self.resolution[1] * self.resolution[2]
    }

    /// Number of tetrahedra the decomposition produces
    #[inline]
    pub fn tetrahedron_count(&self) -> usize {
        self.cube_count() * AXIS_PERMUTATIONS.len()
    }

    /// Linear index of lattice point `(i, j, k)`
    #[inline]
    pub fn point_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [px, py, _] = self.points_per_axis();
        i + px * (j + py * k)
    }

    /// Size of one cube along each axis
    pub fn cell_size(&self) -> Vec3 {
        let extent = self.max - self.min;
        Vec3::new(
            extent.x / self.resolution[0].max(1) as f32,
            extent.y / self.resolution[1].max(1) as f32,
            extent.z / self.resolution[2].max(1) as f32,
        )
    }

    /// Build the tetrahedral mesh for this grid
    ///
    /// Every tetrahedron is emitted with positive signed volume.
    pub fn to_mesh(&self) -> TetMesh {
        let [px, py, pz] = self.points_per_axis();
        let step = self.cell_size();

        let mut vertices = Vec::with_capacity(px * py * pz);
        for k in 0..pz {
            for j in 0..py {
                for i in 0..px {
                    vertices.push(self.min + step.component_mul(Vec3::new(i as f32, j as f32, k as f32)));
                }
            }
        }

        let mut tetrahedra = Vec::with_capacity(self.tetrahedron_count());
        let [nx, ny, nz] = self.resolution;
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    // Cube corner with bit 0 = x, bit 1 = y, bit 2 = z
                    let corner = |bits: usize| {
                        self.point_index(i + (bits & 1), j + ((bits >> 1) & 1), k + ((bits >> 2) & 1))
                    };
                    for perm in &AXIS_PERMUTATIONS {
                        let b1 = 1 << perm[0];
                        let b2 = b1 | (1 << perm[1]);
                        let mut indices = [corner(0), corner(b1), corner(b2), corner(0b111)];
                        // Odd permutations are left-handed
                        if is_odd_permutation(perm) {
                            indices.swap(2, 3);
                        }
                        tetrahedra.push(Tetrahedron::new(indices));
                    }
                }
            }
        }

        TetMesh::new(vertices, tetrahedra)
    }
}

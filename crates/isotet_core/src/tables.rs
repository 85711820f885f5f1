//! Lookup tables for tetrahedron isosurface triangulation
//!
//! A tetrahedron has 4 corners and 6 edges. Each corner is either below the
//! isovalue or not, giving 2^4 = 16 configurations. Corner `i` contributes bit
//! `i` (weight `1 << i`) to the configuration index; the triangle table below
//! is only correct for exactly that bit assignment.

/// Marks the end of the valid entries in a [`TRI_TABLE`] row
pub const SENTINEL: i8 = -1;

/// Maximum number of output vertices a single tetrahedron can emit
pub const MAX_VERTICES_PER_CELL: usize = 6;

/// Edge definitions for a tetrahedron
/// Each edge connects two corners (indexed 0-3)
pub const EDGE_VERTICES: [[usize; 2]; 6] = [
    [0, 1], // Edge 0
    [1, 2], // Edge 1
    [0, 2], // Edge 2
    [0, 3], // Edge 3
    [1, 3], // Edge 4
    [2, 3], // Edge 5
];

/// For each configuration, the edges forming its triangles, three per
/// triangle, followed by [`SENTINEL`] padding.
pub const TRI_TABLE: [[i8; 7]; 16] = [
    [-1, -1, -1, -1, -1, -1, -1],
    [ 0,  3,  2, -1, -1, -1, -1],
    [ 0,  1,  4, -1, -1, -1, -1],
    [ 1,  4,  2,  2,  4,  3, -1],

    [ 1,  2,  5, -1, -1, -1, -1],
    [ 0,  3,  5,  0,  5,  1, -1],
    [ 0,  2,  5,  0,  5,  4, -1],
    [ 5,  4,  3, -1, -1, -1, -1],

    [ 3,  4,  5, -1, -1, -1, -1],
    [ 4,  5,  0,  5,  2,  0, -1],
    [ 1,  5,  0,  5,  3,  0, -1],
    [ 5,  2,  1, -1, -1, -1, -1],

    [ 3,  4,  2,  2,  4,  1, -1],
    [ 4,  1,  0, -1, -1, -1, -1],
    [ 2,  3,  0, -1, -1, -1, -1],
    [-1, -1, -1, -1, -1, -1, -1],
];

/// Number of output vertices per configuration
pub const NUM_VERTICES_TABLE: [u8; 16] = [
    0, 3, 3, 6, 3, 6, 6, 3,
    3, 6, 6, 3, 6, 3, 3, 0,
];

/// For each configuration, which edges are crossed by the isosurface.
/// Bit `e` is set if edge `e` has one endpoint below the isovalue and the other not.
pub const EDGE_TABLE: [u8; 16] = compute_edge_table();

/// Compute the edge table at compile time
const fn compute_edge_table() -> [u8; 16] {
    let mut table = [0u8; 16];
    let mut case_idx: usize = 0;

    while case_idx < 16 {
        let mut edge_mask = 0u8;
        let mut edge_idx = 0;

        while edge_idx < 6 {
            let v0_below = (case_idx >> EDGE_VERTICES[edge_idx][0]) & 1;
            let v1_below = (case_idx >> EDGE_VERTICES[edge_idx][1]) & 1;

            if v0_below != v1_below {
                edge_mask |= 1 << edge_idx;
            }

            edge_idx += 1;
        }

        table[case_idx] = edge_mask;
        case_idx += 1;
    }

    table
}

/// Number of output vertices for a configuration
#[inline]
pub const fn vertex_count(case_idx: usize) -> usize {
    NUM_VERTICES_TABLE[case_idx] as usize
}

/// Edge id for output vertex slot `v` of a configuration
///
/// `v` must be below [`vertex_count`]; the hot path never reads the sentinel.
#[inline]
pub const fn triangle_edge(case_idx: usize, v: usize) -> usize {
    TRI_TABLE[case_idx][v] as usize
}

/// A lookup-table invariant that does not hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Vertex count is not 0, 3 or 6
    BadVertexCount { case_idx: usize, count: u8 },
    /// A slot below the vertex count holds the sentinel or an out-of-range edge
    BadEdge { case_idx: usize, slot: usize, value: i8 },
    /// A slot at or past the vertex count is not the sentinel
    MissingSentinel { case_idx: usize, slot: usize },
    /// The triangles use an edge that the configuration does not cross
    EdgeNotCrossed { case_idx: usize, edge: usize },
    /// A crossed edge is never used by the triangles
    EdgeUnused { case_idx: usize, edge: usize },
    /// Complementary configurations disagree on the vertex count
    Asymmetric { case_idx: usize },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::BadVertexCount { case_idx, count } => {
                write!(f, "case {}: vertex count {} is not 0, 3 or 6", case_idx, count)
            }
            TableError::BadEdge { case_idx, slot, value } => {
                write!(f, "case {}: slot {} holds invalid edge {}", case_idx, slot, value)
            }
            TableError::MissingSentinel { case_idx, slot } => {
                write!(f, "case {}: slot {} should be the sentinel", case_idx, slot)
            }
            TableError::EdgeNotCrossed { case_idx, edge } => {
                write!(f, "case {}: edge {} is used but not crossed", case_idx, edge)
            }
            TableError::EdgeUnused { case_idx, edge } => {
                write!(f, "case {}: crossed edge {} is never used", case_idx, edge)
            }
            TableError::Asymmetric { case_idx } => {
                write!(f, "cases {} and {} have different vertex counts", case_idx, 15 - case_idx)
            }
        }
    }
}

impl std::error::Error for TableError {}

/// Verify every invariant of the lookup tables
pub fn check_tables() -> Result<(), TableError> {
    for case_idx in 0..16 {
        let count = NUM_VERTICES_TABLE[case_idx];
        if !matches!(count, 0 | 3 | 6) {
            return Err(TableError::BadVertexCount { case_idx, count });
        }
        if NUM_VERTICES_TABLE[15 - case_idx] != count {
            return Err(TableError::Asymmetric { case_idx });
        }

        let row = &TRI_TABLE[case_idx];
        let mut used = 0u8;
        for (slot, &value) in row.iter().enumerate() {
            if slot < count as usize {
                if !(0..6).contains(&value) {
                    return Err(TableError::BadEdge { case_idx, slot, value });
                }
                let edge = value as usize;
                if EDGE_TABLE[case_idx] & (1 << edge) == 0 {
                    return Err(TableError::EdgeNotCrossed { case_idx, edge });
                }
                used |= 1 << edge;
            } else if value != SENTINEL {
                return Err(TableError::MissingSentinel { case_idx, slot });
            }
        }

        let unused = EDGE_TABLE[case_idx] & !used;
        if unused != 0 {
            return Err(TableError::EdgeUnused { case_idx, edge: unused.trailing_zeros() as usize });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_consistent() {
        assert_eq!(check_tables(), Ok(()));
    }

    #[test]
    fn test_edge_table_case_0() {
        // No corners below - no edges crossed
        assert_eq!(EDGE_TABLE[0], 0);
    }

    #[test]
    fn test_edge_table_case_15() {
        // All corners below - no edges crossed
        assert_eq!(EDGE_TABLE[15], 0);
    }

    #[test]
    fn test_edge_table_case_1() {
        // Corner 0 below - edges 0 (0-1), 2 (0-2), 3 (0-3)
        assert_eq!(EDGE_TABLE[1], 0b001101);
    }

    #[test]
    fn test_edge_table_case_3() {
        // Corners 0,1 below - every edge except 0 (0-1) and 5 (2-3)
        assert_eq!(EDGE_TABLE[3], 0b011110);
    }

    #[test]
    fn test_vertex_counts() {
        for case_idx in 0..16 {
            let count = vertex_count(case_idx);
            assert!(count == 0 || count == 3 || count == 6);
            // Three crossed edges give one triangle, four give a quad (two triangles)
            let crossed = EDGE_TABLE[case_idx].count_ones() as usize;
            let expected = match crossed {
                0 => 0,
                3 => 3,
                4 => 6,
                other => panic!("case {} crosses {} edges", case_idx, other),
            };
            assert_eq!(count, expected, "case {}", case_idx);
        }
        assert_eq!(vertex_count(0), 0);
        assert_eq!(vertex_count(15), 0);
    }

    #[test]
    fn test_count_distribution() {
        let count_0 = (0..16).filter(|&i| vertex_count(i) == 0).count();
        let count_3 = (0..16).filter(|&i| vertex_count(i) == 3).count();
        let count_6 = (0..16).filter(|&i| vertex_count(i) == 6).count();

        assert_eq!(count_0, 2); // cases 0 and 15
        assert_eq!(count_3, 8); // C(4,1) + C(4,3)
        assert_eq!(count_6, 6); // C(4,2)
    }

    #[test]
    fn test_edge_vertices_cover_all_pairs() {
        let mut pairs: Vec<[usize; 2]> = EDGE_VERTICES.to_vec();
        pairs.sort();
        assert_eq!(pairs, vec![[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]]);
    }

    #[test]
    fn test_triangle_edge_lookup() {
        assert_eq!(triangle_edge(1, 0), 0);
        assert_eq!(triangle_edge(1, 1), 3);
        assert_eq!(triangle_edge(1, 2), 2);
        assert_eq!(triangle_edge(12, 5), 1);
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", TableError::EdgeNotCrossed { case_idx: 3, edge: 5 });
        assert!(msg.contains("case 3"));
        assert!(msg.contains("edge 5"));
    }
}

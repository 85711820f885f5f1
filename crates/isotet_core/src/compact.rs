//! Stages 2 and 3: stream compaction of valid cells and output indexing
//!
//! Both stages are prefix sums. The first scans a 0/1 validity flag over all
//! cells and recovers the valid cell ids by upper-bound search; the second
//! scans only the valid cells' vertex counts to give each one a private,
//! contiguous output window. No cell ever appends to shared output.

use crate::parallel::ParallelBackend;

/// Result of compacting the valid cells
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compaction {
    /// Inclusive scan of the validity flag over every cell
    pub valid_cell_enum: Vec<usize>,
    /// Ids of the valid cells, ascending
    pub valid_cell_indices: Vec<usize>,
}

impl Compaction {
    #[inline]
    pub fn valid_count(&self) -> usize {
        self.valid_cell_indices.len()
    }
}

/// Output layout of the valid cells
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputIndex {
    /// First output vertex of each valid cell (exclusive scan of counts)
    pub starts: Vec<usize>,
    /// Total number of output vertices
    pub total_vertices: usize,
}

/// Find the cells with a non-zero vertex count
pub fn compact_valid_cells<B: ParallelBackend>(backend: &B, vertex_counts: &[usize]) -> Compaction {
    let flags = backend.map_range(vertex_counts.len(), |cell| (vertex_counts[cell] != 0) as usize);
    let valid_cell_enum = backend.inclusive_scan(&flags);
    let valid_count = valid_cell_enum.last().copied().unwrap_or(0);
    let valid_cell_indices = backend.upper_bound_sequence(&valid_cell_enum, valid_count);

    Compaction { valid_cell_enum, valid_cell_indices }
}

/// Assign each valid cell its first output vertex
pub fn index_output<B: ParallelBackend>(
    backend: &B,
    vertex_counts: &[usize],
    valid_cells: &[usize],
) -> OutputIndex {
    let valid_counts = backend.gather(vertex_counts, valid_cells);
    let starts = backend.exclusive_scan(&valid_counts);
    let total_vertices = match (valid_counts.last(), starts.last()) {
        (Some(&count), Some(&start)) => start + count,
        _ => 0,
    };

    OutputIndex { starts, total_vertices }
}

//! Stage 1: per-cell classification

use crate::parallel::ParallelBackend;
use crate::source::ScalarField;
use crate::tables::NUM_VERTICES_TABLE;

/// Configuration of one cell against the isovalue
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellClass {
    /// 4-bit code, bit `i` set when corner `i` is below the isovalue
    pub case_index: u8,
    /// Output vertices this cell emits (0, 3 or 6)
    pub vertex_count: u8,
}

/// Configuration index of a cell from its corner values
///
/// The comparison is strict: a corner exactly at the isovalue counts as
/// not below it.
#[inline]
pub fn case_index(values: [f32; 4], isovalue: f32) -> u8 {
    (values[0] < isovalue) as u8
        | ((values[1] < isovalue) as u8) << 1
        | ((values[2] < isovalue) as u8) << 2
        | ((values[3] < isovalue) as u8) << 3
}

#[inline]
pub fn classify_cell(values: [f32; 4], isovalue: f32) -> CellClass {
    let case_index = case_index(values, isovalue);
    CellClass {
        case_index,
        vertex_count: NUM_VERTICES_TABLE[case_index as usize],
    }
}

/// Classify every cell of `source`
pub fn classify_cells<B, S>(backend: &B, source: &S, isovalue: f32) -> Vec<CellClass>
where
    B: ParallelBackend,
    S: ScalarField + ?Sized,
{
    backend.map_range(source.cell_count(), |cell| {
        classify_cell(source.corner_scalars(cell), isovalue)
    })
}

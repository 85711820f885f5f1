//! Output finiteness check

use crate::parallel::ParallelBackend;
use crate::sink::OutputWindow;

/// Index of the first vertex with a NaN or infinite position, normal or scalar
pub fn first_non_finite<B: ParallelBackend>(backend: &B, window: &OutputWindow<'_>) -> Option<usize> {
    let positions = &*window.positions;
    let normals = &*window.normals;
    let scalars = &*window.scalars;
    backend.find_first(window.len(), |v| {
        !(positions[v].is_finite() && normals[v].is_finite() && scalars[v].is_finite())
    })
}

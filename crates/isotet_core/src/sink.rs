//! Output storage for extracted geometry
//!
//! The geometry generator writes into an [`OutputWindow`]: three parallel,
//! randomly writable slices for positions, normals and scalars. Where those
//! slices live is up to the [`OutputSink`]. [`HostOutput`] keeps them in plain
//! vectors; a display-buffer sink maps graphics memory for the duration of one
//! write and unmaps it afterwards.

use isotet_math::{Vec3, Vec4};

use crate::error::{ExtractError, SinkError};

/// Mutable view of a contiguous range of output vertices
///
/// All three slices always have the same length.
#[derive(Debug)]
pub struct OutputWindow<'a> {
    pub positions: &'a mut [Vec4],
    pub normals: &'a mut [Vec3],
    pub scalars: &'a mut [f32],
}

impl<'a> OutputWindow<'a> {
    /// Bundle three equally long slices into a window
    ///
    /// # Panics
    /// If the slice lengths differ.
    pub fn new(positions: &'a mut [Vec4], normals: &'a mut [Vec3], scalars: &'a mut [f32]) -> Self {
        assert!(
            positions.len() == normals.len() && normals.len() == scalars.len(),
            "output slices differ in length: {} / {} / {}",
            positions.len(),
            normals.len(),
            scalars.len()
        );
        Self { positions, normals, scalars }
    }

    /// Number of vertices in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Split into `[0, mid)` and `[mid, len)`
    pub fn split_at(self, mid: usize) -> (OutputWindow<'a>, OutputWindow<'a>) {
        let (p0, p1) = self.positions.split_at_mut(mid);
        let (n0, n1) = self.normals.split_at_mut(mid);
        let (s0, s1) = self.scalars.split_at_mut(mid);
        (
            OutputWindow { positions: p0, normals: n0, scalars: s0 },
            OutputWindow { positions: p1, normals: n1, scalars: s1 },
        )
    }

    /// Borrow the window again for a shorter lifetime
    #[inline]
    pub fn reborrow(&mut self) -> OutputWindow<'_> {
        OutputWindow {
            positions: &mut *self.positions,
            normals: &mut *self.normals,
            scalars: &mut *self.scalars,
        }
    }
}

/// Callback that fills a window of output vertices
pub type FillFn<'f> = dyn FnMut(OutputWindow<'_>) -> Result<(), ExtractError> + 'f;

/// Storage the geometry generator writes into
///
/// The extractor calls [`ensure_capacity`](OutputSink::ensure_capacity) once
/// the total vertex count is known, then [`write`](OutputSink::write) exactly
/// once. Implementations backed by mapped memory acquire it inside `write`
/// and must release it before returning, whatever `fill` returns.
pub trait OutputSink {
    /// Make room for at least `vertex_count` vertices
    fn ensure_capacity(&mut self, vertex_count: usize) -> Result<(), SinkError>;

    /// Expose a window of exactly `vertex_count` vertices to `fill`
    ///
    /// Fails with [`SinkError::CapacityExceeded`] rather than writing past the
    /// storage reserved by `ensure_capacity`.
    fn write(&mut self, vertex_count: usize, fill: &mut FillFn<'_>) -> Result<(), ExtractError>;

    /// Drop all output (the zero-valid-cell result)
    fn clear(&mut self);

    /// Number of vertices currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output held in ordinary process memory
#[derive(Clone, Debug, Default)]
pub struct HostOutput {
    vertices: Vec<Vec4>,
    normals: Vec<Vec3>,
    scalars: Vec<f32>,
}

impl HostOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Output vertex positions, three per triangle
    #[inline]
    pub fn vertices(&self) -> &[Vec4] {
        &self.vertices
    }

    /// One normal per vertex, constant within each triangle
    #[inline]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Interpolated auxiliary scalar per vertex
    #[inline]
    pub fn scalars(&self) -> &[f32] {
        &self.scalars
    }

    /// Number of output vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Iterate triangles as position triples
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.vertices
            .chunks_exact(3)
            .map(|tri| [tri[0].xyz(), tri[1].xyz(), tri[2].xyz()])
    }
}

impl OutputSink for HostOutput {
    fn ensure_capacity(&mut self, vertex_count: usize) -> Result<(), SinkError> {
        self.vertices.resize(vertex_count, Vec4::ZERO);
        self.normals.resize(vertex_count, Vec3::ZERO);
        self.scalars.resize(vertex_count, 0.0);
        Ok(())
    }

    fn write(&mut self, vertex_count: usize, fill: &mut FillFn<'_>) -> Result<(), ExtractError> {
        if self.vertices.len() < vertex_count {
            return Err(SinkError::CapacityExceeded {
                requested: vertex_count,
                max: self.vertices.len(),
            }
            .into());
        }
        self.vertices.truncate(vertex_count);
        self.normals.truncate(vertex_count);
        self.scalars.truncate(vertex_count);

        fill(OutputWindow::new(&mut self.vertices, &mut self.normals, &mut self.scalars))
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.scalars.clear();
    }

    fn len(&self) -> usize {
        HostOutput::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_split() {
        let mut p = vec![Vec4::ZERO; 5];
        let mut n = vec![Vec3::ZERO; 5];
        let mut s = vec![0.0; 5];
        let window = OutputWindow::new(&mut p, &mut n, &mut s);
        let (left, right) = window.split_at(2);
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 3);
        right.scalars[0] = 7.0;
        assert_eq!(s[2], 7.0);
    }

    #[test]
    #[should_panic(expected = "differ in length")]
    fn test_window_rejects_mismatched_slices() {
        let mut p = vec![Vec4::ZERO; 3];
        let mut n = vec![Vec3::ZERO; 2];
        let mut s = vec![0.0; 3];
        let _ = OutputWindow::new(&mut p, &mut n, &mut s);
    }

    #[test]
    fn test_host_output_write_exact_length() {
        let mut host = HostOutput::new();
        host.ensure_capacity(6).unwrap();
        host.write(6, &mut |w| {
            assert_eq!(w.len(), 6);
            for (i, s) in w.scalars.iter_mut().enumerate() {
                *s = i as f32;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(host.len(), 6);
        assert_eq!(host.scalars()[5], 5.0);
        assert_eq!(host.triangle_count(), 2);
    }

    #[test]
    fn test_host_output_refuses_overrun() {
        let mut host = HostOutput::new();
        host.ensure_capacity(3).unwrap();
        let result = host.write(6, &mut |_| Ok(()));
        assert_eq!(
            result,
            Err(ExtractError::Sink(SinkError::CapacityExceeded { requested: 6, max: 3 }))
        );
    }

    #[test]
    fn test_host_output_shrinks_on_reuse() {
        let mut host = HostOutput::new();
        host.ensure_capacity(9).unwrap();
        host.write(9, &mut |_| Ok(())).unwrap();
        host.ensure_capacity(3).unwrap();
        host.write(3, &mut |_| Ok(())).unwrap();
        assert_eq!(host.len(), 3);
        assert_eq!(host.normals().len(), 3);
    }

    #[test]
    fn test_host_output_clear() {
        let mut host = HostOutput::new();
        host.ensure_capacity(3).unwrap();
        host.write(3, &mut |_| Ok(())).unwrap();
        host.clear();
        assert!(host.is_empty());
        assert!(host.vertices().is_empty());
        assert!(host.normals().is_empty());
        assert!(host.scalars().is_empty());
    }

    #[test]
    fn test_triangles_iterator() {
        let mut host = HostOutput::new();
        host.ensure_capacity(3).unwrap();
        host.write(3, &mut |w| {
            w.positions[1] = Vec4::point(Vec3::X);
            Ok(())
        })
        .unwrap();
        let tris: Vec<_> = host.triangles().collect();
        assert_eq!(tris.len(), 1);
        assert_eq!(tris[0][1], Vec3::X);
    }
}

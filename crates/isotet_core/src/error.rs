//! Error types for extraction
//!
//! The failure surface is narrow: malformed input sources are rejected when a
//! source is built, output storage can fail to grow or map, and the output
//! validation pass can reject non-finite values. A failed invocation produces
//! no partial result.

use std::fmt;

/// Error building a cell data source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// A per-cell array does not hold exactly 4 entries per cell
    LengthMismatch { what: &'static str, expected: usize, actual: usize },
    /// A tetrahedron references a vertex outside the vertex array
    VertexOutOfRange { tetrahedron: usize, vertex: usize, vertex_count: usize },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::LengthMismatch { what, expected, actual } => {
                write!(f, "{} has {} entries, expected {}", what, actual, expected)
            }
            SourceError::VertexOutOfRange { tetrahedron, vertex, vertex_count } => write!(
                f,
                "tetrahedron {} references vertex {} but the mesh has {} vertices",
                tetrahedron, vertex, vertex_count
            ),
        }
    }
}

impl std::error::Error for SourceError {}

/// Error acquiring or growing output storage
#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    /// The sink cannot hold the requested number of vertices
    CapacityExceeded { requested: usize, max: usize },
    /// Allocation of backing storage failed
    OutOfMemory { requested_bytes: u64 },
    /// Storage could not be mapped for writing
    Map(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::CapacityExceeded { requested, max } => {
                write!(f, "output needs {} vertices but the sink holds at most {}", requested, max)
            }
            SinkError::OutOfMemory { requested_bytes } => {
                write!(f, "out of buffer memory allocating {} bytes", requested_bytes)
            }
            SinkError::Map(msg) => write!(f, "failed to map output storage: {}", msg),
        }
    }
}

impl std::error::Error for SinkError {}

/// Error from one extraction invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// Input source is malformed
    Source(SourceError),
    /// Output storage failed
    Sink(SinkError),
    /// Geometry and auxiliary scalar sources disagree on the cell count
    SourceMismatch { cells: usize, aux_cells: usize },
    /// Validation found a NaN or infinity in the output
    NonFiniteOutput { vertex: usize },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::Source(e) => write!(f, "Source error: {}", e),
            ExtractError::Sink(e) => write!(f, "Sink error: {}", e),
            ExtractError::SourceMismatch { cells, aux_cells } => write!(
                f,
                "geometry source has {} cells but scalar source has {}",
                cells, aux_cells
            ),
            ExtractError::NonFiniteOutput { vertex } => {
                write!(f, "non-finite value in output vertex {}", vertex)
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Source(e) => Some(e),
            ExtractError::Sink(e) => Some(e),
            ExtractError::SourceMismatch { .. } => None,
            ExtractError::NonFiniteOutput { .. } => None,
        }
    }
}

impl From<SourceError> for ExtractError {
    fn from(e: SourceError) -> Self {
        ExtractError::Source(e)
    }
}

impl From<SinkError> for ExtractError {
    fn from(e: SinkError) -> Self {
        ExtractError::Sink(e)
    }
}

//! Data-parallel marching tetrahedra
//!
//! Extracts a triangle mesh approximating the level set `f = isovalue` of a
//! scalar field sampled on the corners of tetrahedral cells.
//!
//! ## Pipeline
//!
//! - [`classify`] - per-cell configuration index and vertex count
//! - [`compact`] - stream compaction of valid cells and output indexing by prefix sums
//! - [`generate`] - vertex interpolation and flat per-triangle normals
//! - [`extractor`] - [`MarchingTetrahedra`], which runs the stages in order
//!
//! ## Seams
//!
//! - [`ParallelBackend`] - the bulk primitives every stage is written against
//! - [`CellGeometry`] / [`ScalarField`] - where corner data comes from
//! - [`OutputSink`] - where output vertices go
//!
//! ## Example
//!
//! ```
//! use isotet_core::{CellArrays, HostOutput, MarchingTetrahedra};
//! use isotet_math::Vec3;
//!
//! let cell = CellArrays::single([0.0, 1.0, 1.0, 1.0], [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z]);
//! let mut extractor = MarchingTetrahedra::new(0.5);
//! let mut output = HostOutput::new();
//! let summary = extractor.run_host(&cell, &cell, &mut output).unwrap();
//! assert_eq!(summary.triangles, 1);
//! ```

pub mod tables;
pub mod error;
pub mod parallel;
pub mod source;
pub mod sink;
pub mod classify;
pub mod compact;
pub mod generate;
pub mod validate;
pub mod extractor;

pub use error::{ExtractError, SinkError, SourceError};
pub use parallel::{ParallelBackend, RayonBackend, SerialBackend};
pub use source::{CellArrays, CellGeometry, CornerScalars, ScalarField, TetMeshField};
pub use sink::{FillFn, HostOutput, OutputSink, OutputWindow};
pub use classify::CellClass;
pub use generate::DegenerateEdge;
pub use extractor::{ExtractionSummary, ExtractorConfig, MarchingTetrahedra};
pub use tables::{check_tables, TableError};

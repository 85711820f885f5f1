//! The marching tetrahedra pipeline
//!
//! One invocation runs four data-parallel stages, each finishing completely
//! before the next starts:
//!
//! 1. classify every cell against the isovalue
//! 2. compact the cells that emit geometry
//! 3. assign each valid cell a window of output vertices
//! 4. interpolate vertices and flat normals into the windows
//!
//! Stage 4 writes through an [`OutputSink`], so the same pipeline fills host
//! vectors or mapped display buffers.

use std::ops::Range;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::classify::{classify_cells, CellClass};
use crate::compact::{compact_valid_cells, index_output};
use crate::error::ExtractError;
use crate::generate::{generate_geometry, DegenerateEdge, GenerateParams};
use crate::parallel::{ParallelBackend, RayonBackend};
use crate::sink::{HostOutput, OutputSink};
use crate::source::{CellGeometry, ScalarField};
use crate::tables::check_tables;
use crate::validate::first_non_finite;

/// Behaviour switches for the extractor
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Write into a caller-supplied external sink instead of host containers
    pub use_external_buffer: bool,
    /// Reject output containing NaN or infinity
    pub validate_output: bool,
    /// Interpolation fallback for edges whose crossing cannot be computed
    pub degenerate_edge: DegenerateEdge,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            use_external_buffer: false,
            validate_output: true,
            degenerate_edge: DegenerateEdge::Midpoint,
        }
    }
}

/// Counts from one extraction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub cell_count: usize,
    pub valid_cells: usize,
    pub total_vertices: usize,
    pub triangles: usize,
}

impl ExtractionSummary {
    fn new(cell_count: usize, valid_cells: usize, total_vertices: usize) -> Self {
        Self { cell_count, valid_cells, total_vertices, triangles: total_vertices / 3 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_vertices == 0
    }
}

/// Isosurface extractor for tetrahedral cells
///
/// The intermediate arrays of the last run are kept and can be inspected;
/// they are overwritten by the next run.
pub struct MarchingTetrahedra<B: ParallelBackend = RayonBackend> {
    backend: B,
    isovalue: f32,
    config: ExtractorConfig,

    classes: Vec<CellClass>,
    num_vertices: Vec<usize>,
    valid_cell_enum: Vec<usize>,
    valid_cell_indices: Vec<usize>,
    output_vertices_enum: Vec<usize>,
    num_total_vertices: usize,
}

impl MarchingTetrahedra<RayonBackend> {
    /// Create an extractor on the global rayon pool
    pub fn new(isovalue: f32) -> Self {
        Self::with_backend(RayonBackend::new(), isovalue)
    }
}

impl<B: ParallelBackend> MarchingTetrahedra<B> {
    /// Create an extractor running on `backend`
    pub fn with_backend(backend: B, isovalue: f32) -> Self {
        debug_assert!(check_tables().is_ok(), "lookup tables are inconsistent");
        Self {
            backend,
            isovalue,
            config: ExtractorConfig::default(),
            classes: Vec::new(),
            num_vertices: Vec::new(),
            valid_cell_enum: Vec::new(),
            valid_cell_indices: Vec::new(),
            output_vertices_enum: Vec::new(),
            num_total_vertices: 0,
        }
    }

    /// Set the extractor config (builder pattern)
    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn isovalue(&self) -> f32 {
        self.isovalue
    }

    /// Change the isovalue for subsequent runs
    pub fn set_isovalue(&mut self, isovalue: f32) {
        self.isovalue = isovalue;
    }

    #[inline]
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ExtractorConfig) {
        self.config = config;
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Extract the isosurface of `input` into host containers
    pub fn run_host<G, A>(
        &mut self,
        input: &G,
        aux: &A,
        output: &mut HostOutput,
    ) -> Result<ExtractionSummary, ExtractError>
    where
        G: CellGeometry + ?Sized,
        A: ScalarField + ?Sized,
    {
        self.run(input, aux, output)
    }

    /// Extract into `external` when the config asks for an external buffer
    /// and one is supplied, otherwise into `host`
    pub fn run_with<G, A>(
        &mut self,
        input: &G,
        aux: &A,
        host: &mut HostOutput,
        external: Option<&mut dyn OutputSink>,
    ) -> Result<ExtractionSummary, ExtractError>
    where
        G: CellGeometry + ?Sized,
        A: ScalarField + ?Sized,
    {
        match external {
            Some(sink) if self.config.use_external_buffer => self.run(input, aux, sink),
            Some(_) => self.run(input, aux, host),
            None => {
                if self.config.use_external_buffer {
                    log::warn!("External buffer requested but none supplied, writing to host output");
                }
                self.run(input, aux, host)
            }
        }
    }

    /// Extract the isosurface of `input` at the current isovalue into `sink`
    ///
    /// `aux` supplies the scalar interpolated onto the output vertices and
    /// must have the same cells as `input`. On failure the sink is cleared.
    pub fn run<G, A, S>(&mut self, input: &G, aux: &A, sink: &mut S) -> Result<ExtractionSummary, ExtractError>
    where
        G: CellGeometry + ?Sized,
        A: ScalarField + ?Sized,
        S: OutputSink + ?Sized,
    {
        let result = self.run_stages(input, aux, sink);
        if result.is_err() {
            self.num_total_vertices = 0;
            sink.clear();
        }
        result
    }

    fn run_stages<G, A, S>(&mut self, input: &G, aux: &A, sink: &mut S) -> Result<ExtractionSummary, ExtractError>
    where
        G: CellGeometry + ?Sized,
        A: ScalarField + ?Sized,
        S: OutputSink + ?Sized,
    {
        let cell_count = input.cell_count();
        if aux.cell_count() != cell_count {
            return Err(ExtractError::SourceMismatch { cells: cell_count, aux_cells: aux.cell_count() });
        }
        let started = Instant::now();

        // Stage 1: classification
        let classes = classify_cells(&self.backend, input, self.isovalue);
        self.num_vertices = self.backend.map_range(cell_count, |cell| classes[cell].vertex_count as usize);
        self.classes = classes;
        log::debug!("Classified {} cells in {:?}", cell_count, started.elapsed());

        // Stage 2: compaction
        let compaction = compact_valid_cells(&self.backend, &self.num_vertices);
        self.valid_cell_enum = compaction.valid_cell_enum;
        self.valid_cell_indices = compaction.valid_cell_indices;
        let valid_cells = self.valid_cell_indices.len();
        log::debug!("{} valid cells after {:?}", valid_cells, started.elapsed());

        if valid_cells == 0 {
            self.output_vertices_enum.clear();
            self.num_total_vertices = 0;
            sink.clear();
            return Ok(ExtractionSummary::new(cell_count, 0, 0));
        }

        // Stage 3: output indexing
        let index = index_output(&self.backend, &self.num_vertices, &self.valid_cell_indices);
        self.output_vertices_enum = index.starts;
        self.num_total_vertices = index.total_vertices;
        let total = index.total_vertices;

        // Stage 4: generation, between acquire and release of the sink
        sink.ensure_capacity(total)?;

        let backend = &self.backend;
        let classes = &self.classes;
        let valid = &self.valid_cell_indices;
        let starts = &self.output_vertices_enum;
        let validate = self.config.validate_output;
        let params = GenerateParams {
            input,
            aux,
            isovalue: self.isovalue,
            policy: self.config.degenerate_edge,
        };
        sink.write(total, &mut |mut window| {
            generate_geometry(backend, params, classes, valid, starts, window.reborrow());
            if validate {
                if let Some(vertex) = first_non_finite(backend, &window) {
                    return Err(ExtractError::NonFiniteOutput { vertex });
                }
            }
            Ok(())
        })?;

        log::debug!("Generated {} vertices in {:?}", total, started.elapsed());
        Ok(ExtractionSummary::new(cell_count, valid_cells, total))
    }

    /// Configuration index and vertex count of every cell from the last run
    #[inline]
    pub fn classes(&self) -> &[CellClass] {
        &self.classes
    }

    #[inline]
    pub fn num_vertices(&self) -> &[usize] {
        &self.num_vertices
    }

    /// Inclusive scan of the validity flag from the last run
    #[inline]
    pub fn valid_cell_enum(&self) -> &[usize] {
        &self.valid_cell_enum
    }

    #[inline]
    pub fn valid_cell_indices(&self) -> &[usize] {
        &self.valid_cell_indices
    }

    /// First output vertex of each valid cell from the last run
    #[inline]
    pub fn output_vertices_enum(&self) -> &[usize] {
        &self.output_vertices_enum
    }

    #[inline]
    pub fn num_total_vertices(&self) -> usize {
        self.num_total_vertices
    }

    /// Output vertex range written by valid cell `slot` in the last run
    pub fn output_window(&self, slot: usize) -> Option<Range<usize>> {
        let start = *self.output_vertices_enum.get(slot)?;
        let end = self
            .output_vertices_enum
            .get(slot + 1)
            .copied()
            .unwrap_or(self.num_total_vertices);
        Some(start..end)
    }
}

//! Extraction system
//!
//! Owns everything one isosurface extraction needs:
//! - The sampled input and auxiliary fields on a shared tetrahedral grid
//! - The extractor with its intermediate arrays
//! - Host output, plus an optional GPU sink

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use isotet_core::{
    ExtractError, ExtractionSummary, HostOutput, MarchingTetrahedra, OutputSink, RayonBackend, SourceError,
    TetMeshField,
};
use isotet_math::Vec3;
use isotet_render::{GpuContext, GpuSink};

use crate::config::AppConfig;

/// Error setting up the extraction system
#[derive(Debug)]
pub enum SystemError {
    /// Sampling a field onto the grid failed
    Source(SourceError),
    /// The worker pool could not be built
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::Source(e) => write!(f, "Failed to build input field: {}", e),
            SystemError::ThreadPool(e) => write!(f, "Failed to build worker pool: {}", e),
        }
    }
}

impl std::error::Error for SystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SystemError::Source(e) => Some(e),
            SystemError::ThreadPool(e) => Some(e),
        }
    }
}

impl From<SourceError> for SystemError {
    fn from(e: SourceError) -> Self {
        SystemError::Source(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for SystemError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SystemError::ThreadPool(e)
    }
}

/// Runs the configured extraction
pub struct ExtractionSystem {
    extractor: MarchingTetrahedra<RayonBackend>,
    field: TetMeshField,
    aux: Option<TetMeshField>,
    host: HostOutput,
    gpu: Option<GpuSink>,
}

impl ExtractionSystem {
    /// Sample the configured fields and set up the extractor
    ///
    /// A GPU sink is created only when the config asks for an external
    /// buffer; if no device is available the system writes to host memory.
    pub fn new(config: &AppConfig) -> Result<Self, SystemError> {
        let backend = match config.extraction.threads {
            0 => RayonBackend::new(),
            threads => RayonBackend::with_threads(threads)?,
        };
        let extractor = MarchingTetrahedra::with_backend(backend, config.extraction.isovalue)
            .with_config(config.extraction.to_extractor_config());

        let started = Instant::now();
        let mesh = Arc::new(config.field.grid().to_mesh());
        let field = TetMeshField::sample(mesh.clone(), &*config.field.function())?;
        let aux = match config.field.aux_function() {
            Some(function) => Some(TetMeshField::sample(mesh.clone(), &*function)?),
            None => None,
        };
        log::info!(
            "Sampled {:?} field: {} vertices, {} tetrahedra in {:?}",
            config.field.kind,
            mesh.vertex_count(),
            mesh.tetrahedron_count(),
            started.elapsed()
        );

        let gpu = if config.extraction.use_external_buffer {
            match GpuContext::new() {
                Ok(context) => {
                    log::info!("Writing output to GPU buffers on {}", context.adapter_name());
                    Some(GpuSink::new(context, config.color.to_color_map()))
                }
                Err(e) => {
                    log::warn!("GPU output unavailable: {}. Using host output.", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            extractor,
            field,
            aux,
            host: HostOutput::new(),
            gpu,
        })
    }

    /// Run one extraction at the current isovalue
    pub fn run(&mut self) -> Result<ExtractionSummary, ExtractError> {
        let started = Instant::now();
        let aux = self.aux.as_ref().unwrap_or(&self.field);
        let external = self.gpu.as_mut().map(|sink| sink as &mut dyn OutputSink);
        let summary = self.extractor.run_with(&self.field, aux, &mut self.host, external)?;
        log::info!(
            "Isovalue {}: {} of {} cells valid, {} triangles in {:?}",
            self.extractor.isovalue(),
            summary.valid_cells,
            summary.cell_count,
            summary.triangles,
            started.elapsed()
        );
        Ok(summary)
    }

    /// Change the isovalue for the next run
    pub fn set_isovalue(&mut self, isovalue: f32) {
        self.extractor.set_isovalue(isovalue);
    }

    pub fn extractor(&self) -> &MarchingTetrahedra<RayonBackend> {
        &self.extractor
    }

    /// Host output from the last run written to host memory
    pub fn host_output(&self) -> &HostOutput {
        &self.host
    }

    pub fn gpu_sink(&self) -> Option<&GpuSink> {
        self.gpu.as_ref()
    }

    /// Vertices written by the last run, to whichever sink received them
    pub fn output_vertex_count(&self) -> usize {
        match &self.gpu {
            Some(sink) => sink.len(),
            None => self.host.len(),
        }
    }

    /// Axis-aligned bounds of the last surface written to host memory
    ///
    /// `None` when the surface is empty or lives only in GPU buffers.
    pub fn surface_bounds(&self) -> Option<(Vec3, Vec3)> {
        self.host.triangles().flatten().fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((min, max)) => Some((min.min_components(p), max.max_components(p))),
        })
    }

    /// Range of the input field over the grid vertices
    pub fn field_range(&self) -> Option<(f32, f32)> {
        self.field.value_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuxKind, FieldKind};

    fn small_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.field.resolution = [8, 8, 8];
        config.field.bounds_min = [-1.5, -1.5, -1.5];
        config.field.bounds_max = [1.5, 1.5, 1.5];
        config
    }

    #[test]
    fn test_sphere_extraction() {
        let mut system = ExtractionSystem::new(&small_config()).unwrap();
        let summary = system.run().unwrap();
        assert!(summary.triangles > 0);
        assert_eq!(summary.cell_count, 8 * 8 * 8 * 6);
        assert_eq!(system.host_output().len(), summary.total_vertices);
        assert_eq!(system.output_vertex_count(), summary.total_vertices);
        assert!(system.gpu_sink().is_none());

        // Unit sphere sampled at spacing 3/8
        let (min, max) = system.surface_bounds().unwrap();
        for axis in [min.x, min.y, min.z] {
            assert!(axis < -0.8 && axis > -1.0 - 1e-4, "min {:?}", min);
        }
        for axis in [max.x, max.y, max.z] {
            assert!(axis > 0.8 && axis < 1.0 + 1e-4, "max {:?}", max);
        }
    }

    #[test]
    fn test_empty_surface_has_no_bounds() {
        let mut system = ExtractionSystem::new(&small_config()).unwrap();
        system.set_isovalue(10.0);
        system.run().unwrap();
        assert_eq!(system.output_vertex_count(), 0);
        assert!(system.surface_bounds().is_none());
    }

    #[test]
    fn test_aux_field_colors_by_height() {
        let mut config = small_config();
        config.field.aux_kind = AuxKind::Z;
        let mut system = ExtractionSystem::new(&config).unwrap();
        system.run().unwrap();
        for (v, s) in system.host_output().vertices().iter().zip(system.host_output().scalars()) {
            assert!((v.z - s).abs() < 1e-5);
        }
    }

    #[test]
    fn test_isovalue_outside_range_is_empty() {
        let mut config = small_config();
        config.field.kind = FieldKind::Torus;
        let mut system = ExtractionSystem::new(&config).unwrap();
        let (_, hi) = system.field_range().unwrap();
        system.set_isovalue(hi + 1.0);
        let summary = system.run().unwrap();
        assert!(summary.is_empty());
        assert!(system.host_output().is_empty());
    }

    #[test]
    fn test_dedicated_threads() {
        let mut config = small_config();
        config.extraction.threads = 2;
        let system = ExtractionSystem::new(&config).unwrap();
        assert_eq!(system.extractor().backend().thread_count(), 2);
    }
}

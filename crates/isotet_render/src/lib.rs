//! GPU output for isosurface extraction
//!
//! This crate lets the extractor write straight into wgpu vertex buffers.
//!
//! ## Key Components
//!
//! - [`context::GpuContext`] - Headless wgpu device and queue
//! - [`gpu_sink::GpuSink`] - [`isotet_core::OutputSink`] over position, normal and color buffers
//! - [`color_map::ColorMap`] - Maps the interpolated scalar to a vertex color
//! - [`types`] - Buffer strides shared by the sink and its callers

pub mod color_map;
pub mod context;
pub mod gpu_sink;
pub mod types;

pub use color_map::{ColorMap, Rgba};
pub use context::{GpuContext, GpuError};
pub use gpu_sink::GpuSink;

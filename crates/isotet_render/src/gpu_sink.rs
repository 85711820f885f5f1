//! Output sink backed by wgpu vertex buffers
//!
//! Extracted vertices are written straight into mapped staging memory and
//! copied into vertex buffers ready for drawing. The buffers grow only when
//! an extraction needs more vertices than they hold.

use std::sync::mpsc;

use isotet_core::{ExtractError, FillFn, OutputSink, OutputWindow, SinkError};
use isotet_math::{Vec3, Vec4};

use crate::color_map::ColorMap;
use crate::context::GpuContext;
use crate::types::{BYTES_PER_VERTEX, COLOR_STRIDE, NORMAL_STRIDE, POSITION_STRIDE};

/// Capacity to allocate so that `required` vertices fit
///
/// Grows by at least half the current capacity to avoid reallocating on
/// every small increase.
pub fn grown_capacity(current: usize, required: usize) -> usize {
    if required <= current {
        return current;
    }
    required.max(current.saturating_add(current / 2))
}

/// Most vertices a single buffer of `max_buffer_size` bytes can hold
pub fn max_vertices(max_buffer_size: u64) -> usize {
    let widest = POSITION_STRIDE.max(NORMAL_STRIDE).max(COLOR_STRIDE);
    usize::try_from(max_buffer_size / widest).unwrap_or(usize::MAX)
}

struct GpuBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    colors: wgpu::Buffer,
    staging_positions: wgpu::Buffer,
    staging_normals: wgpu::Buffer,
    capacity: usize,
}

impl GpuBuffers {
    fn create(device: &wgpu::Device, capacity: usize) -> Self {
        let size = capacity as u64;
        let buffer = |label: &str, stride: u64, usage: wgpu::BufferUsages| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size * stride,
                usage,
                mapped_at_creation: false,
            })
        };
        let vertex_usage = wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC;
        let staging_usage = wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC;

        Self {
            positions: buffer("Isosurface Position Buffer", POSITION_STRIDE, vertex_usage),
            normals: buffer("Isosurface Normal Buffer", NORMAL_STRIDE, vertex_usage),
            colors: buffer("Isosurface Color Buffer", COLOR_STRIDE, vertex_usage),
            staging_positions: buffer("Isosurface Position Staging", POSITION_STRIDE, staging_usage),
            staging_normals: buffer("Isosurface Normal Staging", NORMAL_STRIDE, staging_usage),
            capacity,
        }
    }
}

/// Unmaps its buffers when dropped
struct MappedGuard<'a> {
    buffers: &'a [&'a wgpu::Buffer],
}

impl Drop for MappedGuard<'_> {
    fn drop(&mut self) {
        for buffer in self.buffers {
            buffer.unmap();
        }
    }
}

/// Map the first `size` bytes of each buffer for writing and wait for it
///
/// On failure every buffer that did get mapped is unmapped again.
fn map_for_write(device: &wgpu::Device, regions: &[(&wgpu::Buffer, u64)]) -> Result<(), SinkError> {
    let (sender, receiver) = mpsc::channel();
    for (i, &(buffer, size)) in regions.iter().enumerate() {
        let sender = sender.clone();
        buffer.slice(..size).map_async(wgpu::MapMode::Write, move |result| {
            let _ = sender.send((i, result));
        });
    }
    device.poll(wgpu::Maintain::Wait);

    let mut mapped = Vec::with_capacity(regions.len());
    let mut failure = None;
    for (i, result) in receiver.try_iter() {
        match result {
            Ok(()) => mapped.push(i),
            Err(e) => failure = Some(e.to_string()),
        }
    }

    if mapped.len() != regions.len() {
        for i in mapped {
            regions[i].0.unmap();
        }
        return Err(SinkError::Map(
            failure.unwrap_or_else(|| "map request did not complete".to_string()),
        ));
    }
    Ok(())
}

/// Output sink writing into GPU vertex buffers
///
/// Positions and normals go through mapped staging buffers. Scalars are kept
/// on the host and turned into per-vertex colors with the sink's
/// [`ColorMap`] once generation has finished.
pub struct GpuSink {
    context: GpuContext,
    buffers: Option<GpuBuffers>,
    len: usize,
    scalars: Vec<f32>,
    color_map: ColorMap,
}

impl GpuSink {
    /// Create an empty sink; buffers are allocated on first use
    pub fn new(context: GpuContext, color_map: ColorMap) -> Self {
        Self {
            context,
            buffers: None,
            len: 0,
            scalars: Vec::new(),
            color_map,
        }
    }

    /// Number of vertices the current buffers can hold
    pub fn capacity(&self) -> usize {
        self.buffers.as_ref().map_or(0, |b| b.capacity)
    }

    /// Vertex count to draw
    pub fn vertex_count(&self) -> u32 {
        u32::try_from(self.len).unwrap_or(u32::MAX)
    }

    pub fn position_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffers.as_ref().map(|b| &b.positions)
    }

    pub fn normal_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffers.as_ref().map(|b| &b.normals)
    }

    pub fn color_buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffers.as_ref().map(|b| &b.colors)
    }

    /// Host copy of the interpolated scalars from the last write
    pub fn scalars(&self) -> &[f32] {
        &self.scalars[..self.len.min(self.scalars.len())]
    }

    pub fn color_map(&self) -> &ColorMap {
        &self.color_map
    }

    /// Change the color map and recolor the current output
    pub fn set_color_map(&mut self, color_map: ColorMap) {
        self.color_map = color_map;
        self.upload_colors();
    }

    fn upload_colors(&self) {
        let Some(buffers) = &self.buffers else {
            return;
        };
        if self.len == 0 {
            return;
        }
        let colors = self.color_map.colors(self.scalars());
        self.context.queue.write_buffer(&buffers.colors, 0, bytemuck::cast_slice(&colors));
    }
}

impl OutputSink for GpuSink {
    fn ensure_capacity(&mut self, vertex_count: usize) -> Result<(), SinkError> {
        let current = self.capacity();
        if vertex_count <= current {
            return Ok(());
        }

        let max = max_vertices(self.context.max_buffer_size());
        if vertex_count > max {
            return Err(SinkError::CapacityExceeded { requested: vertex_count, max });
        }
        let capacity = grown_capacity(current, vertex_count).min(max);

        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffers = GpuBuffers::create(device, capacity);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            log::warn!("Vertex buffer allocation of {} vertices failed: {}", capacity, err);
            return Err(SinkError::OutOfMemory {
                requested_bytes: capacity as u64 * BYTES_PER_VERTEX,
            });
        }

        log::debug!("Grew isosurface buffers from {} to {} vertices", current, capacity);
        self.buffers = Some(buffers);
        self.len = 0;
        Ok(())
    }

    fn write(&mut self, vertex_count: usize, fill: &mut FillFn<'_>) -> Result<(), ExtractError> {
        if vertex_count == 0 {
            self.clear();
            return fill(OutputWindow::new(&mut [], &mut [], &mut []));
        }

        let capacity = self.capacity();
        let buffers = match &self.buffers {
            Some(buffers) if vertex_count <= buffers.capacity => buffers,
            _ => {
                return Err(SinkError::CapacityExceeded { requested: vertex_count, max: capacity }.into());
            }
        };
        self.len = 0;

        let position_bytes = vertex_count as u64 * POSITION_STRIDE;
        let normal_bytes = vertex_count as u64 * NORMAL_STRIDE;
        map_for_write(
            &self.context.device,
            &[
                (&buffers.staging_positions, position_bytes),
                (&buffers.staging_normals, normal_bytes),
            ],
        )?;
        self.scalars.resize(vertex_count, 0.0);

        let result = {
            let staging = [&buffers.staging_positions, &buffers.staging_normals];
            let _release = MappedGuard { buffers: &staging };
            let mut position_view = buffers.staging_positions.slice(..position_bytes).get_mapped_range_mut();
            let mut normal_view = buffers.staging_normals.slice(..normal_bytes).get_mapped_range_mut();

            let positions = bytemuck::try_cast_slice_mut::<u8, Vec4>(&mut position_view[..])
                .map_err(|e| SinkError::Map(format!("position view: {}", e)))?;
            let normals = bytemuck::try_cast_slice_mut::<u8, Vec3>(&mut normal_view[..])
                .map_err(|e| SinkError::Map(format!("normal view: {}", e)))?;
            fill(OutputWindow::new(positions, normals, &mut self.scalars))
        };
        result?;

        let mut encoder = self.context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Isosurface Upload Encoder"),
        });
        encoder.copy_buffer_to_buffer(&buffers.staging_positions, 0, &buffers.positions, 0, position_bytes);
        encoder.copy_buffer_to_buffer(&buffers.staging_normals, 0, &buffers.normals, 0, normal_bytes);
        self.context.queue.submit(std::iter::once(encoder.finish()));

        self.len = vertex_count;
        self.upload_colors();
        Ok(())
    }

    fn clear(&mut self) {
        self.len = 0;
        self.scalars.clear();
    }

    fn len(&self) -> usize {
        self.len
    }
}

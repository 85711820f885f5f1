//! Headless wgpu device
//!
//! Extraction needs buffers but no window, so the context requests an adapter
//! without a surface.

use std::fmt;
use std::sync::Arc;

/// Error creating the GPU context
#[derive(Debug, Clone, PartialEq)]
pub enum GpuError {
    /// No adapter matched the request
    NoAdapter,
    /// The adapter refused to create a device
    DeviceCreation(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "no suitable GPU adapter found"),
            GpuError::DeviceCreation(msg) => write!(f, "failed to create GPU device: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {}

/// Device and queue shared by GPU sinks
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    adapter_name: String,
}

impl GpuContext {
    /// Request a headless device on any available backend
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::request())
    }

    async fn request() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using GPU adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Isotet Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceCreation(e.to_string()))?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name: info.name,
        })
    }

    /// Name of the adapter the device was created on
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Largest single buffer the device can allocate, in bytes
    pub fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_error_display() {
        assert_eq!(format!("{}", GpuError::NoAdapter), "no suitable GPU adapter found");
        let msg = format!("{}", GpuError::DeviceCreation("lost".to_string()));
        assert!(msg.contains("lost"));
    }
}

//! GPU context: wgpu device and queue.
//!
//! [`GpuContext`] wraps the wgpu primitives the deformer needs. There is no
//! surface here: a host that renders creates its own device and hands it in
//! through [`GpuContext::from_parts`], so compute and rendering share one
//! queue and one submission order.

use crate::error::{DeformError, DeformResult};

/// Wraps the wgpu device and queue used for compute and buffer uploads.
#[derive(Clone)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Initialize wgpu without a window: create instance, adapter, device
    /// and queue.
    pub fn headless() -> DeformResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| DeformError::NoAdapter(e.to_string()))?;

        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("deformesh device".into()),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        ))
        .map_err(|e| DeformError::DeviceRequest(e.to_string()))?;

        Ok(Self { device, queue })
    }

    /// Wrap a device and queue owned by the host renderer.
    pub fn from_parts(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    /// Device compute limits relevant to dispatch sizing.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}

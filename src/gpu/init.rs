use anyhow::Context;
use wgpu::{Device, DeviceDescriptor, Features, PowerPreference, Queue, RequestAdapterOptions};

/// Device and queue shared by every GPU object a renderer creates.
#[derive(Debug, Clone)]
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Blocking headless initialisation.
    pub fn headless() -> anyhow::Result<Self> {
        pollster::block_on(init_wgpu())
    }
}

pub async fn init_wgpu() -> anyhow::Result<GpuContext> {
    let instance = wgpu::Instance::default();
    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("No adapter found")?;

    let info = adapter.get_info();
    log::info!("using adapter {} ({:?})", info.name, info.backend);

    let limits = adapter.limits();
    let (device, queue) = adapter
        .request_device(&DeviceDescriptor {
            label: Some("sorted splats device"),
            required_features: Features::empty(),
            required_limits: limits,
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        })
        .await
        .context("Failed to create device")?;
    Ok(GpuContext { device, queue })
}

//! Device acquisition for the live renderer.
//!
//! Visualizers draw offscreen and hand pixels to the host surface, so no
//! window surface is involved. A hardware adapter is preferred; hosts without
//! one (CI, containers) get the software fallback adapter instead.

use wgpu::{Adapter, Device, Instance, Queue};

/// Failures while acquiring or driving the device.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("Failed to map readback buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
    #[error("Failed to poll device: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("Readback callback dropped before completion")]
    ReadbackDropped,
}

/// Device and queue one visualizer renders frames with.
pub struct GpuContext {
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Acquire a device for offscreen frame rendering.
    pub async fn new() -> Result<Self, GpuError> {
        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::METAL | wgpu::Backends::VULKAN | wgpu::Backends::GL,
            ..Default::default()
        });

        let adapter = match request_adapter(&instance, false).await {
            Some(adapter) => adapter,
            None => {
                log::warn!("No hardware adapter, trying the software fallback");
                request_adapter(&instance, true)
                    .await
                    .ok_or(GpuError::NoAdapter)?
            }
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("phobz-live-frames"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "Rendering visualizer frames on {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// [`GpuContext::new`] driven to completion on the calling thread.
    ///
    /// Visualizer construction is synchronous, so this is what the factory
    /// uses.
    pub fn new_blocking() -> Result<Self, GpuError> {
        pollster::block_on(Self::new())
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// Whether frames are rendered by a CPU (software) adapter.
    pub fn is_software(&self) -> bool {
        self.adapter_info().device_type == wgpu::DeviceType::Cpu
    }
}

async fn request_adapter(instance: &Instance, software: bool) -> Option<Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: software,
            compatible_surface: None,
        })
        .await
        .ok()
}

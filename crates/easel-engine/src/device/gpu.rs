use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::probe::{GpuOptions, PowerPreference};

/// Initialization parameters for the GPU layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Adapter selection hint.
    pub power_preference: PowerPreference,

    /// Refuse CPU (software) adapters.
    pub fail_if_major_performance_caveat: bool,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: PowerPreference::Default,
            fail_if_major_performance_caveat: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
        }
    }
}

impl From<GpuOptions> for GpuInit {
    fn from(opts: GpuOptions) -> Self {
        Self {
            power_preference: opts.power_preference,
            fail_if_major_performance_caveat: opts.fail_if_major_performance_caveat,
            ..Self::default()
        }
    }
}

/// Owns wgpu core objects for off-screen rendering.
///
/// No window surface is involved: renderers draw into textures they own and
/// read the result back.
pub struct Gpu {
    /// Kept alive for the lifetime of the device.
    _instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    /// Set from the device-lost callback.
    lost: Arc<AtomicBool>,
}

pub(super) fn new_instance() -> wgpu::Instance {
    // Use all backends to allow wgpu to select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

pub(super) async fn request_adapter(
    instance: &wgpu::Instance,
    init: &GpuInit,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference.to_wgpu(),
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let info = adapter.get_info();
    if init.fail_if_major_performance_caveat && info.device_type == wgpu::DeviceType::Cpu {
        anyhow::bail!("adapter {:?} is a software rasterizer", info.name);
    }
    Ok(adapter)
}

impl Gpu {
    /// Creates a device without any presentation surface.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new_headless(init: GpuInit) -> Result<Self> {
        let instance = new_instance();
        let adapter = request_adapter(&instance, &init, None).await?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("easel-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::debug!("gpu adapter: {:?}", adapter.get_info());

        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            log::warn!("gpu device lost ({reason:?}): {message}");
            flag.store(true, Ordering::Release);
        });

        Ok(Gpu { _instance: instance, adapter, device, queue, lost })
    }

    /// Whether an adapter satisfying `opts` exists. Never fails; errors mean "no".
    pub fn is_supported(opts: &GpuOptions) -> bool {
        let init = GpuInit::from(*opts);
        let instance = new_instance();
        match pollster::block_on(request_adapter(&instance, &init, None)) {
            Ok(_) => true,
            Err(e) => {
                log::debug!("gpu unavailable: {e:#}");
                false
            }
        }
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    /// True once the device has been lost; it never recovers.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

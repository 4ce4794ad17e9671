//! Device capabilities and GPU device management.
//!
//! This module is responsible for:
//! - describing the environment the video surface manager runs in (`DeviceProbe`)
//! - creating the wgpu Instance/Adapter/Device/Queue for off-screen rendering
//! - presenting the screen canvas to a window surface (`Presenter`)

mod gpu;
mod probe;
mod surface;

pub use gpu::{Gpu, GpuInit};
pub use surface::{Presenter, SurfaceErrorAction};
pub use probe::{DeviceProbe, GpuOptions, ManualProbe, Orientation, PowerPreference};

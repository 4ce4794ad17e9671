use std::cell::RefCell;
use std::rc::Rc;

use crate::coords::Viewport;

/// GPU adapter power preference.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum PowerPreference {
    /// Let the platform decide.
    #[default]
    Default,
    HighPerformance,
    LowPower,
}

impl PowerPreference {
    pub fn to_wgpu(self) -> wgpu::PowerPreference {
        match self {
            PowerPreference::Default => wgpu::PowerPreference::None,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        }
    }
}

/// Requirements a GPU backend must satisfy to be considered available.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct GpuOptions {
    pub power_preference: PowerPreference,
    /// Reject software/CPU adapters.
    pub fail_if_major_performance_caveat: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Environment capabilities sampled by the video surface manager.
///
/// Values may change between calls and are never cached longer than one
/// resize cycle. Implementations must not panic on unsupported platforms;
/// they return conservative defaults instead.
pub trait DeviceProbe {
    fn is_gpu_supported(&self, opts: &GpuOptions) -> bool;

    fn device_pixel_ratio(&self) -> f32;

    /// Content box of the container the canvas lives in, in logical pixels.
    fn parent_bounds(&self) -> Viewport;

    fn screen_orientation(&self) -> Orientation {
        let b = self.parent_bounds();
        if b.width >= b.height { Orientation::Landscape } else { Orientation::Portrait }
    }
}

#[derive(Debug, Clone)]
struct ManualState {
    gpu_supported: bool,
    pixel_ratio: f32,
    parent: Viewport,
    orientation: Option<Orientation>,
}

/// Hand-driven probe for headless use and tests.
///
/// Clones share state, so a test can keep one handle and mutate the
/// environment seen by the `Video` that owns the other.
#[derive(Debug, Clone)]
pub struct ManualProbe {
    state: Rc<RefCell<ManualState>>,
}

impl ManualProbe {
    /// No GPU, pixel ratio 1.
    pub fn new(parent_width: f32, parent_height: f32) -> Self {
        Self {
            state: Rc::new(RefCell::new(ManualState {
                gpu_supported: false,
                pixel_ratio: 1.0,
                parent: Viewport::new(parent_width, parent_height),
                orientation: None,
            })),
        }
    }

    pub fn set_gpu_supported(&self, supported: bool) {
        self.state.borrow_mut().gpu_supported = supported;
    }

    pub fn set_pixel_ratio(&self, ratio: f32) {
        self.state.borrow_mut().pixel_ratio = ratio;
    }

    pub fn set_parent_bounds(&self, width: f32, height: f32) {
        self.state.borrow_mut().parent = Viewport::new(width, height);
    }

    /// Overrides the orientation derived from the parent bounds.
    pub fn set_orientation(&self, orientation: Option<Orientation>) {
        self.state.borrow_mut().orientation = orientation;
    }
}

impl DeviceProbe for ManualProbe {
    fn is_gpu_supported(&self, _opts: &GpuOptions) -> bool {
        self.state.borrow().gpu_supported
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.state.borrow().pixel_ratio
    }

    fn parent_bounds(&self) -> Viewport {
        self.state.borrow().parent
    }

    fn screen_orientation(&self) -> Orientation {
        let s = self.state.borrow();
        s.orientation.unwrap_or(if s.parent.width >= s.parent.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let probe = ManualProbe::new(800.0, 600.0);
        let handle = probe.clone();
        handle.set_pixel_ratio(2.0);
        handle.set_parent_bounds(300.0, 900.0);
        assert_eq!(probe.device_pixel_ratio(), 2.0);
        assert_eq!(probe.screen_orientation(), Orientation::Portrait);
        handle.set_orientation(Some(Orientation::Landscape));
        assert_eq!(probe.screen_orientation(), Orientation::Landscape);
    }
}

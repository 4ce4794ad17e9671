//! Video surface manager.
//!
//! Selects and owns the renderer, fixes the design resolution, and keeps the
//! display size in step with the container through one of seven scale
//! policies:
//! - `fit`, `fill-min`, `fill-max`: uniform scale, aspect ratio preserved
//! - `flex`, `flex-width`, `flex-height`: the back buffer follows the container
//! - `stretch`: independent X/Y scale

mod events;
mod manager;
mod options;
mod policy;

pub use events::{EventQueue, Signal, VideoEvent, EVENT_QUEUE_CAPACITY};
pub use manager::{Video, SIGNAL_THROTTLE};
pub use options::{RendererPreference, Scale, ScaleMethod, VideoOptions, VideoSettings, RENDERER_ENV};
pub use policy::{compute_scale, parse_css_length, ScaleOutcome};

//! Time subsystem.
//!
//! Provides testable timing utilities without coupling to the runtime:
//! - `Clock` sources (wall clock, hand-driven clock for tests)
//! - `Throttle` for rate-limiting bursty platform signals
//! - `FrameClock` producing per-frame `FrameTime`

mod clock;
mod frame_clock;
mod throttle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use frame_clock::{FrameClock, FrameTime};
pub use throttle::Throttle;

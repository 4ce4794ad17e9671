use std::rc::Rc;
use std::time::Duration;

use super::{Clock, SystemClock};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Clock reading taken at the tick.
    pub now: Duration,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the application is paused
/// by the debugger, minimized, or stalls.
pub struct FrameClock {
    clock: Rc<dyn Clock>,
    last: Duration,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a wall-clock frame clock with default clamps.
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock::new()))
    }

    /// Creates a frame clock reading `clock`, with default clamps
    /// (100µs minimum against tight loops, 250ms maximum after stalls).
    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self::with_clamps(clock, Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(clock: Rc<dyn Clock>, dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let last = clock.now();
        Self { clock, last, frame_index: 0, dt_min, dt_max }
    }

    /// Resets the clock baseline, e.g. when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = self.clock.now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = self.clock.now();
        let dt = now.saturating_sub(self.last).clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime { dt: dt.as_secs_f32(), now, frame_index: self.frame_index };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

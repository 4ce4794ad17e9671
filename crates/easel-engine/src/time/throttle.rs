use std::rc::Rc;
use std::time::Duration;

use super::Clock;

/// Rate limiter for bursty signals.
///
/// The first signal after a quiet period fires immediately. Signals arriving
/// within `interval` of the last firing are collapsed into a single trailing
/// firing, delivered by [`poll`](Self::poll) once the interval has elapsed.
/// No burst is dropped entirely.
pub struct Throttle {
    interval: Duration,
    clock: Rc<dyn Clock>,
    last_fired: Option<Duration>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration, clock: Rc<dyn Clock>) -> Self {
        Self { interval, clock, last_fired: None, pending: false }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn ready(&self, now: Duration) -> bool {
        self.last_fired.is_none_or(|t| now.saturating_sub(t) >= self.interval)
    }

    /// Records a signal. Returns `true` when the caller should act now.
    pub fn hit(&mut self) -> bool {
        let now = self.clock.now();
        if self.ready(now) {
            self.last_fired = Some(now);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Returns `true` once per collapsed burst, when its trailing firing is due.
    pub fn poll(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        let now = self.clock.now();
        if self.ready(now) {
            self.last_fired = Some(now);
            self.pending = false;
            true
        } else {
            false
        }
    }
}

use std::collections::VecDeque;

use crate::device::Orientation;
use crate::render::RendererKind;

/// Platform notification fed into [`Video::notify`](super::Video::notify).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Signal {
    /// Throttled.
    WindowResize,
    OrientationChange,
    /// Throttled.
    Scroll,
    /// The container's layout changed without a window resize.
    ParentMutated,
    PixelRatioChange,
}

/// Notification produced by the video surface manager.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VideoEvent {
    Initialized { backend: RendererKind },
    CanvasResized { width: u32, height: u32 },
    ScaleChanged { scale_x: f32, scale_y: f32 },
    OrientationChanged(Orientation),
    Scrolled,
    /// The previous frame is geometrically stale and must be redrawn.
    RepaintRequested,
    Reset,
    /// The renderer lost its drawing context and stopped drawing.
    ContextLost,
}

/// Events kept while nobody drains the queue; older ones are dropped first.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Bounded FIFO of [`VideoEvent`]s, drained by the owner once per frame.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<VideoEvent>,
    dropped: usize,
}

impl EventQueue {
    pub fn push(&mut self, event: VideoEvent) {
        log::trace!("video event {event:?}");
        if self.events.len() == EVENT_QUEUE_CAPACITY {
            self.events.pop_front();
            if self.dropped == 0 {
                log::warn!("video events are not being drained, dropping the oldest");
            }
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    /// Events discarded for lack of room since the last drain.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn drain(&mut self) -> Vec<VideoEvent> {
        self.dropped = 0;
        self.events.drain(..).collect()
    }
}

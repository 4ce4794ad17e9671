//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop)
//! and applications: the [`App`] callbacks and the per-frame context giving
//! access to the video surface manager.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};

//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires window events into a
//! [`Video`](crate::video::Video).

mod probe;
mod runtime;

pub use probe::{signal_for, WindowProbe};
pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};

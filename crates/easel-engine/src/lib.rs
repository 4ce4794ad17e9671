//! Easel engine crate.
//!
//! Display layer of a 2D engine: value types, drawing surfaces, the
//! canvas and GPU renderer backends, and the video surface manager that maps
//! a fixed design resolution onto a resizable, high-DPI container.

pub mod coords;
pub mod paint;
pub mod scene;
pub mod surface;

pub mod device;
pub mod render;
pub mod time;
pub mod video;

pub mod core;
pub mod logging;
pub mod window;

//! Coordinate and geometry types shared across the video layer and renderers.
//!
//! Canonical CPU space:
//! - origin top-left
//! - +X right, +Y down
//!
//! Design (logical) pixels are mapped to back-buffer pixels by the video layer;
//! renderers only ever see back-buffer coordinates.

mod matrix;
mod rect;
mod vector2d;
mod viewport;

pub use matrix::Matrix2d;
pub use rect::Rect;
pub use vector2d::{Vector2d, VectorError};
pub use viewport::Viewport;

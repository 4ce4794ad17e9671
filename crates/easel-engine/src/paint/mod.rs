//! Paint model shared between renderers.
//!
//! Scope:
//! - color representation (straight alpha, CSS parsing and export)
//! - blend modes
//!
//! Geometry types remain in `coords`.

pub mod blend;
pub mod color;
mod css;

pub use blend::BlendMode;
pub use color::{Color, ColorError};

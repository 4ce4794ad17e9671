//! Shape types handed to renderers by the scene graph.
//!
//! Responsibilities:
//! - describe drawable geometry as a closed set of shape kinds
//! - turn shapes into triangles/outlines for backends that rasterize on their own

mod shape;
pub mod tessellate;

pub use shape::{Ellipse, Polygon, Shape};

use std::fmt;

/// Hard failures when allocating a surface or acquiring a context on it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceError {
    /// Width or height was zero.
    InvalidSurfaceSize { width: u32, height: u32 },
    /// The canvas cannot provide the requested context kind.
    UnsupportedSurface,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::InvalidSurfaceSize { width, height } => {
                write!(f, "invalid surface size {width}x{height}: dimensions must be non-zero")
            }
            SurfaceError::UnsupportedSurface => {
                write!(f, "canvas does not support a 2d context")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

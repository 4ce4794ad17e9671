use std::fmt;
use std::str::FromStr;

use tiny_skia::BlendMode as SkiaBlendMode;

/// Composite operation of a 2D context (`globalCompositeOperation`).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum CompositeOp {
    #[default]
    SourceOver,
    Multiply,
    Lighter,
    Screen,
    DestinationAtop,
    DestinationIn,
    Copy,
}

impl CompositeOp {
    pub const ALL: [CompositeOp; 7] = [
        CompositeOp::SourceOver,
        CompositeOp::Multiply,
        CompositeOp::Lighter,
        CompositeOp::Screen,
        CompositeOp::DestinationAtop,
        CompositeOp::DestinationIn,
        CompositeOp::Copy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::Multiply => "multiply",
            CompositeOp::Lighter => "lighter",
            CompositeOp::Screen => "screen",
            CompositeOp::DestinationAtop => "destination-atop",
            CompositeOp::DestinationIn => "destination-in",
            CompositeOp::Copy => "copy",
        }
    }

    /// Operations that also affect destination pixels outside the source shape.
    #[inline]
    pub fn is_unbounded(self) -> bool {
        matches!(
            self,
            CompositeOp::DestinationAtop | CompositeOp::DestinationIn | CompositeOp::Copy
        )
    }

    pub(crate) fn to_skia(self) -> SkiaBlendMode {
        match self {
            CompositeOp::SourceOver => SkiaBlendMode::SourceOver,
            CompositeOp::Multiply => SkiaBlendMode::Multiply,
            CompositeOp::Lighter => SkiaBlendMode::Plus,
            CompositeOp::Screen => SkiaBlendMode::Screen,
            CompositeOp::DestinationAtop => SkiaBlendMode::DestinationAtop,
            CompositeOp::DestinationIn => SkiaBlendMode::DestinationIn,
            CompositeOp::Copy => SkiaBlendMode::Source,
        }
    }
}

impl FromStr for CompositeOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CompositeOp::ALL.into_iter().find(|op| op.as_str() == s).ok_or(())
    }
}

impl fmt::Display for CompositeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use std::fmt;
use std::str::FromStr;

/// Blend mode applied to subsequent draw calls.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Lighter,
    Additive,
    Screen,
}

impl BlendMode {
    pub const ALL: [BlendMode; 5] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Lighter,
        BlendMode::Additive,
        BlendMode::Screen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Lighter => "lighter",
            BlendMode::Additive => "additive",
            BlendMode::Screen => "screen",
        }
    }

    /// Parses a mode name; unknown names resolve to [`BlendMode::Normal`].
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl FromStr for BlendMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendMode::ALL.into_iter().find(|m| m.as_str() == s).ok_or(())
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

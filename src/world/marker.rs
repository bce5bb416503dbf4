use serde::{Deserialize, Serialize};

use super::position::Position;

/// Marker colours. A pair of them classifies what a marker stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Purple,
    Blue,
    Cyan,
    Green,
    Yellow,
    Orange,
    Brown,
    Grey,
    White,
}

/// Two-value classification tag carried by every marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariantTag {
    pub primary: Color,
    pub secondary: Color,
}

impl VariantTag {
    pub const fn new(primary: Color, secondary: Color) -> Self {
        Self { primary, secondary }
    }
}

/// A named, positioned marker placed in the world. Directives wrap markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub pos: Position,
    pub tag: VariantTag,
}

impl Marker {
    pub fn new(name: impl Into<String>, pos: Position, tag: VariantTag) -> Self {
        Self {
            name: name.into(),
            pos,
            tag,
        }
    }
}

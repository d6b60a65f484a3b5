//! Grip hand preference.

use crate::spatial::Hand;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which hand's grip (and controller ray) is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GripSelection {
    /// The off-hand: opposite the host's dominant hand.
    #[default]
    Auto,
    Left,
    Right,
}

impl GripSelection {
    /// Lenient parse: case-insensitive, surrounding whitespace ignored, anything unknown is `Auto`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => GripSelection::Left,
            "right" => GripSelection::Right,
            _ => GripSelection::Auto,
        }
    }

    /// `Left` → true, `Right` → false, `Auto` → the hand opposite the dominant one.
    pub fn should_use_left_hand(self, dominant_hand_is_left: bool) -> bool {
        match self {
            GripSelection::Left => true,
            GripSelection::Right => false,
            GripSelection::Auto => !dominant_hand_is_left,
        }
    }

    pub fn hand(self, dominant_hand_is_left: bool) -> Hand {
        Hand::from_left(self.should_use_left_hand(dominant_hand_is_left))
    }
}

impl fmt::Display for GripSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GripSelection::Auto => "Auto",
            GripSelection::Left => "Left",
            GripSelection::Right => "Right",
        };
        f.write_str(name)
    }
}

impl<'de> Deserialize<'de> for GripSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(GripSelection::parse(&raw))
    }
}

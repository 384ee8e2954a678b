//! Pad Colors
//!
//! The four pads of the board. Every per-color lookup is an exhaustive
//! `match`, so adding a pad is a compile error until every table is updated.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};

/// Number of pads on the board.
pub const COLOR_COUNT: usize = 4;

/// Frequency of the error cue (Hz).
pub const ERROR_TONE_HZ: f32 = 100.0;

/// A pad color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    /// Red pad (E4)
    Red = 0,
    /// Blue pad (G4)
    Blue = 1,
    /// Green pad (C5)
    Green = 2,
    /// Yellow pad (E5)
    Yellow = 3,
}

impl Color {
    /// All colors in index order.
    pub const ALL: [Color; COLOR_COUNT] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// Get color from index (0-3).
    pub fn from_index(index: u8) -> Option<Color> {
        match index {
            0 => Some(Color::Red),
            1 => Some(Color::Blue),
            2 => Some(Color::Green),
            3 => Some(Color::Yellow),
            _ => None,
        }
    }

    /// Index of this color (0-3).
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Lowercase name, as used by the UI layer.
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
        }
    }

    /// Tone played while this pad flashes (Hz).
    pub fn tone_hz(self) -> f32 {
        match self {
            Color::Red => 329.63,
            Color::Blue => 392.00,
            Color::Green => 523.25,
            Color::Yellow => 659.25,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a pad.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color: {0}")]
pub struct ParseColorError(pub String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "blue" => Ok(Color::Blue),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for color in Color::ALL {
            assert_eq!(Color::from_index(color.index()), Some(color));
        }
        assert_eq!(Color::from_index(4), None);
    }

    #[test]
    fn test_tones_ascend() {
        let tones: Vec<f32> = Color::ALL.iter().map(|c| c.tone_hz()).collect();
        assert!(tones.windows(2).all(|w| w[0] < w[1]));
        assert!(ERROR_TONE_HZ < tones[0]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Green".parse::<Color>(), Ok(Color::Green));
        assert_eq!(" yellow ".parse::<Color>(), Ok(Color::Yellow));
        assert!("purple".parse::<Color>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Color::Blue).unwrap();
        assert_eq!(json, "\"blue\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::Blue);
    }
}

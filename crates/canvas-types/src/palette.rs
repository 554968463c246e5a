//! The fixed colour palette.
//!
//! Every cell carries exactly one of these twenty colours. On the wire a
//! colour is its upper-case `#RRGGBB` hex string; parsing accepts any
//! case.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A colour from the canvas palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Color {
    /// `#FF0000`
    #[serde(rename = "#FF0000")]
    Red,
    /// `#FF4500`
    #[serde(rename = "#FF4500")]
    OrangeRed,
    /// `#FF8C00`
    #[serde(rename = "#FF8C00")]
    DarkOrange,
    /// `#FFD700`
    #[serde(rename = "#FFD700")]
    Gold,
    /// `#FFFF00`
    #[serde(rename = "#FFFF00")]
    Yellow,
    /// `#7CFC00`
    #[serde(rename = "#7CFC00")]
    LawnGreen,
    /// `#00FF00`
    #[serde(rename = "#00FF00")]
    Lime,
    /// `#00FA9A`
    #[serde(rename = "#00FA9A")]
    SpringGreen,
    /// `#00FFFF`
    #[serde(rename = "#00FFFF")]
    Cyan,
    /// `#00BFFF`
    #[serde(rename = "#00BFFF")]
    DeepSkyBlue,
    /// `#0000FF`
    #[serde(rename = "#0000FF")]
    Blue,
    /// `#8A2BE2`
    #[serde(rename = "#8A2BE2")]
    BlueViolet,
    /// `#FF00FF`
    #[serde(rename = "#FF00FF")]
    Magenta,
    /// `#FF1493`
    #[serde(rename = "#FF1493")]
    DeepPink,
    /// `#FFFFFF`
    #[serde(rename = "#FFFFFF")]
    White,
    /// `#808080`
    #[serde(rename = "#808080")]
    Gray,
    /// `#000000`
    #[serde(rename = "#000000")]
    Black,
    /// `#8B4513`
    #[serde(rename = "#8B4513")]
    SaddleBrown,
    /// `#FF69B4`
    #[serde(rename = "#FF69B4")]
    HotPink,
    /// `#00FF88`
    #[serde(rename = "#00FF88")]
    Mint,
}

/// All palette colours in display order.
pub const PALETTE: [Color; 20] = [
    Color::Red,
    Color::OrangeRed,
    Color::DarkOrange,
    Color::Gold,
    Color::Yellow,
    Color::LawnGreen,
    Color::Lime,
    Color::SpringGreen,
    Color::Cyan,
    Color::DeepSkyBlue,
    Color::Blue,
    Color::BlueViolet,
    Color::Magenta,
    Color::DeepPink,
    Color::White,
    Color::Gray,
    Color::Black,
    Color::SaddleBrown,
    Color::HotPink,
    Color::Mint,
];

impl Color {
    /// The canonical upper-case hex form, e.g. `#FF0000`.
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Red => "#FF0000",
            Self::OrangeRed => "#FF4500",
            Self::DarkOrange => "#FF8C00",
            Self::Gold => "#FFD700",
            Self::Yellow => "#FFFF00",
            Self::LawnGreen => "#7CFC00",
            Self::Lime => "#00FF00",
            Self::SpringGreen => "#00FA9A",
            Self::Cyan => "#00FFFF",
            Self::DeepSkyBlue => "#00BFFF",
            Self::Blue => "#0000FF",
            Self::BlueViolet => "#8A2BE2",
            Self::Magenta => "#FF00FF",
            Self::DeepPink => "#FF1493",
            Self::White => "#FFFFFF",
            Self::Gray => "#808080",
            Self::Black => "#000000",
            Self::SaddleBrown => "#8B4513",
            Self::HotPink => "#FF69B4",
            Self::Mint => "#00FF88",
        }
    }
}

impl core::fmt::Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.hex())
    }
}

/// A string did not name a palette colour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("colour {0:?} is not in the palette")]
pub struct ColorParseError(pub String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PALETTE
            .iter()
            .copied()
            .find(|c| c.hex().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ColorParseError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn palette_has_twenty_distinct_colours() {
        let hexes: BTreeSet<&str> = PALETTE.iter().map(|c| c.hex()).collect();
        assert_eq!(hexes.len(), 20);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("#ff0000".parse::<Color>().unwrap(), Color::Red);
        assert_eq!("#8a2be2".parse::<Color>().unwrap(), Color::BlueViolet);
        assert_eq!(" #00FF88 ".parse::<Color>().unwrap(), Color::Mint);
    }

    #[test]
    fn off_palette_colour_is_rejected() {
        assert!("#123456".parse::<Color>().is_err());
        assert!("red".parse::<Color>().is_err());
        assert!("".parse::<Color>().is_err());
    }

    #[test]
    fn serde_uses_hex_form() {
        for colour in PALETTE {
            let json = serde_json::to_string(&colour).unwrap();
            assert_eq!(json, format!("\"{}\"", colour.hex()));
            let back: Color = serde_json::from_str(&json).unwrap();
            assert_eq!(back, colour);
        }
    }
}

// src/color.rs

//! Color handling for display sinks.
//!
//! Cells carry a bare palette index. A [`Palette`] turns that index into a
//! [`Color`] the sink can emit, falling back to the default foreground for
//! index 0 and for indices the palette does not cover. The palette size is the
//! smaller of the configured size and what the stream's [`ColorMode`] asks for.

use log::trace;
use serde::{Deserialize, Serialize};

/// Standard ANSI named colors (indices 0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NamedColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl NamedColor {
    /// Converts an index (0-15) to a `NamedColor`. Returns `None` above 15.
    pub fn from_index(idx: u8) -> Option<Self> {
        use NamedColor::*;
        const TABLE: [NamedColor; 16] = [
            Black,
            Red,
            Green,
            Yellow,
            Blue,
            Magenta,
            Cyan,
            White,
            BrightBlack,
            BrightRed,
            BrightGreen,
            BrightYellow,
            BrightBlue,
            BrightMagenta,
            BrightCyan,
            BrightWhite,
        ];
        TABLE.get(idx as usize).copied()
    }
}

/// A color a sink knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    /// The device's own default foreground.
    #[default]
    Default,
    /// One of the 16 ANSI colors.
    Named(NamedColor),
    /// An entry of the 256-color palette.
    Indexed(u8),
    /// A 24-bit color.
    Rgb(u8, u8, u8),
}

// Palette sizes implied by the Screen-Setup color mode byte.
const BASIC_PALETTE_SIZE: u16 = 16;
const EXTENDED_PALETTE_SIZE: u16 = 256;

/// The color mode byte of a Screen-Setup command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    /// Mode byte 1: the 16 ANSI colors.
    Basic,
    /// Mode byte 2: the 256-color palette.
    Extended,
    /// Any other byte; the sink's configured palette applies unchanged.
    #[default]
    Unspecified,
}

impl ColorMode {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => ColorMode::Basic,
            2 => ColorMode::Extended,
            _ => ColorMode::Unspecified,
        }
    }

    /// The largest palette this mode asks for, if it constrains it at all.
    pub fn palette_limit(&self) -> Option<u16> {
        match self {
            ColorMode::Basic => Some(BASIC_PALETTE_SIZE),
            ColorMode::Extended => Some(EXTENDED_PALETTE_SIZE),
            ColorMode::Unspecified => None,
        }
    }
}

/// Lookup table from cell color index to an emittable [`Color`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    size: u16,
    default_fg: Color,
}

impl Palette {
    /// Builds a palette with at most `configured_size` entries (capped at
    /// 256), further limited by `mode`.
    pub fn new(configured_size: u16, mode: ColorMode, default_fg: Color) -> Self {
        let mut size = configured_size.min(EXTENDED_PALETTE_SIZE);
        if let Some(limit) = mode.palette_limit() {
            size = size.min(limit);
        }
        Palette { size, default_fg }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    /// Resolves a color index. Index 0 is the default foreground; indices at
    /// or beyond the palette size are unsupported (`None`).
    pub fn lookup(&self, index: u8) -> Option<Color> {
        if index == 0 {
            return Some(self.default_fg);
        }
        if u16::from(index) >= self.size {
            trace!("Palette: index {} outside palette of {}", index, self.size);
            return None;
        }
        Some(match NamedColor::from_index(index) {
            Some(named) => Color::Named(named),
            None => Color::Indexed(index),
        })
    }

    /// Like [`Palette::lookup`], substituting the default foreground for
    /// unsupported indices. The flag reports whether a fallback happened.
    pub fn resolve(&self, index: u8) -> (Color, bool) {
        match self.lookup(index) {
            Some(color) => (color, false),
            None => (self.default_fg, true),
        }
    }
}

// src/glyph.rs

//! Defines the `Cell` type stored in every position of the frame buffer.
//!
//! A cell is a single-byte glyph plus a color index. Interpretation of the
//! color index (palette lookup, fallbacks) is left to the display sink; the
//! glyph byte is stored exactly as it arrived on the wire.

use std::fmt;

/// Glyph byte used for blank cells (ASCII space).
pub const BLANK_GLYPH: u8 = b' ';

/// Color index meaning "the sink's default foreground".
pub const DEFAULT_COLOR_INDEX: u8 = 0;

/// First and last printable ASCII bytes. Anything outside this range is
/// shown as a placeholder by sinks that write to a real device.
const PRINTABLE_ASCII: std::ops::RangeInclusive<u8> = 0x20..=0x7E;

/// A single character cell of the frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Single-byte character code.
    pub glyph: u8,
    /// Palette index (0-255). Index 0 is the default foreground.
    pub color: u8,
}

/// Blank cell: a space in the default color. Used for allocation and clear.
pub const BLANK_CELL: Cell = Cell {
    glyph: BLANK_GLYPH,
    color: DEFAULT_COLOR_INDEX,
};

impl Default for Cell {
    fn default() -> Self {
        BLANK_CELL
    }
}

impl Cell {
    pub const fn new(glyph: u8, color: u8) -> Self {
        Cell { glyph, color }
    }

    /// Returns true if the glyph byte can be written to a terminal verbatim.
    #[inline]
    pub fn is_printable(&self) -> bool {
        PRINTABLE_ASCII.contains(&self.glyph)
    }

    /// The character a display device should show for this cell.
    /// Control bytes and bytes above 0x7E become `placeholder`.
    pub fn display_char(&self, placeholder: char) -> char {
        if self.is_printable() {
            self.glyph as char
        } else {
            placeholder
        }
    }
}

// Prints only the glyph, with `?` standing in for unprintable bytes.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_char('?'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell_is_default() {
        assert_eq!(Cell::default(), BLANK_CELL);
        assert_eq!(BLANK_CELL.glyph, b' ');
        assert_eq!(BLANK_CELL.color, 0);
    }

    #[test]
    fn printable_glyphs_display_verbatim() {
        assert_eq!(Cell::new(b'A', 3).display_char('?'), 'A');
        assert_eq!(Cell::new(b'~', 3).display_char('?'), '~');
        assert_eq!(Cell::new(b' ', 0).to_string(), " ");
    }

    #[test]
    fn control_and_high_bytes_use_placeholder() {
        assert_eq!(Cell::new(0x07, 1).display_char('.'), '.');
        assert_eq!(Cell::new(0x1B, 1).display_char('.'), '.');
        assert_eq!(Cell::new(0x7F, 1).display_char('.'), '.');
        assert_eq!(Cell::new(0xC8, 1).to_string(), "?");
    }
}

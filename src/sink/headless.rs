// src/sink/headless.rs

//! In-memory sink with no device behind it.
//!
//! Keeps a character grid the size of the last `begin` and renders it as
//! plain text. Used for non-interactive output and in tests.

use super::{DisplaySink, PaintOutcome};
use crate::color::ColorMode;
use crate::glyph::Cell;
use anyhow::Result;
use log::{info, trace};

pub struct HeadlessSink {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    mode: ColorMode,
    placeholder: char,
    presents: usize,
}

impl HeadlessSink {
    pub fn new(placeholder: char) -> Self {
        info!("HeadlessSink: created");
        HeadlessSink {
            width: 0,
            height: 0,
            cells: Vec::new(),
            mode: ColorMode::default(),
            placeholder,
            presents: 0,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.mode
    }

    pub fn presents(&self) -> usize {
        self.presents
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    /// The surface as one string per row.
    pub fn lines(&self) -> Vec<String> {
        if self.width == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|c| c.display_char(self.placeholder)).collect())
            .collect()
    }

    /// The surface as text: rows joined by newlines, trailing blanks removed
    /// from each row.
    pub fn to_text(&self) -> String {
        self.lines()
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for HeadlessSink {
    fn default() -> Self {
        HeadlessSink::new('?')
    }
}

impl DisplaySink for HeadlessSink {
    fn begin(&mut self, width: usize, height: usize, mode: ColorMode) -> Result<()> {
        trace!("HeadlessSink: begin {}x{} {:?}", width, height, mode);
        self.width = width;
        self.height = height;
        self.mode = mode;
        self.cells = vec![Cell::default(); width * height];
        Ok(())
    }

    fn paint(&mut self, x: usize, y: usize, cell: Cell) -> PaintOutcome {
        if x >= self.width || y >= self.height {
            return PaintOutcome::UnsupportedPosition;
        }
        self.cells[y * self.width + x] = cell;
        PaintOutcome::Painted
    }

    fn present(&mut self) -> Result<()> {
        self.presents += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paints_inside_surface_only() {
        let mut sink = HeadlessSink::default();
        sink.begin(3, 2, ColorMode::Basic).expect("begin");
        assert_eq!(sink.paint(2, 1, Cell::new(b'z', 4)), PaintOutcome::Painted);
        assert_eq!(sink.paint(3, 1, Cell::new(b'z', 4)), PaintOutcome::UnsupportedPosition);
        assert_eq!(sink.paint(0, 2, Cell::new(b'z', 4)), PaintOutcome::UnsupportedPosition);
        assert_eq!(sink.cell(2, 1), Some(Cell::new(b'z', 4)));
        assert_eq!(sink.color_mode(), ColorMode::Basic);
    }

    #[test]
    fn renders_text_with_placeholder() {
        let mut sink = HeadlessSink::new('.');
        sink.begin(4, 2, ColorMode::default()).expect("begin");
        sink.paint(0, 0, Cell::new(b'h', 1));
        sink.paint(1, 0, Cell::new(b'i', 1));
        sink.paint(1, 1, Cell::new(0x01, 1));
        assert_eq!(sink.lines(), vec!["hi  ", " .  "]);
        assert_eq!(sink.to_text(), "hi\n .");
    }

    #[test]
    fn begin_discards_previous_surface() {
        let mut sink = HeadlessSink::default();
        sink.begin(2, 1, ColorMode::default()).expect("begin");
        sink.paint(0, 0, Cell::new(b'x', 1));
        sink.begin(2, 1, ColorMode::default()).expect("begin");
        assert_eq!(sink.to_text(), "");
        assert_eq!(sink.dimensions(), (2, 1));
    }
}

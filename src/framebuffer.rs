// src/framebuffer.rs

//! The frame buffer: a `width x height` grid of [`Cell`]s.
//!
//! Every mutator takes signed coordinates and silently ignores anything
//! outside `[0, width) x [0, height)`, so callers (the interpreter, the line
//! rasterizer) never have to pre-validate positions. An unallocated buffer is
//! 0x0 and ignores all writes.
//!
//! Rows touched by a mutation are marked dirty. The interpreter hands the
//! dirty rows to the presenter, which repaints only those rows.

use crate::glyph::{Cell, BLANK_CELL};
use log::{debug, trace};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    dirty: Vec<bool>,
}

impl FrameBuffer {
    /// Creates an empty (0x0) buffer. Nothing can be drawn until `allocate`.
    pub fn new() -> Self {
        FrameBuffer::default()
    }

    /// Creates a buffer of the given size with every cell blank.
    pub fn with_size(width: usize, height: usize) -> Self {
        let mut fb = FrameBuffer::new();
        fb.allocate(width, height);
        fb
    }

    /// (Re)allocates the grid. Previous content is discarded and every row
    /// is marked dirty. A zero dimension leaves the buffer empty.
    pub fn allocate(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 {
            self.width = 0;
            self.height = 0;
            self.cells.clear();
            self.dirty.clear();
            return;
        }
        self.width = width;
        self.height = height;
        self.cells = vec![BLANK_CELL; width * height];
        self.dirty = vec![true; height];
        debug!("FrameBuffer: allocated {}x{}", width, height);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_allocated(&self) -> bool {
        !self.cells.is_empty()
    }

    /// Maps signed coordinates to a cell index, or `None` when out of range.
    #[inline]
    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    /// Reads the cell at `(x, y)`, or `None` when outside the grid.
    pub fn read_cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y * self.width + x).copied()
    }

    /// Borrows one row of cells.
    pub fn row(&self, y: usize) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.cells.get(start..start + self.width)
    }

    /// Sets one cell. Out-of-range coordinates are ignored.
    pub fn set_cell(&mut self, x: i32, y: i32, glyph: u8, color: u8) {
        let Some(idx) = self.index_of(x, y) else {
            trace!(
                "FrameBuffer: set_cell({}, {}) outside {}x{}, ignored",
                x,
                y,
                self.width,
                self.height
            );
            return;
        };
        self.cells[idx] = Cell::new(glyph, color);
        self.dirty[y as usize] = true;
    }

    /// Writes `glyphs` left to right starting at `(x, y)`, stopping at the
    /// right edge. Nothing is written when the row is out of range or the
    /// start column is outside the grid.
    pub fn set_text(&mut self, x: i32, y: i32, glyphs: &[u8], color: u8) {
        let Some(start) = self.index_of(x, y) else {
            trace!("FrameBuffer: set_text at ({}, {}) outside grid, ignored", x, y);
            return;
        };
        let room = self.width - x as usize;
        let count = glyphs.len().min(room);
        for (cell, &glyph) in self.cells[start..start + count].iter_mut().zip(glyphs) {
            *cell = Cell::new(glyph, color);
        }
        if count > 0 {
            self.dirty[y as usize] = true;
        }
        if count < glyphs.len() {
            trace!(
                "FrameBuffer: text at ({}, {}) truncated from {} to {} glyphs",
                x,
                y,
                glyphs.len(),
                count
            );
        }
    }

    /// Resets every cell to blank. No-op on an unallocated buffer.
    pub fn clear(&mut self) {
        self.cells.fill(BLANK_CELL);
        self.dirty.fill(true);
    }

    /// Returns the indices of rows modified since the last call, and clears
    /// the dirty flags.
    pub fn take_dirty_lines(&mut self) -> Vec<usize> {
        let lines: Vec<usize> = self
            .dirty
            .iter()
            .enumerate()
            .filter_map(|(y, &d)| d.then_some(y))
            .collect();
        self.dirty.fill(false);
        lines
    }

    /// Renders the grid as text lines (placeholder for unprintable glyphs).
    /// Mostly useful for logging and tests.
    pub fn to_lines(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|c| c.display_char('?')).collect())
            .collect()
    }
}

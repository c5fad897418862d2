// src/raster.rs

//! Integer line rasterization.
//!
//! [`line`] yields the grid points of a segment using Bresenham's algorithm
//! with a half-step error accumulator: walk the dominant axis one cell at a
//! time and step the minor axis whenever the accumulated error drops below
//! zero. No floating point is involved, so the output is identical on every
//! platform. Points are not bounds-checked; the frame buffer ignores the ones
//! that fall outside the grid.

/// Iterator over the points of a line, both endpoints included.
#[derive(Debug, Clone)]
pub struct LinePoints {
    x: i32,
    y: i32,
    x_end: i32,
    y_end: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    x_major: bool,
    done: bool,
}

/// Returns the points from `(x1, y1)` to `(x2, y2)` inclusive, in order.
/// A zero-length line yields exactly one point.
pub fn line(x1: i32, y1: i32, x2: i32, y2: i32) -> LinePoints {
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let x_major = dx > dy;
    LinePoints {
        x: x1,
        y: y1,
        x_end: x2,
        y_end: y2,
        dx,
        dy,
        sx: if x1 < x2 { 1 } else { -1 },
        sy: if y1 < y2 { 1 } else { -1 },
        err: if x_major { dx / 2 } else { dy / 2 },
        x_major,
        done: false,
    }
}

impl Iterator for LinePoints {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let point = (self.x, self.y);

        if self.x_major {
            if self.x == self.x_end {
                self.done = true;
                return Some(point);
            }
            self.err -= self.dy;
            if self.err < 0 {
                self.y += self.sy;
                self.err += self.dx;
            }
            self.x += self.sx;
        } else {
            if self.y == self.y_end {
                self.done = true;
                return Some(point);
            }
            self.err -= self.dx;
            if self.err < 0 {
                self.x += self.sx;
                self.err += self.dy;
            }
            self.y += self.sy;
        }
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = if self.x_major {
            (self.x_end - self.x).unsigned_abs()
        } else {
            (self.y_end - self.y).unsigned_abs()
        } as usize
            + 1;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LinePoints {}

impl std::iter::FusedIterator for LinePoints {}

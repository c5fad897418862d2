// src/sink/mod.rs

//! Display sinks: the devices a frame buffer is painted onto.
//!
//! A sink only ever sees a read-only [`FrameBuffer`] through the
//! [`Presenter`]. Paint calls report a [`PaintOutcome`] instead of failing, and
//! errors from `begin`/`present` are logged and dropped here, so a device
//! problem can never abort stream processing. Only acquiring a sink (see
//! [`console::ConsoleSink::acquire`]) is allowed to fail the whole run.

pub mod console;
pub mod headless;

pub use console::ConsoleSink;
pub use headless::HeadlessSink;

use crate::color::ColorMode;
use crate::framebuffer::FrameBuffer;
use crate::glyph::Cell;
use anyhow::Result;
use log::{trace, warn};

/// Result of painting a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintOutcome {
    Painted,
    /// The device has no cell at that position; nothing was drawn.
    UnsupportedPosition,
    /// The glyph was drawn, but in the default foreground because the
    /// device's palette does not cover the requested index.
    UnsupportedColor,
}

/// A surface that can show a frame buffer.
pub trait DisplaySink {
    /// Prepares a `width x height` drawing surface, discarding what was shown.
    fn begin(&mut self, width: usize, height: usize, mode: ColorMode) -> Result<()>;

    /// Paints one cell.
    fn paint(&mut self, x: usize, y: usize, cell: Cell) -> PaintOutcome;

    /// Flushes painted cells to the physical device.
    fn present(&mut self) -> Result<()>;
}

/// Tally of one presentation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentStats {
    pub rows: usize,
    pub painted: usize,
    pub unsupported_position: usize,
    pub unsupported_color: usize,
}

impl PresentStats {
    fn record(&mut self, outcome: PaintOutcome) {
        match outcome {
            PaintOutcome::Painted => self.painted += 1,
            PaintOutcome::UnsupportedPosition => self.unsupported_position += 1,
            PaintOutcome::UnsupportedColor => self.unsupported_color += 1,
        }
    }
}

/// Repaints dirty rows of a frame buffer onto a sink.
///
/// Remembers the surface size and color mode it last asked the sink for.
/// When either changes (a new Screen-Setup) the sink is re-`begin`-ed and
/// every row is repainted regardless of the dirty list.
#[derive(Debug, Default)]
pub struct Presenter {
    surface: Option<((usize, usize), ColorMode)>,
    presents: u64,
}

impl Presenter {
    pub fn new() -> Self {
        Presenter::default()
    }

    /// Number of successful-or-not `present` calls issued so far.
    pub fn presents(&self) -> u64 {
        self.presents
    }

    pub fn present(
        &mut self,
        frame: &FrameBuffer,
        mode: ColorMode,
        dirty_rows: &[usize],
        sink: &mut dyn DisplaySink,
    ) -> PresentStats {
        let mut stats = PresentStats::default();
        if !frame.is_allocated() {
            return stats;
        }

        let dims = frame.dimensions();
        let full_repaint = self.surface != Some((dims, mode));
        if full_repaint {
            if let Err(e) = sink.begin(dims.0, dims.1, mode) {
                warn!(
                    "Presenter: sink failed to set up {}x{} {:?} surface: {:#}",
                    dims.0, dims.1, mode, e
                );
            }
            self.surface = Some((dims, mode));
        }

        let all_rows: Vec<usize>;
        let rows: &[usize] = if full_repaint {
            all_rows = (0..dims.1).collect();
            &all_rows
        } else {
            dirty_rows
        };

        for &y in rows {
            let Some(row) = frame.row(y) else {
                warn!("Presenter: dirty row {} outside {}x{} frame, skipped", y, dims.0, dims.1);
                continue;
            };
            for (x, &cell) in row.iter().enumerate() {
                let outcome = sink.paint(x, y, cell);
                if outcome != PaintOutcome::Painted {
                    trace!("Presenter: paint ({}, {}) -> {:?}", x, y, outcome);
                }
                stats.record(outcome);
            }
            stats.rows += 1;
        }

        if stats.rows > 0 {
            if let Err(e) = sink.present() {
                warn!("Presenter: sink failed to present frame: {:#}", e);
            }
            self.presents += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use test_log::test;

    /// Sink that records calls and can be told to fail.
    #[derive(Default)]
    struct RecordingSink {
        begins: Vec<(usize, usize, ColorMode)>,
        painted: Vec<(usize, usize, Cell)>,
        presents: usize,
        max_x: Option<usize>,
        fail_begin: bool,
        fail_present: bool,
    }

    impl DisplaySink for RecordingSink {
        fn begin(&mut self, width: usize, height: usize, mode: ColorMode) -> Result<()> {
            self.begins.push((width, height, mode));
            if self.fail_begin {
                return Err(anyhow!("begin refused"));
            }
            Ok(())
        }

        fn paint(&mut self, x: usize, y: usize, cell: Cell) -> PaintOutcome {
            if self.max_x.is_some_and(|m| x > m) {
                return PaintOutcome::UnsupportedPosition;
            }
            self.painted.push((x, y, cell));
            if cell.color > 15 {
                return PaintOutcome::UnsupportedColor;
            }
            PaintOutcome::Painted
        }

        fn present(&mut self) -> Result<()> {
            self.presents += 1;
            if self.fail_present {
                return Err(anyhow!("present refused"));
            }
            Ok(())
        }
    }

    #[test]
    fn unallocated_frame_paints_nothing() {
        let mut sink = RecordingSink::default();
        let stats =
            Presenter::new().present(&FrameBuffer::new(), ColorMode::default(), &[0], &mut sink);
        assert_eq!(stats, PresentStats::default());
        assert!(sink.begins.is_empty());
        assert_eq!(sink.presents, 0);
    }

    #[test]
    fn first_present_repaints_everything() {
        let mut fb = FrameBuffer::with_size(3, 2);
        fb.set_cell(1, 1, b'x', 2);
        let mut sink = RecordingSink::default();
        let mut presenter = Presenter::new();
        let stats = presenter.present(&fb, ColorMode::Basic, &[], &mut sink);
        assert_eq!(sink.begins, vec![(3, 2, ColorMode::Basic)]);
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.painted, 6);
        assert_eq!(sink.presents, 1);
        assert!(sink.painted.contains(&(1, 1, Cell::new(b'x', 2))));
    }

    #[test]
    fn later_presents_only_touch_dirty_rows() {
        let mut fb = FrameBuffer::with_size(2, 3);
        let mut sink = RecordingSink::default();
        let mut presenter = Presenter::new();
        presenter.present(&fb, ColorMode::default(), &fb.clone().take_dirty_lines(), &mut sink);
        fb.take_dirty_lines();
        sink.painted.clear();

        fb.set_cell(0, 2, b'q', 1);
        let dirty = fb.take_dirty_lines();
        let stats = presenter.present(&fb, ColorMode::default(), &dirty, &mut sink);
        assert_eq!(stats.rows, 1);
        assert_eq!(sink.painted, vec![(0, 2, Cell::new(b'q', 1)), (1, 2, Cell::new(b' ', 0))]);
        assert_eq!(sink.begins.len(), 1);

        // No dirty rows: no paint, no present.
        let stats = presenter.present(&fb, ColorMode::default(), &[], &mut sink);
        assert_eq!(stats.rows, 0);
        assert_eq!(sink.presents, 2);
        assert_eq!(presenter.presents(), 2);
    }

    #[test]
    fn new_dimensions_restart_the_surface() {
        let mut sink = RecordingSink::default();
        let mut presenter = Presenter::new();
        presenter.present(&FrameBuffer::with_size(2, 2), ColorMode::default(), &[], &mut sink);
        presenter.present(&FrameBuffer::with_size(4, 1), ColorMode::Extended, &[], &mut sink);
        assert_eq!(
            sink.begins,
            vec![(2, 2, ColorMode::Unspecified), (4, 1, ColorMode::Extended)]
        );
    }

    #[test]
    fn new_color_mode_restarts_the_surface() {
        let fb = FrameBuffer::with_size(4, 1);
        let mut sink = RecordingSink::default();
        let mut presenter = Presenter::new();
        presenter.present(&fb, ColorMode::Basic, &[], &mut sink);
        let stats = presenter.present(&fb, ColorMode::Extended, &[], &mut sink);
        assert_eq!(
            sink.begins,
            vec![(4, 1, ColorMode::Basic), (4, 1, ColorMode::Extended)]
        );
        assert_eq!(stats.rows, 1);

        // Same size and mode again: no new surface.
        presenter.present(&fb, ColorMode::Extended, &[], &mut sink);
        assert_eq!(sink.begins.len(), 2);
    }

    #[test]
    fn paint_outcomes_are_counted_not_propagated() {
        let mut fb = FrameBuffer::with_size(4, 1);
        fb.set_text(0, 0, b"ab", 200);
        let mut sink = RecordingSink {
            max_x: Some(2),
            ..Default::default()
        };
        let stats = Presenter::new().present(&fb, ColorMode::default(), &[], &mut sink);
        assert_eq!(stats.unsupported_color, 2);
        assert_eq!(stats.painted, 1);
        assert_eq!(stats.unsupported_position, 1);
    }

    #[test]
    fn sink_errors_are_swallowed() {
        let fb = FrameBuffer::with_size(1, 1);
        let mut sink = RecordingSink {
            fail_begin: true,
            fail_present: true,
            ..Default::default()
        };
        let stats = Presenter::new().present(&fb, ColorMode::default(), &[], &mut sink);
        assert_eq!(stats.painted, 1);
        assert_eq!(sink.presents, 1);
    }

    #[test]
    fn out_of_range_dirty_rows_are_skipped() {
        let fb = FrameBuffer::with_size(1, 1);
        let mut sink = RecordingSink::default();
        let mut presenter = Presenter::new();
        presenter.present(&fb, ColorMode::default(), &[], &mut sink);
        let stats = presenter.present(&fb, ColorMode::default(), &[5], &mut sink);
        assert_eq!(stats.rows, 0);
    }
}

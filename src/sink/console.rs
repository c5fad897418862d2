// src/sink/console.rs

//! Terminal sink: paints cells with ANSI cursor positioning and SGR color.
//!
//! [`ConsoleSink::acquire`] takes over the controlling terminal: raw mode
//! (no echo, no line buffering), hidden cursor, cleared screen. Dropping the
//! sink undoes all of it, including on early returns and errors, so the
//! terminal is restored on every exit path that unwinds normally.

use super::{DisplaySink, PaintOutcome};
use crate::color::{Color, ColorMode, Palette};
use crate::config::Config;
use crate::glyph::Cell;

use anyhow::{Context, Result};
use libc::{winsize, TIOCGWINSZ};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::mem;
use std::os::unix::io::{AsRawFd, RawFd};
use termios::{tcsetattr, Termios, ECHO, ICANON, TCSANOW, VMIN, VTIME};

use log::{debug, error, info, trace, warn};

const TTY_PATH: &str = "/dev/tty";

const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";
const SGR_PREFIX: &str = "\x1b[";
const SGR_SUFFIX: char = 'm';
const SGR_SEPARATOR: char = ';';
const SGR_RESET_ALL: u16 = 0;
const SGR_DEFAULT_FG: u16 = 39;
const CLEAR_SCREEN_AND_HOME: &str = "\x1b[2J\x1b[H";

const DEFAULT_TERMINAL_COLS: usize = 80;
const DEFAULT_TERMINAL_ROWS: usize = 24;

/// Raw-mode terminal handle. Restores the saved attributes when dropped.
struct RawTty {
    file: File,
    original: Termios,
}

impl RawTty {
    fn enter(file: File) -> Result<Self> {
        let fd = file.as_raw_fd();
        let original =
            Termios::from_fd(fd).context("ConsoleSink: failed to get terminal attributes")?;

        let mut raw = original;
        raw.c_lflag &= !(ECHO | ICANON);
        raw.c_iflag &= !(libc::IXON | libc::ICRNL);
        raw.c_oflag &= !libc::OPOST;
        raw.c_cc[VMIN] = 1;
        raw.c_cc[VTIME] = 0;
        tcsetattr(fd, TCSANOW, &raw).context("ConsoleSink: failed to set raw terminal attributes")?;
        debug!("ConsoleSink: terminal set to raw mode");

        Ok(RawTty { file, original })
    }
}

impl Drop for RawTty {
    fn drop(&mut self) {
        debug!("ConsoleSink: restoring original terminal attributes");
        if let Err(e) = tcsetattr(self.file.as_raw_fd(), TCSANOW, &self.original) {
            error!("ConsoleSink: failed to restore terminal attributes: {}", e);
        }
    }
}

/// Where the terminal's cursor is and which foreground is active, so runs of
/// cells on one row go out without repeated positioning and SGR sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pen {
    x: usize,
    y: usize,
    color: Color,
}

pub struct ConsoleSink<W: Write> {
    out: W,
    // Must stay after `out`: fields drop in order and raw mode ends last.
    tty: Option<RawTty>,
    cols: usize,
    rows: usize,
    surface: (usize, usize),
    palette_size: u16,
    default_fg: Color,
    /// Built by `begin`; `None` until the color table is ready.
    palette: Option<Palette>,
    placeholder: char,
    pen: Option<Pen>,
    write_error: Option<io::Error>,
    /// Set once the screen has been taken over; `Drop` then restores it.
    active: bool,
    cleaned_up: bool,
}

impl ConsoleSink<BufWriter<File>> {
    /// Opens the controlling terminal and switches it to raw mode.
    pub fn acquire(config: &Config) -> Result<Self> {
        info!("ConsoleSink: acquiring {}", TTY_PATH);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(TTY_PATH)
            .with_context(|| format!("ConsoleSink: failed to open {}", TTY_PATH))?;
        let tty = RawTty::enter(file)?;

        let (cols, rows) = terminal_size(tty.file.as_raw_fd())
            .context("ConsoleSink: failed to get terminal size")?;
        info!("ConsoleSink: terminal size {}x{} cells", cols, rows);

        let out = tty
            .file
            .try_clone()
            .context("ConsoleSink: failed to clone terminal handle")?;
        let mut sink = ConsoleSink::with_writer(BufWriter::new(out), cols, rows, config);
        sink.tty = Some(tty);
        sink.take_over()?;
        Ok(sink)
    }
}

impl<W: Write> ConsoleSink<W> {
    /// A sink writing escape sequences to `out` for a `cols x rows` terminal.
    /// No terminal modes are touched.
    pub fn with_writer(out: W, cols: usize, rows: usize, config: &Config) -> Self {
        ConsoleSink {
            out,
            tty: None,
            cols,
            rows,
            surface: (0, 0),
            palette_size: config.colors.palette_size,
            default_fg: config.colors.default_foreground,
            palette: None,
            placeholder: config.display.placeholder,
            pen: None,
            write_error: None,
            active: false,
            cleaned_up: false,
        }
    }

    /// Hides the cursor and clears the screen. From here on, dropping the
    /// sink shows the cursor again, even if this call fails part way.
    fn take_over(&mut self) -> Result<()> {
        self.active = true;
        self.out
            .write_all(CURSOR_HIDE.as_bytes())
            .and_then(|_| self.out.write_all(CLEAR_SCREEN_AND_HOME.as_bytes()))
            .and_then(|_| self.out.flush())
            .context("ConsoleSink: failed to prepare terminal")
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Writes `text` on the last row of the drawing surface (or of the
    /// terminal, whichever is smaller), cut to the terminal width.
    pub fn show_prompt(&mut self, text: &str) -> Result<()> {
        let rows = if self.surface.1 == 0 {
            self.rows
        } else {
            self.surface.1.min(self.rows)
        };
        let row = rows.max(1);
        let visible: String = text.chars().take(self.cols).collect();

        let mut cmd = format_cursor_position(row, 1);
        cmd.push_str(&format_sgr(&[SGR_RESET_ALL]));
        cmd.push_str(&visible);
        self.pen = None;
        self.out
            .write_all(cmd.as_bytes())
            .and_then(|_| self.out.flush())
            .context("ConsoleSink: failed to write prompt")
    }

    /// Blocks until one byte arrives from the terminal. Returns immediately
    /// when the sink has no terminal, at end of input, or when a signal
    /// interrupts the read.
    pub fn wait_for_key(&mut self) -> Result<()> {
        let Some(tty) = self.tty.as_ref() else {
            return Ok(());
        };
        let mut buf = [0u8; 1];
        match (&tty.file).read(&mut buf) {
            Ok(0) => debug!("ConsoleSink: EOF while waiting for key"),
            Ok(_) => trace!("ConsoleSink: key 0x{:02X}", buf[0]),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                debug!("ConsoleSink: wait for key interrupted");
            }
            Err(e) => return Err(e).context("ConsoleSink: error reading from terminal"),
        }
        Ok(())
    }

    /// Resets colors, shows the cursor and moves below the drawing. Safe to
    /// call more than once.
    pub fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;
        info!("ConsoleSink: cleaning up");
        let mut cmd = format_sgr(&[SGR_RESET_ALL]);
        cmd.push_str(CURSOR_SHOW);
        cmd.push_str(&format_cursor_position(self.rows.max(1), 1));
        cmd.push_str("\r\n");
        self.out
            .write_all(cmd.as_bytes())
            .and_then(|_| self.out.flush())
            .context("ConsoleSink: failed to restore cursor")
    }

    fn write_cmd(&mut self, cmd: &str) {
        if self.write_error.is_some() {
            return;
        }
        if let Err(e) = self.out.write_all(cmd.as_bytes()) {
            warn!("ConsoleSink: write failed: {}", e);
            self.write_error = Some(e);
        }
    }
}

impl<W: Write> DisplaySink for ConsoleSink<W> {
    fn begin(&mut self, width: usize, height: usize, mode: ColorMode) -> Result<()> {
        let palette = Palette::new(self.palette_size, mode, self.default_fg);
        debug!(
            "ConsoleSink: surface {}x{}, {:?}, palette of {}",
            width,
            height,
            mode,
            palette.size()
        );
        if width > self.cols || height > self.rows {
            warn!(
                "ConsoleSink: {}x{} surface exceeds {}x{} terminal; outside cells are dropped",
                width, height, self.cols, self.rows
            );
        }
        self.palette = Some(palette);
        self.surface = (width, height);
        self.pen = None;

        let mut cmd = format_sgr(&[SGR_RESET_ALL]);
        cmd.push_str(CLEAR_SCREEN_AND_HOME);
        self.out
            .write_all(cmd.as_bytes())
            .context("ConsoleSink: failed to clear screen")
    }

    fn paint(&mut self, x: usize, y: usize, cell: Cell) -> PaintOutcome {
        if x >= self.cols || y >= self.rows {
            return PaintOutcome::UnsupportedPosition;
        }
        let (color, fallback) = match &self.palette {
            Some(palette) => palette.resolve(cell.color),
            None => (self.default_fg, cell.color != 0),
        };

        let mut cmd = String::new();
        match self.pen {
            Some(pen) if pen.x == x && pen.y == y => {}
            _ => cmd.push_str(&format_cursor_position(y + 1, x + 1)),
        }
        if self.pen.map(|p| p.color) != Some(color) {
            cmd.push_str(&format_sgr(&sgr_fg_codes(color)));
        }
        cmd.push(cell.display_char(self.placeholder));
        self.write_cmd(&cmd);
        self.pen = Some(Pen { x: x + 1, y, color });

        if fallback {
            PaintOutcome::UnsupportedColor
        } else {
            PaintOutcome::Painted
        }
    }

    fn present(&mut self) -> Result<()> {
        if let Some(e) = self.write_error.take() {
            self.pen = None;
            return Err(e).context("ConsoleSink: failed to write cells");
        }
        self.out
            .flush()
            .context("ConsoleSink: failed to flush terminal output")
    }
}

impl<W: Write> Drop for ConsoleSink<W> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = self.cleanup() {
            error!("ConsoleSink: error during cleanup in drop: {:#}", e);
        }
    }
}

/// SGR parameters selecting `fg` as the foreground color.
fn sgr_fg_codes(fg: Color) -> Vec<u16> {
    match fg {
        Color::Default => vec![SGR_DEFAULT_FG],
        Color::Named(nc) => {
            if (nc as u8) < 8 {
                vec![30 + nc as u16]
            } else {
                vec![90 + (nc as u8 - 8) as u16]
            }
        }
        Color::Indexed(idx) => vec![38, 5, idx as u16],
        Color::Rgb(r, g, b) => vec![38, 2, r as u16, g as u16, b as u16],
    }
}

fn format_sgr(codes: &[u16]) -> String {
    let mut cmd = String::from(SGR_PREFIX);
    cmd.push_str(
        &codes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(&SGR_SEPARATOR.to_string()),
    );
    cmd.push(SGR_SUFFIX);
    cmd
}

fn format_cursor_position(row_1_based: usize, col_1_based: usize) -> String {
    format!("\x1b[{};{}H", row_1_based, col_1_based)
}

fn terminal_size(fd: RawFd) -> Result<(usize, usize)> {
    // SAFETY: `winsz` is a plain C struct the ioctl fills in.
    unsafe {
        let mut winsz: winsize = mem::zeroed();
        if libc::ioctl(fd, TIOCGWINSZ, &mut winsz) == -1 {
            return Err(anyhow::Error::from(io::Error::last_os_error())
                .context("ConsoleSink: ioctl(TIOCGWINSZ) failed"));
        }
        let cols = if winsz.ws_col == 0 {
            DEFAULT_TERMINAL_COLS
        } else {
            winsz.ws_col as usize
        };
        let rows = if winsz.ws_row == 0 {
            DEFAULT_TERMINAL_ROWS
        } else {
            winsz.ws_row as usize
        };
        Ok((cols, rows))
    }
}

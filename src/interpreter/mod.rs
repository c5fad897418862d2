// src/interpreter/mod.rs

//! The command interpreter: a small state machine that applies decoded
//! records to a [`FrameBuffer`].
//!
//! ```text
//! Uninitialized --(ScreenSetup, w>0 && h>0)--> Ready
//! Uninitialized | Ready --(EndOfStream)--> Stopped
//! ```
//!
//! While uninitialized every command except Screen-Setup and End-Of-Stream is
//! dropped. Malformed payloads, unknown opcodes and out-of-range coordinates
//! are no-ops. Processing a record only ever reports "continue" or "stop";
//! there is no error path for bad data.

use crate::color::ColorMode;
use crate::framebuffer::FrameBuffer;
use crate::protocol::{self, Command, Record};
use crate::raster;
use log::{debug, trace};

/// Lifecycle of one stream's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpreterState {
    /// No valid Screen-Setup seen yet; drawing commands are ignored.
    #[default]
    Uninitialized,
    /// A frame buffer is allocated and commands are applied.
    Ready,
    /// End-Of-Stream was processed. Terminal.
    Stopped,
}

/// Cursor position used by Draw-At-Cursor. Always inside the buffer once
/// the buffer is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
}

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// An End-Of-Stream command was processed.
    EndOfStream,
    /// The bytes ran out. `trailing` counts the bytes of an incomplete final
    /// record that were dropped (0 when the stream ended on a boundary).
    Exhausted { trailing: usize },
    /// The driving loop was cancelled from outside at a record boundary.
    Interrupted,
}

#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    state: InterpreterState,
    frame: FrameBuffer,
    cursor: Cursor,
    color_mode: ColorMode,
    records_seen: u64,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::default()
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    /// True once a valid Screen-Setup has been applied. Never reverts.
    pub fn is_initialized(&self) -> bool {
        self.frame.is_allocated()
    }

    pub fn is_stopped(&self) -> bool {
        self.state == InterpreterState::Stopped
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Read-only view of the frame buffer for display sinks.
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Consumes the interpreter, keeping only the frame buffer.
    pub fn into_frame(self) -> FrameBuffer {
        self.frame
    }

    /// Number of records fed so far, including ignored ones.
    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    /// Rows modified since the last call. See [`FrameBuffer::take_dirty_lines`].
    pub fn take_dirty_lines(&mut self) -> Vec<usize> {
        self.frame.take_dirty_lines()
    }

    /// Processes one record. Returns `false` only for End-Of-Stream (and for
    /// any record fed after the interpreter has stopped).
    pub fn feed(&mut self, record: Record<'_>) -> bool {
        self.records_seen += 1;
        let command = Command::parse(&record);
        trace!(
            "Interpreter: record #{} opcode 0x{:02X} len {} -> {:?}",
            self.records_seen,
            record.opcode,
            record.len(),
            command
        );
        self.apply(command)
    }

    /// Applies one parsed command. Same return contract as [`Interpreter::feed`].
    pub fn apply(&mut self, command: Command<'_>) -> bool {
        match self.state {
            InterpreterState::Stopped => {
                trace!("Interpreter: already stopped, ignoring {:?}", command);
                return false;
            }
            InterpreterState::Uninitialized => match command {
                Command::ScreenSetup { .. } | Command::EndOfStream => {}
                _ => {
                    trace!("Interpreter: not initialized, dropping {:?}", command);
                    return true;
                }
            },
            InterpreterState::Ready => {}
        }

        match command {
            Command::ScreenSetup {
                width,
                height,
                color_mode,
            } => self.screen_setup(width, height, color_mode),
            Command::DrawCharacter { x, y, color, glyph } => {
                self.frame.set_cell(x.into(), y.into(), glyph, color);
            }
            Command::DrawLine {
                x1,
                y1,
                x2,
                y2,
                color,
                glyph,
            } => {
                for (x, y) in raster::line(x1.into(), y1.into(), x2.into(), y2.into()) {
                    self.frame.set_cell(x, y, glyph, color);
                }
            }
            Command::RenderText { x, y, color, text } => {
                self.frame.set_text(x.into(), y.into(), text, color);
            }
            Command::CursorMovement { x, y } => self.move_cursor(x, y),
            Command::DrawAtCursor { glyph, color } => {
                let Cursor { x, y } = self.cursor;
                self.frame.set_cell(x as i32, y as i32, glyph, color);
            }
            Command::ClearScreen => self.frame.clear(),
            Command::EndOfStream => {
                debug!("Interpreter: end of stream after {} record(s)", self.records_seen);
                self.state = InterpreterState::Stopped;
                return false;
            }
            Command::Malformed { opcode, len } => {
                debug!(
                    "Interpreter: {} needs {} payload byte(s), got {}; skipped",
                    opcode,
                    opcode.min_payload(),
                    len
                );
            }
            Command::Unknown(opcode) => {
                debug!("Interpreter: unknown opcode 0x{:02X}; skipped", opcode);
            }
        }
        true
    }

    fn screen_setup(&mut self, width: u8, height: u8, color_mode: u8) {
        if width == 0 || height == 0 {
            debug!(
                "Interpreter: ignoring screen setup with invalid size {}x{}",
                width, height
            );
            return;
        }
        if self.state == InterpreterState::Ready {
            debug!("Interpreter: screen setup while ready; reallocating, content is lost");
        }
        self.frame.allocate(width.into(), height.into());
        self.color_mode = ColorMode::from_byte(color_mode);
        self.cursor.x = self.cursor.x.min(self.frame.width() - 1);
        self.cursor.y = self.cursor.y.min(self.frame.height() - 1);
        self.state = InterpreterState::Ready;
        debug!(
            "Interpreter: screen {}x{} color mode {:?}",
            width, height, self.color_mode
        );
    }

    // Clamps into the buffer; only reachable once the buffer is allocated.
    fn move_cursor(&mut self, x: u8, y: u8) {
        let max_x = self.frame.width().saturating_sub(1);
        let max_y = self.frame.height().saturating_sub(1);
        self.cursor.x = usize::from(x).min(max_x);
        self.cursor.y = usize::from(y).min(max_y);
        trace!(
            "Interpreter: cursor -> ({}, {})",
            self.cursor.x,
            self.cursor.y
        );
    }

    /// Feeds every record of a complete byte slice until End-Of-Stream or
    /// the end of the data.
    pub fn run(&mut self, bytes: &[u8]) -> StreamEnd {
        let mut records = protocol::records(bytes);
        for record in records.by_ref() {
            if !self.feed(record) {
                return StreamEnd::EndOfStream;
            }
        }
        StreamEnd::Exhausted {
            trailing: records.trailing(),
        }
    }
}

/// Interprets a complete stream and returns the resulting frame buffer.
pub fn interpret(stream: &[u8]) -> FrameBuffer {
    let mut interpreter = Interpreter::new();
    let end = interpreter.run(stream);
    debug!("interpret: {} bytes, ended with {:?}", stream.len(), end);
    interpreter.into_frame()
}

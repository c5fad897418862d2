// src/lib.rs

//! Interpreter for a compact binary stream of character-cell drawing commands.
//!
//! A stream is a sequence of `opcode, length, payload` records (see
//! [`protocol`]). The [`interpreter`] applies them to a [`FrameBuffer`] of
//! glyph/color cells, and a [`sink`] shows the buffer on a device.
//!
//! ```
//! use termgfx::protocol::StreamBuilder;
//!
//! let mut stream = StreamBuilder::new();
//! stream.screen_setup(8, 2, 1).draw_line(0, 1, 7, 1, 2, b'=');
//! stream.render_text(1, 0, 1, "hi").unwrap();
//! stream.end_of_stream();
//!
//! let frame = termgfx::interpret(stream.as_bytes());
//! assert_eq!(frame.to_lines(), vec![" hi     ", "========"]);
//! ```

pub mod color;
pub mod config;
pub mod framebuffer;
pub mod glyph;
pub mod interpreter;
pub mod protocol;
pub mod raster;
pub mod session;
pub mod signal;
pub mod sink;

pub use framebuffer::FrameBuffer;
pub use glyph::Cell;
pub use interpreter::{interpret, Cursor, Interpreter, InterpreterState, StreamEnd};
pub use session::Session;

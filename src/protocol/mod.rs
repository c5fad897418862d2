// src/protocol/mod.rs

//! The binary drawing-command wire format.
//!
//! ```text
//! stream  := command*
//! command := opcode:u8 length:u8 payload:u8[length]
//! ```
//!
//! There is no overall length prefix, checksum, or version byte. A stream
//! ends at an End-Of-Stream command (`0xFF`) or where the bytes run out; a
//! final record whose payload is cut short is dropped, not reported.
//!
//! | Opcode | Command         | Payload                          |
//! |--------|-----------------|----------------------------------|
//! | `0x01` | Screen Setup    | width, height, color_mode        |
//! | `0x02` | Draw Character  | x, y, color, glyph               |
//! | `0x03` | Draw Line       | x1, y1, x2, y2, color, glyph     |
//! | `0x04` | Render Text     | x, y, color, glyph bytes...      |
//! | `0x05` | Cursor Movement | x, y                             |
//! | `0x06` | Draw At Cursor  | glyph, color                     |
//! | `0x07` | Clear Screen    | (none)                           |
//! | `0xFF` | End Of Stream   | (none)                           |

mod command;
mod decoder;
mod encoder;

pub use command::{Command, Opcode};
pub use decoder::{decode_at, records, Decoded, OwnedRecord, Record, Records, StreamDecoder};
pub use encoder::StreamBuilder;

/// Bytes of framing in front of every payload (opcode + length).
pub const HEADER_LEN: usize = 2;

/// Largest payload a single record can carry.
pub const MAX_PAYLOAD_LEN: usize = u8::MAX as usize;

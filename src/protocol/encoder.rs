// src/protocol/encoder.rs

//! Producer-side encoder for drawing-command streams.

use super::{Opcode, MAX_PAYLOAD_LEN};
use anyhow::{bail, Result};

/// Glyph substituted for characters that have no single-byte ASCII code.
const NON_ASCII_REPLACEMENT: u8 = b'?';

/// Builds a well-formed command stream.
///
/// ```
/// use termgfx::protocol::StreamBuilder;
///
/// let mut builder = StreamBuilder::new();
/// builder
///     .screen_setup(80, 24, 2)
///     .draw_character(10, 5, 12, b'A')
///     .end_of_stream();
/// assert_eq!(
///     builder.into_bytes(),
///     vec![0x01, 3, 80, 24, 2, 0x02, 4, 10, 5, 12, 65, 0xFF, 0]
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamBuilder {
    data: Vec<u8>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        StreamBuilder::default()
    }

    /// Appends a raw record. Fails if the payload does not fit the length byte.
    pub fn command(&mut self, opcode: u8, payload: &[u8]) -> Result<&mut Self> {
        if payload.len() > MAX_PAYLOAD_LEN {
            bail!(
                "payload of {} bytes exceeds the {}-byte record limit (opcode 0x{:02X})",
                payload.len(),
                MAX_PAYLOAD_LEN,
                opcode
            );
        }
        self.data.push(opcode);
        self.data.push(payload.len() as u8);
        self.data.extend_from_slice(payload);
        Ok(self)
    }

    // Fixed-size payloads always fit.
    fn fixed(&mut self, opcode: Opcode, payload: &[u8]) -> &mut Self {
        self.data.push(opcode.as_byte());
        self.data.push(payload.len() as u8);
        self.data.extend_from_slice(payload);
        self
    }

    pub fn screen_setup(&mut self, width: u8, height: u8, color_mode: u8) -> &mut Self {
        self.fixed(Opcode::ScreenSetup, &[width, height, color_mode])
    }

    pub fn draw_character(&mut self, x: u8, y: u8, color: u8, glyph: u8) -> &mut Self {
        self.fixed(Opcode::DrawCharacter, &[x, y, color, glyph])
    }

    pub fn draw_line(&mut self, x1: u8, y1: u8, x2: u8, y2: u8, color: u8, glyph: u8) -> &mut Self {
        self.fixed(Opcode::DrawLine, &[x1, y1, x2, y2, color, glyph])
    }

    /// Appends a Render-Text record. Non-ASCII characters become `?`.
    /// Fails when the text is longer than 252 bytes.
    pub fn render_text(&mut self, x: u8, y: u8, color: u8, text: &str) -> Result<&mut Self> {
        let mut payload = vec![x, y, color];
        payload.extend(text.chars().map(|c| {
            if c.is_ascii() {
                c as u8
            } else {
                NON_ASCII_REPLACEMENT
            }
        }));
        self.command(Opcode::RenderText.as_byte(), &payload)
    }

    pub fn cursor_movement(&mut self, x: u8, y: u8) -> &mut Self {
        self.fixed(Opcode::CursorMovement, &[x, y])
    }

    pub fn draw_at_cursor(&mut self, glyph: u8, color: u8) -> &mut Self {
        self.fixed(Opcode::DrawAtCursor, &[glyph, color])
    }

    pub fn clear_screen(&mut self) -> &mut Self {
        self.fixed(Opcode::ClearScreen, &[])
    }

    pub fn end_of_stream(&mut self) -> &mut Self {
        self.fixed(Opcode::EndOfStream, &[])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

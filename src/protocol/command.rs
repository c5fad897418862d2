// src/protocol/command.rs

//! Typed view of a decoded record.
//!
//! [`Command::parse`] never fails: a known opcode with a payload shorter than
//! it needs becomes [`Command::Malformed`], an unrecognised opcode becomes
//! [`Command::Unknown`]. Payload bytes beyond the minimum are ignored.

use super::Record;
use std::fmt;

/// Known opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    ScreenSetup = 0x01,
    DrawCharacter = 0x02,
    DrawLine = 0x03,
    RenderText = 0x04,
    CursorMovement = 0x05,
    DrawAtCursor = 0x06,
    ClearScreen = 0x07,
    EndOfStream = 0xFF,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Opcode::ScreenSetup),
            0x02 => Some(Opcode::DrawCharacter),
            0x03 => Some(Opcode::DrawLine),
            0x04 => Some(Opcode::RenderText),
            0x05 => Some(Opcode::CursorMovement),
            0x06 => Some(Opcode::DrawAtCursor),
            0x07 => Some(Opcode::ClearScreen),
            0xFF => Some(Opcode::EndOfStream),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Smallest payload this opcode can act on.
    pub fn min_payload(self) -> usize {
        match self {
            Opcode::ScreenSetup => 3,
            Opcode::DrawCharacter => 4,
            Opcode::DrawLine => 6,
            Opcode::RenderText => 3,
            Opcode::CursorMovement => 2,
            Opcode::DrawAtCursor => 2,
            Opcode::ClearScreen | Opcode::EndOfStream => 0,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::ScreenSetup => "ScreenSetup",
            Opcode::DrawCharacter => "DrawCharacter",
            Opcode::DrawLine => "DrawLine",
            Opcode::RenderText => "RenderText",
            Opcode::CursorMovement => "CursorMovement",
            Opcode::DrawAtCursor => "DrawAtCursor",
            Opcode::ClearScreen => "ClearScreen",
            Opcode::EndOfStream => "EndOfStream",
        };
        write!(f, "{}(0x{:02X})", name, self.as_byte())
    }
}

/// A decoded drawing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    ScreenSetup {
        width: u8,
        height: u8,
        color_mode: u8,
    },
    DrawCharacter {
        x: u8,
        y: u8,
        color: u8,
        glyph: u8,
    },
    DrawLine {
        x1: u8,
        y1: u8,
        x2: u8,
        y2: u8,
        color: u8,
        glyph: u8,
    },
    RenderText {
        x: u8,
        y: u8,
        color: u8,
        text: &'a [u8],
    },
    CursorMovement {
        x: u8,
        y: u8,
    },
    DrawAtCursor {
        glyph: u8,
        color: u8,
    },
    ClearScreen,
    EndOfStream,
    /// A known opcode whose payload is too short to act on.
    Malformed { opcode: Opcode, len: usize },
    /// An opcode outside the table.
    Unknown(u8),
}

impl<'a> Command<'a> {
    pub fn parse(record: &Record<'a>) -> Self {
        let Some(opcode) = Opcode::from_byte(record.opcode) else {
            return Command::Unknown(record.opcode);
        };
        let p = record.payload;
        if p.len() < opcode.min_payload() {
            return Command::Malformed {
                opcode,
                len: p.len(),
            };
        }
        match opcode {
            Opcode::ScreenSetup => Command::ScreenSetup {
                width: p[0],
                height: p[1],
                color_mode: p[2],
            },
            Opcode::DrawCharacter => Command::DrawCharacter {
                x: p[0],
                y: p[1],
                color: p[2],
                glyph: p[3],
            },
            Opcode::DrawLine => Command::DrawLine {
                x1: p[0],
                y1: p[1],
                x2: p[2],
                y2: p[3],
                color: p[4],
                glyph: p[5],
            },
            Opcode::RenderText => Command::RenderText {
                x: p[0],
                y: p[1],
                color: p[2],
                text: &p[3..],
            },
            Opcode::CursorMovement => Command::CursorMovement { x: p[0], y: p[1] },
            Opcode::DrawAtCursor => Command::DrawAtCursor {
                glyph: p[0],
                color: p[1],
            },
            Opcode::ClearScreen => Command::ClearScreen,
            Opcode::EndOfStream => Command::EndOfStream,
        }
    }

    /// The opcode this command came from, if it was a known one.
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Command::ScreenSetup { .. } => Some(Opcode::ScreenSetup),
            Command::DrawCharacter { .. } => Some(Opcode::DrawCharacter),
            Command::DrawLine { .. } => Some(Opcode::DrawLine),
            Command::RenderText { .. } => Some(Opcode::RenderText),
            Command::CursorMovement { .. } => Some(Opcode::CursorMovement),
            Command::DrawAtCursor { .. } => Some(Opcode::DrawAtCursor),
            Command::ClearScreen => Some(Opcode::ClearScreen),
            Command::EndOfStream => Some(Opcode::EndOfStream),
            Command::Malformed { opcode, .. } => Some(*opcode),
            Command::Unknown(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(opcode: u8, payload: &[u8]) -> Command<'_> {
        Command::parse(&Record { opcode, payload })
    }

    #[test]
    fn opcode_round_trips_through_byte() {
        for byte in [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xFF] {
            let op = Opcode::from_byte(byte).expect("known opcode");
            assert_eq!(op.as_byte(), byte);
        }
        assert_eq!(Opcode::from_byte(0x00), None);
        assert_eq!(Opcode::from_byte(0x08), None);
        assert_eq!(Opcode::from_byte(0xFE), None);
    }

    #[test]
    fn parses_screen_setup() {
        assert_eq!(
            parse(0x01, &[80, 24, 2]),
            Command::ScreenSetup {
                width: 80,
                height: 24,
                color_mode: 2
            }
        );
    }

    #[test]
    fn parses_draw_line_and_ignores_extra_bytes() {
        assert_eq!(
            parse(0x03, &[0, 0, 9, 9, 1, 42, 77, 78]),
            Command::DrawLine {
                x1: 0,
                y1: 0,
                x2: 9,
                y2: 9,
                color: 1,
                glyph: 42
            }
        );
    }

    #[test]
    fn render_text_takes_remaining_bytes() {
        assert_eq!(
            parse(0x04, &[1, 2, 3, b'h', b'i']),
            Command::RenderText {
                x: 1,
                y: 2,
                color: 3,
                text: b"hi"
            }
        );
        assert_eq!(
            parse(0x04, &[1, 2, 3]),
            Command::RenderText {
                x: 1,
                y: 2,
                color: 3,
                text: b""
            }
        );
    }

    #[test]
    fn short_payloads_are_malformed() {
        assert_eq!(
            parse(0x01, &[80, 24]),
            Command::Malformed {
                opcode: Opcode::ScreenSetup,
                len: 2
            }
        );
        assert_eq!(
            parse(0x02, &[1, 1, 1]),
            Command::Malformed {
                opcode: Opcode::DrawCharacter,
                len: 3
            }
        );
        assert_eq!(
            parse(0x06, &[]),
            Command::Malformed {
                opcode: Opcode::DrawAtCursor,
                len: 0
            }
        );
    }

    #[test]
    fn zero_payload_commands_ignore_payload() {
        assert_eq!(parse(0x07, &[]), Command::ClearScreen);
        assert_eq!(parse(0x07, &[1, 2]), Command::ClearScreen);
        assert_eq!(parse(0xFF, &[]), Command::EndOfStream);
        assert_eq!(parse(0xFF, &[9]), Command::EndOfStream);
    }

    #[test]
    fn unknown_opcode() {
        assert_eq!(parse(0x42, &[1, 2, 3]), Command::Unknown(0x42));
        assert_eq!(parse(0x42, &[]).opcode(), None);
    }

    #[test]
    fn opcode_display_names_the_command() {
        assert_eq!(Opcode::DrawLine.to_string(), "DrawLine(0x03)");
        assert_eq!(Opcode::EndOfStream.to_string(), "EndOfStream(0xFF)");
    }
}

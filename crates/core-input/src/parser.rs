//! Byte-stream to event state machine.
//!
//! The parser pulls bytes through a peek-and-consume source. A lone ESC is
//! only reported as the Escape key after a short grace period with no
//! follow-up byte, since a terminal delivers multi-byte sequences in one
//! burst but a human pressing Escape sends exactly one byte. Unknown
//! sequences degrade to `KeyCode::Unknown` instead of derailing the stream.

use crate::key::{decode_modifier_param, KeyCode, KeyEvent, Modifiers};
use crate::mouse::{decode_button, MouseButton, MouseEvent};
use core_io::{Reader, Result};

/// How long ESC waits for a continuation byte before standing alone.
pub const ESCAPE_GRACE_MS: i32 = 50;

/// Byte supply the parser drives. `core_io::Reader` is the production
/// implementation; tests feed byte vectors.
pub trait ByteSource {
    fn read_byte(&mut self) -> Result<Option<u8>>;
    fn peek_byte(&mut self) -> Result<Option<u8>>;
    fn wait_for_data(&mut self, timeout_ms: i32) -> Result<bool>;
}

impl ByteSource for Reader {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        Reader::read_byte(self)
    }

    fn peek_byte(&mut self) -> Result<Option<u8>> {
        Reader::peek_byte(self)
    }

    fn wait_for_data(&mut self, timeout_ms: i32) -> Result<bool> {
        Reader::wait_for_data(self, timeout_ms)
    }
}

/// A parsed unit of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    FocusGained,
    FocusLost,
}

pub struct InputParser {
    escape_grace_ms: i32,
}

impl Default for InputParser {
    fn default() -> Self {
        InputParser::new()
    }
}

impl InputParser {
    pub fn new() -> InputParser {
        InputParser {
            escape_grace_ms: ESCAPE_GRACE_MS,
        }
    }

    /// Grace override for tests and latency-sensitive embedders.
    pub fn with_escape_grace(escape_grace_ms: i32) -> InputParser {
        InputParser { escape_grace_ms }
    }

    /// Parse the next event, or `None` when the source has nothing buffered.
    pub fn next_event<S: ByteSource>(&mut self, source: &mut S) -> Result<Option<InputEvent>> {
        let Some(byte) = source.read_byte()? else {
            return Ok(None);
        };
        let event = match byte {
            0x1B => self.parse_escape(source)?,
            _ => self.parse_plain(byte, source)?,
        };
        Ok(Some(event))
    }

    /// Wait out the grace period, then consume the next sequence byte.
    fn next_seq_byte<S: ByteSource>(&self, source: &mut S) -> Result<Option<u8>> {
        if !source.wait_for_data(self.escape_grace_ms)? {
            return Ok(None);
        }
        source.read_byte()
    }

    fn parse_escape<S: ByteSource>(&self, source: &mut S) -> Result<InputEvent> {
        if !source.wait_for_data(self.escape_grace_ms)? {
            return Ok(InputEvent::Key(KeyEvent::new(KeyCode::Escape)));
        }
        match source.peek_byte()? {
            None => Ok(InputEvent::Key(KeyEvent::new(KeyCode::Escape))),
            Some(b'[') => {
                source.read_byte()?;
                self.parse_csi(source)
            }
            Some(b'O') => {
                source.read_byte()?;
                self.parse_ss3(source)
            }
            Some(0x1B) => {
                // ESC ESC: alt-modify whatever the second escape resolves to.
                source.read_byte()?;
                Ok(add_alt(self.parse_escape(source)?))
            }
            Some(_) => match source.read_byte()? {
                Some(byte) => Ok(add_alt(self.parse_plain(byte, source)?)),
                None => Ok(InputEvent::Key(KeyEvent::new(KeyCode::Escape))),
            },
        }
    }

    fn parse_ss3<S: ByteSource>(&self, source: &mut S) -> Result<InputEvent> {
        let code = match self.next_seq_byte(source)? {
            Some(b'P') => KeyCode::F(1),
            Some(b'Q') => KeyCode::F(2),
            Some(b'R') => KeyCode::F(3),
            Some(b'S') => KeyCode::F(4),
            Some(b'A') => KeyCode::Up,
            Some(b'B') => KeyCode::Down,
            Some(b'C') => KeyCode::Right,
            Some(b'D') => KeyCode::Left,
            Some(b'H') => KeyCode::Home,
            Some(b'F') => KeyCode::End,
            Some(other) => KeyCode::Unknown(other as char),
            None => KeyCode::Unknown('O'),
        };
        Ok(InputEvent::Key(KeyEvent::new(code)))
    }

    fn parse_csi<S: ByteSource>(&self, source: &mut S) -> Result<InputEvent> {
        let mut param_bytes: Vec<u8> = Vec::new();
        let final_byte;
        loop {
            match self.next_seq_byte(source)? {
                Some(byte @ 0x30..=0x3F) => param_bytes.push(byte),
                Some(0x20..=0x2F) => {} // intermediates are collected and ignored
                Some(byte @ 0x40..=0x7E) => {
                    final_byte = byte;
                    break;
                }
                Some(other) => {
                    tracing::trace!(target: "termisu.input", byte = other, "stray CSI byte");
                    return Ok(InputEvent::Key(KeyEvent::new(KeyCode::Unknown(
                        other as char,
                    ))));
                }
                None => {
                    return Ok(InputEvent::Key(KeyEvent::new(KeyCode::Unknown('['))));
                }
            }
        }

        // X10 mouse: CSI M followed by three raw bytes.
        if final_byte == b'M' && param_bytes.is_empty() {
            return self.parse_x10_mouse(source);
        }
        // SGR mouse: CSI < params M|m.
        if (final_byte == b'M' || final_byte == b'm') && param_bytes.first() == Some(&b'<') {
            return Ok(parse_sgr_mouse(&param_bytes[1..], final_byte));
        }

        let params = parse_params(&param_bytes);
        let modifiers = params
            .get(1)
            .map(|&p| decode_modifier_param(p))
            .unwrap_or_default();

        let event = match final_byte {
            b'A' => KeyEvent::with_modifiers(KeyCode::Up, modifiers),
            b'B' => KeyEvent::with_modifiers(KeyCode::Down, modifiers),
            b'C' => KeyEvent::with_modifiers(KeyCode::Right, modifiers),
            b'D' => KeyEvent::with_modifiers(KeyCode::Left, modifiers),
            b'H' => KeyEvent::with_modifiers(KeyCode::Home, modifiers),
            b'F' => KeyEvent::with_modifiers(KeyCode::End, modifiers),
            b'Z' => KeyEvent::with_modifiers(KeyCode::Tab, Modifiers::SHIFT),
            b'~' => return Ok(tilde_key(&params)),
            b'u' => return Ok(kitty_key(&params)),
            b'I' => return Ok(InputEvent::FocusGained),
            b'O' => return Ok(InputEvent::FocusLost),
            other => KeyEvent::new(KeyCode::Unknown(other as char)),
        };
        Ok(InputEvent::Key(event))
    }

    fn parse_x10_mouse<S: ByteSource>(&self, source: &mut S) -> Result<InputEvent> {
        let mut raw = [0u8; 3];
        for slot in raw.iter_mut() {
            match self.next_seq_byte(source)? {
                Some(byte) => *slot = byte,
                None => {
                    return Ok(InputEvent::Key(KeyEvent::new(KeyCode::Unknown('M'))));
                }
            }
        }
        let (button, modifiers, motion) = decode_button(raw[0] as i32 - 32);
        Ok(InputEvent::Mouse(MouseEvent {
            x: raw[1] as i32 - 32,
            y: raw[2] as i32 - 32,
            button,
            modifiers,
            motion,
        }))
    }

    fn parse_plain<S: ByteSource>(&self, byte: u8, source: &mut S) -> Result<InputEvent> {
        let event = match byte {
            0x0D => KeyEvent::new(KeyCode::Enter),
            0x09 => KeyEvent::new(KeyCode::Tab),
            0x7F => KeyEvent::new(KeyCode::Backspace),
            0x00 => KeyEvent::with_modifiers(KeyCode::Char(' '), Modifiers::CTRL),
            0x01..=0x1A => KeyEvent::with_modifiers(
                KeyCode::Char((byte + 0x60) as char),
                Modifiers::CTRL,
            ),
            0x1C..=0x1F => KeyEvent::with_modifiers(
                KeyCode::Char((byte + 0x40) as char),
                Modifiers::CTRL,
            ),
            0x20..=0x7E => KeyEvent::printable(byte as char),
            _ => return self.parse_utf8(byte, source),
        };
        Ok(InputEvent::Key(event))
    }

    /// Assemble a multi-byte UTF-8 scalar into one character event.
    fn parse_utf8<S: ByteSource>(&self, first: u8, source: &mut S) -> Result<InputEvent> {
        let len = match first {
            b if b & 0xE0 == 0xC0 => 2,
            b if b & 0xF0 == 0xE0 => 3,
            b if b & 0xF8 == 0xF0 => 4,
            _ => {
                return Ok(InputEvent::Key(KeyEvent::new(KeyCode::Unknown(
                    char::REPLACEMENT_CHARACTER,
                ))));
            }
        };
        let mut buf = [0u8; 4];
        buf[0] = first;
        for slot in buf.iter_mut().take(len).skip(1) {
            match self.next_seq_byte(source)? {
                Some(byte) => *slot = byte,
                None => {
                    return Ok(InputEvent::Key(KeyEvent::new(KeyCode::Unknown(
                        char::REPLACEMENT_CHARACTER,
                    ))));
                }
            }
        }
        match std::str::from_utf8(&buf[..len]).ok().and_then(|s| s.chars().next()) {
            Some(ch) => Ok(InputEvent::Key(KeyEvent::printable(ch))),
            None => Ok(InputEvent::Key(KeyEvent::new(KeyCode::Unknown(
                char::REPLACEMENT_CHARACTER,
            )))),
        }
    }
}

fn add_alt(event: InputEvent) -> InputEvent {
    match event {
        InputEvent::Key(mut key) => {
            key.modifiers |= Modifiers::ALT;
            InputEvent::Key(key)
        }
        other => other,
    }
}

fn parse_params(bytes: &[u8]) -> Vec<i32> {
    let mut params = Vec::new();
    let mut current: Option<i32> = None;
    for &byte in bytes {
        match byte {
            b'0'..=b'9' => {
                let digit = (byte - b'0') as i32;
                current = Some(current.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            }
            b';' => {
                params.push(current.take().unwrap_or(0));
            }
            _ => {}
        }
    }
    if let Some(value) = current {
        params.push(value);
    }
    params
}

/// `CSI <code> (;<mods>) ~` editing/function keys.
fn tilde_key(params: &[i32]) -> InputEvent {
    let modifiers = params
        .get(1)
        .map(|&p| decode_modifier_param(p))
        .unwrap_or_default();
    let code = match params.first().copied().unwrap_or(0) {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        11 => KeyCode::F(1),
        12 => KeyCode::F(2),
        13 => KeyCode::F(3),
        14 => KeyCode::F(4),
        15 => KeyCode::F(5),
        17 => KeyCode::F(6),
        18 => KeyCode::F(7),
        19 => KeyCode::F(8),
        20 => KeyCode::F(9),
        21 => KeyCode::F(10),
        23 => KeyCode::F(11),
        24 => KeyCode::F(12),
        other => KeyCode::Unknown(char::from_digit((other % 10) as u32, 10).unwrap_or('?')),
    };
    InputEvent::Key(KeyEvent::with_modifiers(code, modifiers))
}

/// Kitty keyboard protocol, conservative subset: `CSI code (;mods) u` for
/// the codes that disambiguate Tab/Ctrl-I, Enter/Ctrl-M, and Escape/Ctrl-[.
fn kitty_key(params: &[i32]) -> InputEvent {
    let modifiers = params
        .get(1)
        .map(|&p| decode_modifier_param(p))
        .unwrap_or_default();
    let code = params.first().copied().unwrap_or(0);
    let event = match code {
        9 => KeyEvent::with_modifiers(KeyCode::Tab, modifiers),
        13 => KeyEvent::with_modifiers(KeyCode::Enter, modifiers),
        27 => KeyEvent::with_modifiers(KeyCode::Escape, modifiers),
        127 => KeyEvent::with_modifiers(KeyCode::Backspace, modifiers),
        32..=126 => {
            let ch = (code as u8) as char;
            KeyEvent {
                code: KeyCode::Char(ch),
                modifiers,
                ch: if modifiers.is_empty() { Some(ch) } else { None },
            }
        }
        _ => KeyEvent::with_modifiers(KeyCode::Unknown('u'), modifiers),
    };
    InputEvent::Key(event)
}

/// `CSI < Cb ; Cx ; Cy M|m` SGR mouse. `M` is press or motion; `m` always
/// reports a release at the same coordinates.
fn parse_sgr_mouse(param_bytes: &[u8], final_byte: u8) -> InputEvent {
    let params = parse_params(param_bytes);
    let cb = params.first().copied().unwrap_or(0);
    let (button, modifiers, motion) = decode_button(cb);
    let button = if final_byte == b'm' {
        MouseButton::Release
    } else {
        button
    };
    InputEvent::Mouse(MouseEvent {
        x: params.get(1).copied().unwrap_or(0),
        y: params.get(2).copied().unwrap_or(0),
        button,
        modifiers,
        motion: motion && final_byte != b'm',
    })
}

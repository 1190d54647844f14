//! Logical key identities and modifier masks.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL  = 1;
        const SHIFT = 2;
        const ALT   = 4;
        const META  = 8;
    }
}

/// Normalized key identity. Printable input is `Char`; reports the parser
/// cannot classify surface as `Unknown` with the final byte preserved, so
/// callers can log rather than lose them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// Function keys F1..=F63.
    F(u8),
    Unknown(char),
}

/// A fully-decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    /// The raw character for printable input; `None` for named keys and
    /// control chords.
    pub ch: Option<char>,
}

impl KeyEvent {
    pub fn new(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: Modifiers::empty(),
            ch: None,
        }
    }

    pub fn with_modifiers(code: KeyCode, modifiers: Modifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            ch: None,
        }
    }

    pub fn printable(ch: char) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char(ch),
            modifiers: Modifiers::empty(),
            ch: Some(ch),
        }
    }
}

/// Decode an xterm `modifyOtherKeys` parameter: the wire value is the
/// modifier bitmask plus one (Shift=1, Alt=2, Ctrl=4, Meta=8).
pub(crate) fn decode_modifier_param(param: i32) -> Modifiers {
    let bits = (param - 1).max(0) as u8;
    let mut modifiers = Modifiers::empty();
    if bits & 1 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if bits & 2 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if bits & 4 != 0 {
        modifiers |= Modifiers::CTRL;
    }
    if bits & 8 != 0 {
        modifiers |= Modifiers::META;
    }
    modifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_param_decoding() {
        assert_eq!(decode_modifier_param(1), Modifiers::empty());
        assert_eq!(decode_modifier_param(2), Modifiers::SHIFT);
        assert_eq!(decode_modifier_param(3), Modifiers::ALT);
        assert_eq!(decode_modifier_param(4), Modifiers::SHIFT | Modifiers::ALT);
        assert_eq!(decode_modifier_param(5), Modifiers::CTRL);
        assert_eq!(decode_modifier_param(9), Modifiers::META);
        assert_eq!(decode_modifier_param(0), Modifiers::empty());
    }
}

//! Mouse report payloads.

use crate::key::Modifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Release,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    /// 1-based column, as reported on the wire.
    pub x: i32,
    /// 1-based row.
    pub y: i32,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    /// Whether this report is drag/movement rather than a press.
    pub motion: bool,
}

/// Decode the shared button/modifier byte of SGR and X10 reports. The low
/// two bits select the button (wheel direction when the wheel bit is set),
/// bits 2..4 carry Shift/Alt/Ctrl, bit 5 flags motion, bit 6 the wheel.
pub(crate) fn decode_button(cb: i32) -> (MouseButton, Modifiers, bool) {
    let mut modifiers = Modifiers::empty();
    if cb & 4 != 0 {
        modifiers |= Modifiers::SHIFT;
    }
    if cb & 8 != 0 {
        modifiers |= Modifiers::ALT;
    }
    if cb & 16 != 0 {
        modifiers |= Modifiers::CTRL;
    }
    let motion = cb & 32 != 0;
    let button = if cb & 64 != 0 {
        match cb & 0b11 {
            0 => MouseButton::WheelUp,
            1 => MouseButton::WheelDown,
            2 => MouseButton::WheelLeft,
            _ => MouseButton::WheelRight,
        }
    } else {
        match cb & 0b11 {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Release,
        }
    };
    (button, modifiers, motion)
}

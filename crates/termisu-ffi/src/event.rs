//! Flat C representations of engine events.

use termisu::{Event, KeyCode, TerminalMode};

pub const TS_EVENT_KEY: u8 = 0;
pub const TS_EVENT_MOUSE: u8 = 1;
pub const TS_EVENT_RESIZE: u8 = 2;
pub const TS_EVENT_TICK: u8 = 3;
pub const TS_EVENT_MODE_CHANGE: u8 = 4;
pub const TS_EVENT_FOCUS_GAINED: u8 = 5;
pub const TS_EVENT_FOCUS_LOST: u8 = 6;

// Key code encoding: named keys are small constants, function keys are
// 100 + N, and TS_KEY_CHAR carries the scalar in `key_char`.
pub const TS_KEY_CHAR: u32 = 0;
pub const TS_KEY_ENTER: u32 = 1;
pub const TS_KEY_ESCAPE: u32 = 2;
pub const TS_KEY_BACKSPACE: u32 = 3;
pub const TS_KEY_TAB: u32 = 4;
pub const TS_KEY_UP: u32 = 5;
pub const TS_KEY_DOWN: u32 = 6;
pub const TS_KEY_LEFT: u32 = 7;
pub const TS_KEY_RIGHT: u32 = 8;
pub const TS_KEY_HOME: u32 = 9;
pub const TS_KEY_END: u32 = 10;
pub const TS_KEY_PAGE_UP: u32 = 11;
pub const TS_KEY_PAGE_DOWN: u32 = 12;
pub const TS_KEY_INSERT: u32 = 13;
pub const TS_KEY_DELETE: u32 = 14;
pub const TS_KEY_UNKNOWN: u32 = 15;
pub const TS_KEY_F_BASE: u32 = 100;

/// One event, flattened. `kind` selects which field group is meaningful;
/// unused fields are zeroed. Optional old dimensions use -1 for "absent".
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TsEvent {
    pub kind: u8,
    // Key
    pub key_code: u32,
    pub key_char: u32,
    pub modifiers: u8,
    // Mouse
    pub mouse_x: i32,
    pub mouse_y: i32,
    pub mouse_button: u8,
    pub mouse_motion: u8,
    // Resize
    pub width: i32,
    pub height: i32,
    pub old_width: i32,
    pub old_height: i32,
    // Tick
    pub elapsed_ms: u64,
    pub delta_ms: u64,
    pub frame: u64,
    // Mode change; `previous_mode` is -1 when unset.
    pub mode: u8,
    pub previous_mode: i8,
}

pub(crate) fn mode_to_c(mode: TerminalMode) -> u8 {
    match mode {
        TerminalMode::Raw => 0,
        TerminalMode::Cooked => 1,
        TerminalMode::Cbreak => 2,
        TerminalMode::Password => 3,
        TerminalMode::SemiRaw => 4,
    }
}

pub(crate) fn mode_from_c(mode: i32) -> Option<TerminalMode> {
    match mode {
        0 => Some(TerminalMode::Raw),
        1 => Some(TerminalMode::Cooked),
        2 => Some(TerminalMode::Cbreak),
        3 => Some(TerminalMode::Password),
        4 => Some(TerminalMode::SemiRaw),
        _ => None,
    }
}

fn key_code_to_c(code: KeyCode) -> (u32, u32) {
    match code {
        KeyCode::Char(c) => (TS_KEY_CHAR, c as u32),
        KeyCode::Enter => (TS_KEY_ENTER, 0),
        KeyCode::Escape => (TS_KEY_ESCAPE, 0),
        KeyCode::Backspace => (TS_KEY_BACKSPACE, 0),
        KeyCode::Tab => (TS_KEY_TAB, 0),
        KeyCode::Up => (TS_KEY_UP, 0),
        KeyCode::Down => (TS_KEY_DOWN, 0),
        KeyCode::Left => (TS_KEY_LEFT, 0),
        KeyCode::Right => (TS_KEY_RIGHT, 0),
        KeyCode::Home => (TS_KEY_HOME, 0),
        KeyCode::End => (TS_KEY_END, 0),
        KeyCode::PageUp => (TS_KEY_PAGE_UP, 0),
        KeyCode::PageDown => (TS_KEY_PAGE_DOWN, 0),
        KeyCode::Insert => (TS_KEY_INSERT, 0),
        KeyCode::Delete => (TS_KEY_DELETE, 0),
        KeyCode::F(n) => (TS_KEY_F_BASE + n as u32, 0),
        KeyCode::Unknown(c) => (TS_KEY_UNKNOWN, c as u32),
    }
}

fn button_to_c(button: termisu::MouseButton) -> u8 {
    use termisu::MouseButton::*;
    match button {
        Left => 0,
        Middle => 1,
        Right => 2,
        Release => 3,
        WheelUp => 4,
        WheelDown => 5,
        WheelLeft => 6,
        WheelRight => 7,
    }
}

pub(crate) fn flatten(event: Event) -> TsEvent {
    let mut out = TsEvent {
        old_width: -1,
        old_height: -1,
        previous_mode: -1,
        ..TsEvent::default()
    };
    match event {
        Event::Key(key) => {
            out.kind = TS_EVENT_KEY;
            let (code, ch) = key_code_to_c(key.code);
            out.key_code = code;
            out.key_char = key.ch.map(|c| c as u32).unwrap_or(ch);
            out.modifiers = key.modifiers.bits();
        }
        Event::Mouse(mouse) => {
            out.kind = TS_EVENT_MOUSE;
            out.mouse_x = mouse.x;
            out.mouse_y = mouse.y;
            out.mouse_button = button_to_c(mouse.button);
            out.mouse_motion = mouse.motion as u8;
            out.modifiers = mouse.modifiers.bits();
        }
        Event::Resize(resize) => {
            out.kind = TS_EVENT_RESIZE;
            out.width = resize.width;
            out.height = resize.height;
            out.old_width = resize.old_width.unwrap_or(-1);
            out.old_height = resize.old_height.unwrap_or(-1);
        }
        Event::Tick(tick) => {
            out.kind = TS_EVENT_TICK;
            out.elapsed_ms = tick.elapsed.as_millis() as u64;
            out.delta_ms = tick.delta.as_millis() as u64;
            out.frame = tick.frame;
        }
        Event::ModeChange(change) => {
            out.kind = TS_EVENT_MODE_CHANGE;
            out.mode = mode_to_c(change.mode);
            out.previous_mode = change
                .previous_mode
                .map(|m| mode_to_c(m) as i8)
                .unwrap_or(-1);
        }
        Event::FocusGained => out.kind = TS_EVENT_FOCUS_GAINED,
        Event::FocusLost => out.kind = TS_EVENT_FOCUS_LOST,
    }
    out
}

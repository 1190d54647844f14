//! C ABI over the engine: opaque u64 handles, flat structs, status codes,
//! and a thread-local last-error string.
//!
//! Every entry point is a thin wrapper over one `Terminal` (or event loop)
//! operation. Failures set the calling thread's last-error text and return a
//! status; nothing unwinds across the boundary. Handles stay valid until
//! `termisu_shutdown`.

mod event;

pub use event::*;

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use termisu::{Attribute, Color, EventLoop, Terminal, TerminalError};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsStatus {
    Ok = 0,
    Error = 1,
    InvalidHandle = 2,
    InvalidArgument = 3,
    /// The operation was refused by contract (out-of-bounds cell, control
    /// character, wide write at the last column); not an error.
    Rejected = 4,
    Timeout = 5,
}

/// Flat color: `kind` 0 = ANSI-8 (`index`), 1 = ANSI-256 (`index`),
/// 2 = RGB (`r`,`g`,`b`). Index -1 is the terminal default.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TsColor {
    pub kind: u8,
    pub index: i16,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

struct Session {
    terminal: Terminal,
    events: Option<EventLoop>,
}

struct Registry {
    sessions: HashMap<u64, Session>,
    next_handle: u64,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        Mutex::new(Registry {
            sessions: HashMap::new(),
            next_handle: 1,
        })
    })
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: String) {
    // NUL bytes cannot appear in a C string; strip them rather than fail.
    let sanitized: Vec<u8> = message.into_bytes().into_iter().filter(|&b| b != 0).collect();
    if let Ok(cstring) = CString::new(sanitized) {
        LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(cstring));
    }
}

fn fail(err: TerminalError) -> TsStatus {
    set_last_error(err.to_string());
    TsStatus::Error
}

/// Run `f` against the session for `handle`.
fn with_session<F>(handle: u64, f: F) -> TsStatus
where
    F: FnOnce(&mut Session) -> TsStatus,
{
    let mut registry = match registry().lock() {
        Ok(registry) => registry,
        Err(_) => {
            set_last_error("registry poisoned".to_string());
            return TsStatus::Error;
        }
    };
    match registry.sessions.get_mut(&handle) {
        Some(session) => f(session),
        None => {
            set_last_error(format!("invalid handle {handle}"));
            TsStatus::InvalidHandle
        }
    }
}

fn color_from_c(color: TsColor) -> Option<Color> {
    match color.kind {
        0 => Color::ansi8(color.index).ok(),
        1 => Color::ansi256(color.index as i32).ok(),
        2 => Some(Color::Rgb(color.r, color.g, color.b)),
        _ => None,
    }
}

/// Create a terminal over `/dev/tty` and `$TERM`, writing the handle to
/// `out_handle`.
///
/// # Safety
/// `out_handle` must point to writable memory for one u64.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn termisu_init(out_handle: *mut u64) -> TsStatus {
    if out_handle.is_null() {
        set_last_error("out_handle is null".to_string());
        return TsStatus::InvalidArgument;
    }
    let terminal = match Terminal::new() {
        Ok(terminal) => terminal,
        Err(err) => return fail(err),
    };
    let mut registry = match registry().lock() {
        Ok(registry) => registry,
        Err(_) => {
            set_last_error("registry poisoned".to_string());
            return TsStatus::Error;
        }
    };
    let handle = registry.next_handle;
    registry.next_handle += 1;
    registry.sessions.insert(
        handle,
        Session {
            terminal,
            events: None,
        },
    );
    unsafe { *out_handle = handle };
    TsStatus::Ok
}

/// Close the terminal, stop its event loop, and invalidate the handle.
#[unsafe(no_mangle)]
pub extern "C" fn termisu_shutdown(handle: u64) -> TsStatus {
    let mut registry = match registry().lock() {
        Ok(registry) => registry,
        Err(_) => return TsStatus::Error,
    };
    match registry.sessions.remove(&handle) {
        Some(mut session) => {
            if let Some(mut events) = session.events.take() {
                events.stop();
            }
            session.terminal.close();
            TsStatus::Ok
        }
        None => TsStatus::InvalidHandle,
    }
}

/// Write one grapheme cluster. Returns `Rejected` (not `Error`) when the
/// buffer refuses the write.
///
/// # Safety
/// `grapheme` must be a valid NUL-terminated UTF-8 string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn termisu_set_cell(
    handle: u64,
    x: i32,
    y: i32,
    grapheme: *const c_char,
    fg: TsColor,
    bg: TsColor,
    attr: u8,
) -> TsStatus {
    if grapheme.is_null() {
        set_last_error("grapheme is null".to_string());
        return TsStatus::InvalidArgument;
    }
    let text = match unsafe { CStr::from_ptr(grapheme) }.to_str() {
        Ok(text) => text,
        Err(_) => {
            set_last_error("grapheme is not valid UTF-8".to_string());
            return TsStatus::InvalidArgument;
        }
    };
    let (Some(fg), Some(bg)) = (color_from_c(fg), color_from_c(bg)) else {
        set_last_error("color out of range".to_string());
        return TsStatus::InvalidArgument;
    };
    let attr = Attribute::from_bits_truncate(attr);
    with_session(handle, |session| {
        if session.terminal.set_cell(x, y, text, fg, bg, attr) {
            TsStatus::Ok
        } else {
            TsStatus::Rejected
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_render(handle: u64) -> TsStatus {
    with_session(handle, |session| match session.terminal.render() {
        Ok(()) => TsStatus::Ok,
        Err(err) => fail(err),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_sync(handle: u64) -> TsStatus {
    with_session(handle, |session| match session.terminal.sync() {
        Ok(()) => TsStatus::Ok,
        Err(err) => fail(err),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_clear(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        session.terminal.clear_cells();
        TsStatus::Ok
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_set_cursor(handle: u64, x: i32, y: i32) -> TsStatus {
    with_session(handle, |session| {
        session.terminal.set_cursor(x, y);
        TsStatus::Ok
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_hide_cursor(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        session.terminal.hide_cursor();
        TsStatus::Ok
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_show_cursor(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        session.terminal.show_cursor();
        TsStatus::Ok
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_resize(handle: u64, width: i32, height: i32) -> TsStatus {
    if width < 0 || height < 0 {
        set_last_error("negative dimensions".to_string());
        return TsStatus::InvalidArgument;
    }
    with_session(handle, |session| {
        session.terminal.resize_buffer(width, height);
        TsStatus::Ok
    })
}

/// # Safety
/// `out_width` and `out_height` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn termisu_size(
    handle: u64,
    out_width: *mut i32,
    out_height: *mut i32,
) -> TsStatus {
    if out_width.is_null() || out_height.is_null() {
        return TsStatus::InvalidArgument;
    }
    with_session(handle, |session| match session.terminal.size() {
        Ok((width, height)) => {
            unsafe {
                *out_width = width;
                *out_height = height;
            }
            TsStatus::Ok
        }
        Err(err) => fail(err),
    })
}

/// `mode`: 0 raw, 1 cooked, 2 cbreak, 3 password, 4 semi-raw.
#[unsafe(no_mangle)]
pub extern "C" fn termisu_set_mode(handle: u64, mode: i32) -> TsStatus {
    let Some(mode) = event::mode_from_c(mode) else {
        set_last_error(format!("invalid mode {mode}"));
        return TsStatus::InvalidArgument;
    };
    with_session(handle, |session| match session.terminal.set_mode(mode) {
        Ok(()) => TsStatus::Ok,
        Err(err) => fail(err),
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_enter_alt_screen(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        match session.terminal.enter_alternate_screen() {
            Ok(()) => TsStatus::Ok,
            Err(err) => fail(err),
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_exit_alt_screen(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        match session.terminal.exit_alternate_screen() {
            Ok(()) => TsStatus::Ok,
            Err(err) => fail(err),
        }
    })
}

/// Spin up the event loop with input and resize sources, plus mode-change
/// publishing from the terminal. Idempotent.
#[unsafe(no_mangle)]
pub extern "C" fn termisu_start_events(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        if session.events.is_some() {
            return TsStatus::Ok;
        }
        let mut events = EventLoop::new();
        if let Some(input) = session.terminal.input_source() {
            events.add_source(Box::new(input));
        }
        if let Some(resize) = session.terminal.resize_source() {
            events.add_source(Box::new(resize));
        }
        if let Some(sink) = events.sink() {
            session.terminal.set_event_sink(sink);
        }
        events.start();
        session.events = Some(events);
        TsStatus::Ok
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_stop_events(handle: u64) -> TsStatus {
    with_session(handle, |session| {
        if let Some(mut events) = session.events.take() {
            events.stop();
        }
        TsStatus::Ok
    })
}

/// Drain one event, waiting up to `timeout_ms`. `Timeout` when nothing
/// arrived; `InvalidArgument` for a negative timeout.
///
/// # Safety
/// `out_event` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn termisu_poll_event(
    handle: u64,
    timeout_ms: i64,
    out_event: *mut TsEvent,
) -> TsStatus {
    if out_event.is_null() {
        return TsStatus::InvalidArgument;
    }
    if timeout_ms < 0 {
        set_last_error("negative timeout".to_string());
        return TsStatus::InvalidArgument;
    }
    with_session(handle, |session| {
        let Some(events) = &session.events else {
            set_last_error("event loop not started".to_string());
            return TsStatus::Error;
        };
        match events.next_event(Duration::from_millis(timeout_ms as u64)) {
            Some(event) => {
                unsafe { *out_event = event::flatten(event) };
                TsStatus::Ok
            }
            None => TsStatus::Timeout,
        }
    })
}

/// Copy the thread's last error message into `buf` (NUL-terminated,
/// truncated to `len`). Returns the full message length in bytes, or 0 when
/// no error is recorded.
///
/// # Safety
/// `buf` must be writable for `len` bytes (or null to query the length).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn termisu_last_error(buf: *mut c_char, len: usize) -> usize {
    LAST_ERROR.with(|slot| {
        let slot = slot.borrow();
        let Some(message) = slot.as_ref() else {
            return 0;
        };
        let bytes = message.as_bytes_with_nul();
        if !buf.is_null() && len > 0 {
            let n = bytes.len().min(len);
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr().cast(), buf, n);
                // Guarantee termination even when truncating.
                *buf.add(n - 1) = 0;
            }
        }
        bytes.len() - 1
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn termisu_clear_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_is_reported() {
        assert_eq!(termisu_render(999_999), TsStatus::InvalidHandle);
        let mut buf = [0 as c_char; 64];
        let n = unsafe { termisu_last_error(buf.as_mut_ptr(), buf.len()) };
        assert!(n > 0, "last error recorded");
        termisu_clear_error();
        let n = unsafe { termisu_last_error(buf.as_mut_ptr(), buf.len()) };
        assert_eq!(n, 0, "cleared");
    }

    #[test]
    fn null_arguments_are_invalid() {
        assert_eq!(
            unsafe { termisu_init(std::ptr::null_mut()) },
            TsStatus::InvalidArgument
        );
        assert_eq!(
            unsafe { termisu_poll_event(1, 10, std::ptr::null_mut()) },
            TsStatus::InvalidArgument
        );
    }

    #[test]
    fn negative_timeout_is_invalid() {
        let mut event = TsEvent::default();
        assert_eq!(
            unsafe { termisu_poll_event(1, -5, &mut event) },
            TsStatus::InvalidArgument
        );
    }

    #[test]
    fn color_conversion_validates() {
        let bad = TsColor {
            kind: 0,
            index: 9,
            r: 0,
            g: 0,
            b: 0,
        };
        assert!(color_from_c(bad).is_none());
        let ok = TsColor {
            kind: 2,
            index: 0,
            r: 1,
            g: 2,
            b: 3,
        };
        assert_eq!(color_from_c(ok), Some(Color::Rgb(1, 2, 3)));
    }
}

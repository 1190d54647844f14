//! The terminal facade: buffer + terminfo + backend under one handle.

use crate::backend::{Backend, TtyBackend};
use crate::writer::TermWriter;
use core_cell::{Buffer, Cell, CellRenderer};
use core_events::{Event, EventSink, InputSource, ModeChangeEvent, ResizeSource};
use core_io::TerminalMode;
use core_style::{Attribute, Color};
use core_terminfo::{Terminfo, TerminfoError};
use thiserror::Error;

/// Synchronized-update brackets (DEC private mode 2026): the terminal defers
/// painting between these, eliminating tearing on partial writes.
const BEGIN_SYNC_UPDATE: &str = "\x1b[?2026h";
const END_SYNC_UPDATE: &str = "\x1b[?2026l";

const ENABLE_BRACKETED_PASTE: &str = "\x1b[?2004h";
const DISABLE_BRACKETED_PASTE: &str = "\x1b[?2004l";
const ENABLE_FOCUS_TRACKING: &str = "\x1b[?1004h";
const DISABLE_FOCUS_TRACKING: &str = "\x1b[?1004l";

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error(transparent)]
    Io(#[from] core_io::IoError),
    #[error(transparent)]
    Terminfo(#[from] TerminfoError),
    #[error("terminal write failed: {0}")]
    Write(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TerminalError>;

/// Mouse reporting granularity (DEC private modes 1000/1002/1003). SGR and
/// urxvt coordinate encodings are enabled alongside whichever granularity is
/// chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseProtocol {
    /// Button presses and releases only.
    Press,
    /// Presses plus drag motion.
    Drag,
    /// All motion.
    Motion,
}

impl MouseProtocol {
    fn mode(self) -> u16 {
        match self {
            MouseProtocol::Press => 1000,
            MouseProtocol::Drag => 1002,
            MouseProtocol::Motion => 1003,
        }
    }
}

pub struct Terminal {
    buffer: Buffer,
    writer: TermWriter,
    alt_screen: bool,
    sync_updates: bool,
    mouse: Option<MouseProtocol>,
    bracketed_paste: bool,
    focus_tracking: bool,
    event_sink: Option<EventSink>,
    closed: bool,
}

impl Terminal {
    /// Open `/dev/tty`, resolve `$TERM`, and size the buffer from the
    /// device. Nothing is written to the terminal yet; stdio is untouched if
    /// construction fails.
    pub fn new() -> Result<Terminal> {
        let backend = TtyBackend::open()?;
        let info = Terminfo::from_env()?;
        Terminal::with_backend(Box::new(backend), info)
    }

    /// Build over an arbitrary backend (tests, embedders with their own
    /// device handling).
    pub fn with_backend(backend: Box<dyn Backend>, info: Terminfo) -> Result<Terminal> {
        let (width, height) = backend.size()?;
        Ok(Terminal {
            buffer: Buffer::new(width, height),
            writer: TermWriter::new(backend, info),
            alt_screen: false,
            sync_updates: true,
            mouse: None,
            bracketed_paste: false,
            focus_tracking: false,
            event_sink: None,
            closed: false,
        })
    }

    // Geometry and buffer delegation.

    pub fn width(&self) -> i32 {
        self.buffer.width()
    }

    pub fn height(&self) -> i32 {
        self.buffer.height()
    }

    /// Current device size from the ioctl (not the buffer dimensions).
    pub fn size(&self) -> Result<(i32, i32)> {
        Ok(self.writer.backend.size()?)
    }

    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        grapheme: &str,
        fg: Color,
        bg: Color,
        attr: Attribute,
    ) -> bool {
        self.buffer.set_cell(x, y, grapheme, fg, bg, attr)
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.buffer.get_cell(x, y)
    }

    pub fn clear_cells(&mut self) {
        self.buffer.clear();
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.buffer.set_cursor(x, y);
    }

    pub fn hide_cursor(&mut self) {
        self.buffer.hide_cursor();
    }

    pub fn show_cursor(&mut self) {
        self.buffer.show_cursor();
    }

    pub fn resize_buffer(&mut self, width: i32, height: i32) {
        self.buffer.resize(width, height);
    }

    /// Poison the front buffer; the next render repaints everything.
    pub fn invalidate(&mut self) {
        self.buffer.invalidate();
    }

    // Rendering.

    /// Diff-render the buffer to the terminal. With synchronized updates on
    /// (the default), the paint is bracketed in BSU/ESU and flushed once.
    pub fn render(&mut self) -> Result<()> {
        if self.sync_updates {
            self.writer.write_seq(BEGIN_SYNC_UPDATE)?;
            self.buffer.render_to(&mut self.writer, false)?;
            self.writer.write_seq(END_SYNC_UPDATE)?;
            self.writer.flush()?;
        } else {
            self.buffer.render_to(&mut self.writer, true)?;
        }
        Ok(())
    }

    /// Full redraw regardless of the front buffer.
    pub fn sync(&mut self) -> Result<()> {
        if self.sync_updates {
            self.writer.write_seq(BEGIN_SYNC_UPDATE)?;
            self.buffer.sync_to(&mut self.writer, false)?;
            self.writer.write_seq(END_SYNC_UPDATE)?;
            self.writer.flush()?;
        } else {
            self.buffer.sync_to(&mut self.writer, true)?;
        }
        Ok(())
    }

    pub fn sync_updates(&self) -> bool {
        self.sync_updates
    }

    pub fn set_sync_updates(&mut self, on: bool) {
        self.sync_updates = on;
    }

    // Screen and mode control.

    /// Switch to the alternate screen: clear it, enable the keypad, apply
    /// the buffer's cursor visibility, and forget all cached render state.
    pub fn enter_alternate_screen(&mut self) -> Result<()> {
        if self.alt_screen {
            return Ok(());
        }
        let seq = format!(
            "{}{}{}",
            self.writer.info.enter_ca_seq(),
            self.writer.info.clear_screen_seq(),
            self.writer.info.enter_keypad_seq(),
        );
        self.writer.write_seq(&seq)?;
        let cursor_seq = if self.buffer.cursor().hidden() {
            self.writer.info.hide_cursor_seq().to_string()
        } else {
            self.writer.info.show_cursor_seq().to_string()
        };
        self.writer.write_seq(&cursor_seq)?;
        self.writer.reset_render_state();
        self.buffer.invalidate();
        self.writer.flush()?;
        self.alt_screen = true;
        tracing::debug!(target: "termisu.terminal", "entered alternate screen");
        Ok(())
    }

    /// Leave the alternate screen, restoring keypad mode and a visible
    /// cursor for the shell.
    pub fn exit_alternate_screen(&mut self) -> Result<()> {
        if !self.alt_screen {
            return Ok(());
        }
        let seq = format!(
            "{}{}{}",
            self.writer.info.exit_keypad_seq(),
            self.writer.info.exit_ca_seq(),
            self.writer.info.show_cursor_seq(),
        );
        self.writer.write_seq(&seq)?;
        self.writer.reset_render_state();
        self.writer.flush()?;
        self.alt_screen = false;
        tracing::debug!(target: "termisu.terminal", "left alternate screen");
        Ok(())
    }

    pub fn alternate_screen(&self) -> bool {
        self.alt_screen
    }

    pub fn current_mode(&self) -> Option<TerminalMode> {
        self.writer.backend.current_mode()
    }

    /// Apply a termios mode and publish the transition to the event loop
    /// when a sink is attached.
    pub fn set_mode(&mut self, mode: TerminalMode) -> Result<()> {
        let previous_mode = self.writer.backend.current_mode();
        self.writer.backend.set_mode(mode)?;
        self.publish_mode_change(mode, previous_mode);
        Ok(())
    }

    /// Run `f` under `mode`, then restore the previous mode (Raw when none
    /// was recorded), invalidate the buffer, and reset cached render state.
    /// The cleanup runs also when `f` fails. Without `preserve_screen` the
    /// alternate screen is exited around the block so the callee sees the
    /// normal screen.
    pub fn with_mode<R>(
        &mut self,
        mode: TerminalMode,
        preserve_screen: bool,
        f: impl FnOnce(&mut Terminal) -> Result<R>,
    ) -> Result<R> {
        let previous = self.current_mode();
        let was_alt = self.alt_screen;
        if !preserve_screen && was_alt {
            self.exit_alternate_screen()?;
        }
        self.set_mode(mode)?;

        let outcome = f(self);

        // Unconditional cleanup, before the block's error propagates.
        let restore_mode = previous.unwrap_or(TerminalMode::Raw);
        if let Err(err) = self.set_mode(restore_mode) {
            tracing::warn!(target: "termisu.terminal", %err, "mode restore failed");
        }
        if !preserve_screen && was_alt {
            if let Err(err) = self.enter_alternate_screen() {
                tracing::warn!(target: "termisu.terminal", %err, "alt screen re-entry failed");
            }
        }
        self.buffer.invalidate();
        self.writer.reset_render_state();

        outcome
    }

    /// Forget cached colors, attributes, and cursor position without
    /// emitting anything. Call after anything else may have written to the
    /// terminal.
    pub fn reset_render_state(&mut self) {
        self.writer.reset_render_state();
    }

    // Direct style setters, for callers writing through the terminal rather
    // than the cell buffer. Each consults the cached flags and emits only on
    // change.

    pub fn set_foreground(&mut self, color: Color) -> Result<()> {
        if self.writer.cached_fg == Some(color) {
            return Ok(());
        }
        let seq = foreground_seq(&self.writer.info, color);
        self.writer.write_seq(&seq)?;
        self.writer.cached_fg = Some(color);
        Ok(())
    }

    pub fn set_background(&mut self, color: Color) -> Result<()> {
        if self.writer.cached_bg == Some(color) {
            return Ok(());
        }
        let seq = background_seq(&self.writer.info, color);
        self.writer.write_seq(&seq)?;
        self.writer.cached_bg = Some(color);
        Ok(())
    }

    pub fn enable_bold(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::BOLD)
    }

    pub fn enable_underline(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::UNDERLINE)
    }

    pub fn enable_reverse(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::REVERSE)
    }

    pub fn enable_blink(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::BLINK)
    }

    pub fn enable_dim(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::DIM)
    }

    pub fn enable_italic(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::CURSIVE)
    }

    pub fn enable_hidden(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::HIDDEN)
    }

    pub fn enable_strikethrough(&mut self) -> Result<()> {
        self.enable_attribute(Attribute::STRIKETHROUGH)
    }

    fn enable_attribute(&mut self, attr: Attribute) -> Result<()> {
        if self.writer.cached_attr.contains(attr) {
            return Ok(());
        }
        let seq = attribute_seq(&self.writer.info, attr).to_string();
        self.writer.write_seq(&seq)?;
        self.writer.cached_attr |= attr;
        Ok(())
    }

    /// Reset the terminal's attributes and both cache layers.
    pub fn reset_attributes(&mut self) -> Result<()> {
        let seq = self.writer.info.reset_attrs_seq().to_string();
        self.writer.write_seq(&seq)?;
        self.writer.cached_attr = Attribute::empty();
        self.writer.cached_fg = None;
        self.writer.cached_bg = None;
        self.writer.state.reset();
        Ok(())
    }

    // Input-affecting terminal toggles.

    pub fn enable_mouse(&mut self, protocol: MouseProtocol) -> Result<()> {
        let seq = format!("\x1b[?{}h\x1b[?1006h\x1b[?1015h", protocol.mode());
        self.writer.write_seq(&seq)?;
        self.writer.flush()?;
        self.mouse = Some(protocol);
        Ok(())
    }

    pub fn disable_mouse(&mut self) -> Result<()> {
        if let Some(protocol) = self.mouse.take() {
            let seq = format!("\x1b[?1015l\x1b[?1006l\x1b[?{}l", protocol.mode());
            self.writer.write_seq(&seq)?;
            self.writer.flush()?;
        }
        Ok(())
    }

    pub fn enable_bracketed_paste(&mut self) -> Result<()> {
        self.writer.write_seq(ENABLE_BRACKETED_PASTE)?;
        self.bracketed_paste = true;
        Ok(())
    }

    pub fn disable_bracketed_paste(&mut self) -> Result<()> {
        if self.bracketed_paste {
            self.writer.write_seq(DISABLE_BRACKETED_PASTE)?;
            self.bracketed_paste = false;
        }
        Ok(())
    }

    pub fn enable_focus_tracking(&mut self) -> Result<()> {
        self.writer.write_seq(ENABLE_FOCUS_TRACKING)?;
        self.focus_tracking = true;
        Ok(())
    }

    pub fn disable_focus_tracking(&mut self) -> Result<()> {
        if self.focus_tracking {
            self.writer.write_seq(DISABLE_FOCUS_TRACKING)?;
            self.focus_tracking = false;
        }
        Ok(())
    }

    // Event-loop integration.

    /// Attach the loop's producer handle; subsequent mode transitions are
    /// published as `ModeChange` events.
    pub fn set_event_sink(&mut self, sink: EventSink) {
        self.event_sink = Some(sink);
    }

    /// An input source reading from this terminal's descriptor.
    pub fn input_source(&self) -> Option<InputSource> {
        self.writer.backend.read_fd().map(InputSource::new)
    }

    /// A resize source watching this terminal's descriptor.
    pub fn resize_source(&self) -> Option<ResizeSource> {
        self.writer.backend.read_fd().map(ResizeSource::new)
    }

    fn publish_mode_change(&mut self, mode: TerminalMode, previous_mode: Option<TerminalMode>) {
        let Some(sink) = &self.event_sink else {
            return;
        };
        let event = Event::ModeChange(ModeChangeEvent {
            mode,
            previous_mode,
        });
        if let Err(err) = sink.try_send(event) {
            tracing::trace!(target: "termisu.terminal", %err, "mode change not delivered");
        }
    }

    /// Restore the terminal for the shell: leave the alternate screen, turn
    /// off input toggles, show the cursor, restore termios, flush. Idempotent;
    /// never raises out of cleanup.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.disable_mouse();
        let _ = self.disable_bracketed_paste();
        let _ = self.disable_focus_tracking();
        if self.alt_screen {
            let _ = self.exit_alternate_screen();
        } else {
            let seq = self.writer.info.show_cursor_seq().to_string();
            let _ = self.writer.write_seq(&seq);
        }
        let _ = self.writer.flush();
        self.writer.backend.restore();
        tracing::debug!(target: "termisu.terminal", "terminal closed");
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.close();
    }
}

fn foreground_seq(info: &Terminfo, color: Color) -> String {
    if color.is_default() {
        return "\x1b[39m".to_string();
    }
    match color {
        Color::Rgb(r, g, b) => format!("\x1b[38;2;{r};{g};{b}m"),
        Color::Ansi8(n) => info.foreground_color_seq(n as i32),
        Color::Ansi256(n) => info.foreground_color_seq(n as i32),
    }
}

fn background_seq(info: &Terminfo, color: Color) -> String {
    if color.is_default() {
        return "\x1b[49m".to_string();
    }
    match color {
        Color::Rgb(r, g, b) => format!("\x1b[48;2;{r};{g};{b}m"),
        Color::Ansi8(n) => info.background_color_seq(n as i32),
        Color::Ansi256(n) => info.background_color_seq(n as i32),
    }
}

fn attribute_seq(info: &Terminfo, attr: Attribute) -> &str {
    if attr == Attribute::BOLD {
        info.bold_seq()
    } else if attr == Attribute::UNDERLINE {
        info.underline_seq()
    } else if attr == Attribute::REVERSE {
        info.reverse_seq()
    } else if attr == Attribute::BLINK {
        info.blink_seq()
    } else if attr == Attribute::DIM {
        info.dim_seq()
    } else if attr == Attribute::CURSIVE {
        info.italic_seq()
    } else if attr == Attribute::HIDDEN {
        info.hidden_seq()
    } else if attr == Attribute::STRIKETHROUGH {
        info.strikethrough_seq()
    } else {
        ""
    }
}

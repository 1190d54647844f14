//! Termisu: a terminal UI engine.
//!
//! The engine turns a POSIX terminal into a cell-addressable display surface
//! with a unified event stream. [`Terminal`] composes the double-buffered
//! cell grid, terminfo-resolved capability emission, and termios mode
//! control; [`EventLoop`] multiplexes keyboard, mouse, resize, timer, and
//! mode-change events from per-source threads onto one bounded channel.
//!
//! ```no_run
//! use termisu::{Attribute, Color, Event, EventLoop, Terminal, TerminalMode};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut terminal = Terminal::new()?;
//!     terminal.set_mode(TerminalMode::Raw)?;
//!     terminal.enter_alternate_screen()?;
//!
//!     let mut events = EventLoop::new();
//!     if let Some(input) = terminal.input_source() {
//!         events.add_source(Box::new(input));
//!     }
//!     if let Some(resize) = terminal.resize_source() {
//!         events.add_source(Box::new(resize));
//!     }
//!     events.start();
//!
//!     terminal.set_cell(0, 0, "h", Color::DEFAULT, Color::DEFAULT, Attribute::BOLD);
//!     terminal.render()?;
//!
//!     while let Ok(event) = events.events().recv() {
//!         match event {
//!             Event::Key(_) => break,
//!             Event::Resize(resize) => {
//!                 terminal.resize_buffer(resize.width, resize.height);
//!                 terminal.render()?;
//!             }
//!             _ => {}
//!         }
//!     }
//!
//!     events.stop();
//!     terminal.close();
//!     Ok(())
//! }
//! ```

mod backend;
mod render_state;
mod terminal;
mod writer;

pub use backend::{Backend, TestBackend, TtyBackend};
pub use render_state::RenderState;
pub use terminal::{MouseProtocol, Result, Terminal, TerminalError};

// The subsystem crates, re-exported so embedders depend on one name.
pub use core_cell::{Buffer, Cell, CellRenderer, Cursor};
pub use core_events::{
    CustomSource, Event, EventLoop, EventSink, InputSource, ModeChangeEvent, ResizeEvent,
    ResizeSource, Source, SystemTimerSource, TickEvent, TimerSource, EVENT_CHANNEL_CAP,
};
pub use core_input::{InputEvent, InputParser, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent};
pub use core_io::{
    new_poller, IoError, PollEvents, PollResult, Poller, Reader, TerminalMode, TimerHandle,
};
pub use core_style::{ArgumentError, Attribute, Color};
pub use core_terminfo::{tparm, ParseError, Terminfo, TerminfoError};
pub use core_unicode::{codepoint_width, grapheme_width, string_width};

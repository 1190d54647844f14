//! Event sources and the multiplexing loop.
//!
//! Each source owns one background thread and pushes value-type events into
//! the loop's bounded channel; the application drains the receiver. Within a
//! source, delivery order matches production order; across sources the
//! channel reflects the race between producers. Cancellation is cooperative:
//! atomic running flags plus channel closure.

mod custom;
mod event;
mod event_loop;
mod input;
mod resize;
mod source;
mod system_timer;
mod timer;

pub use custom::CustomSource;
pub use event::{Event, ModeChangeEvent, ResizeEvent, TickEvent};
pub use event_loop::{EventLoop, EVENT_CHANNEL_CAP};
pub use input::InputSource;
pub use resize::{ResizeSource, RESIZE_POLL_INTERVAL};
pub use source::{EventSink, Source};
pub use system_timer::SystemTimerSource;
pub use timer::TimerSource;

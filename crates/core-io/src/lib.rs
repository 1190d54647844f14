//! POSIX plumbing for the engine: errno-carrying errors, EINTR-retried
//! syscalls, the ring-buffered input reader, termios mode control, the
//! `/dev/tty` handle, and the platform pollers.

mod error;
mod mode;
pub mod poll;
mod reader;
mod syscall;
mod tty;

pub use error::{IoError, Result};
pub use mode::{ModeControl, TerminalMode};
pub use poll::{new_poller, PollEvents, PollResult, Poller, TimerHandle};
pub use reader::{Reader, RING_SIZE};
pub use syscall::MAX_EINTR_RETRIES;
pub use tty::{window_size, Tty};

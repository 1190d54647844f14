//! Platform-abstract timers and fd readiness.
//!
//! Three implementations share one trait: epoll + timerfd on Linux, kqueue
//! with EVFILT_TIMER on the BSD family, and a portable `poll(2)` loop with
//! software timers that compiles everywhere and is the default elsewhere.
//! All of them tolerate re-registering an fd that is already known, and all
//! report missed timer expirations as a count so a stalled consumer can
//! coalesce.

use crate::error::Result;
use bitflags::bitflags;
use std::os::unix::io::RawFd;
use std::time::Duration;

#[cfg(target_os = "linux")]
mod epoll;
mod fallback;
#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
mod kqueue;

#[cfg(target_os = "linux")]
pub use epoll::EpollPoller;
pub use fallback::PollFallback;
#[cfg(any(
    target_os = "macos",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "dragonfly"
))]
pub use kqueue::KqueuePoller;

bitflags! {
    /// Readiness classes an fd can be registered for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PollEvents: u8 {
        const READ  = 1;
        const WRITE = 2;
        const ERROR = 4;
    }
}

/// Opaque identifier for a registered timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// A timer fired; `expirations` counts ticks since the last report.
    Timer {
        handle: TimerHandle,
        expirations: u64,
    },
    FdReadable { fd: RawFd },
    FdWritable { fd: RawFd },
    FdError { fd: RawFd },
    /// Readiness on a descriptor registered as a signal pipe.
    Signal { fd: RawFd },
}

pub trait Poller: Send {
    /// Arm a timer. Non-repeating timers fire once and disarm themselves.
    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle>;

    fn cancel_timer(&mut self, handle: TimerHandle) -> Result<()>;

    /// Watch an fd. Registering an already-known fd replaces its event mask.
    fn register_fd(&mut self, fd: RawFd, events: PollEvents) -> Result<()>;

    fn unregister_fd(&mut self, fd: RawFd) -> Result<()>;

    /// Block until something is ready or `timeout` elapses (`None` blocks
    /// indefinitely). Returns `Ok(None)` on timeout. The user timeout is
    /// honored even when armed timers have longer intervals.
    fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<PollResult>>;

    /// Release kernel resources. Idempotent; further calls are no-ops.
    fn close(&mut self);
}

/// The best poller for the running platform.
pub fn new_poller() -> Result<Box<dyn Poller>> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(EpollPoller::new()?))
    }
    #[cfg(any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    {
        Ok(Box::new(KqueuePoller::new()?))
    }
    #[cfg(not(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    )))]
    {
        Ok(Box::new(PollFallback::new()))
    }
}

/// Millisecond form of an optional timeout for `poll`-style calls;
/// `None` maps to -1 (block forever).
#[allow(dead_code)]
pub(crate) fn timeout_ms(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        Some(d) => d.as_millis().min(i32::MAX as u128) as i32,
    }
}

//! Portable poller: `poll(2)` plus software timers.
//!
//! Each `wait` records its own deadline up front. Every loop iteration polls
//! with the smaller of the caller's remaining time and the nearest timer
//! deadline, and re-checks the caller's deadline after the poll returns, so
//! a short user timeout is honored even when every armed timer has a long
//! interval. Timer lateness is reported as an expiration count and the
//! schedule advances by whole intervals, so a stalled consumer catches up in
//! one result instead of a burst.

use super::{PollEvents, PollResult, Poller, TimerHandle};
use crate::error::Result;
use crate::syscall;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

struct SoftTimer {
    id: u64,
    interval: Duration,
    next_fire: Instant,
    repeating: bool,
}

pub struct PollFallback {
    fds: Vec<(RawFd, PollEvents)>,
    timers: Vec<SoftTimer>,
    next_timer: u64,
    closed: bool,
}

impl PollFallback {
    pub fn new() -> PollFallback {
        PollFallback {
            fds: Vec::new(),
            timers: Vec::new(),
            next_timer: 1,
            closed: false,
        }
    }

    /// Pop the most overdue timer, computing how many intervals elapsed.
    fn due_timer(&mut self, now: Instant) -> Option<PollResult> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next_fire <= now)
            .min_by_key(|(_, t)| t.next_fire)
            .map(|(i, _)| i)?;

        let timer = &mut self.timers[index];
        let late = now.duration_since(timer.next_fire);
        let expirations = if timer.interval.is_zero() {
            1
        } else {
            late.as_nanos() as u64 / timer.interval.as_nanos().max(1) as u64 + 1
        };
        let handle = TimerHandle(timer.id);
        if timer.repeating {
            timer.next_fire += timer.interval * expirations as u32;
        } else {
            self.timers.remove(index);
        }
        Some(PollResult::Timer {
            handle,
            expirations,
        })
    }

    fn next_timer_delay(&self, now: Instant) -> Option<Duration> {
        self.timers
            .iter()
            .map(|t| t.next_fire.saturating_duration_since(now))
            .min()
    }
}

impl Default for PollFallback {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller for PollFallback {
    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle> {
        let id = self.next_timer;
        self.next_timer += 1;
        self.timers.push(SoftTimer {
            id,
            interval,
            next_fire: Instant::now() + interval,
            repeating,
        });
        Ok(TimerHandle(id))
    }

    fn cancel_timer(&mut self, handle: TimerHandle) -> Result<()> {
        self.timers.retain(|t| t.id != handle.0);
        Ok(())
    }

    fn register_fd(&mut self, fd: RawFd, events: PollEvents) -> Result<()> {
        if let Some(entry) = self.fds.iter_mut().find(|(known, _)| *known == fd) {
            entry.1 = events;
        } else {
            self.fds.push((fd, events));
        }
        Ok(())
    }

    fn unregister_fd(&mut self, fd: RawFd) -> Result<()> {
        self.fds.retain(|(known, _)| *known != fd);
        Ok(())
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<PollResult>> {
        let deadline = timeout.map(|d| Instant::now() + d);

        loop {
            let now = Instant::now();
            if let Some(result) = self.due_timer(now) {
                return Ok(Some(result));
            }

            let user_remaining = deadline.map(|d| d.saturating_duration_since(now));
            let effective = match (user_remaining, self.next_timer_delay(now)) {
                (Some(user), Some(timer)) => Some(user.min(timer)),
                (Some(user), None) => Some(user),
                (None, Some(timer)) => Some(timer),
                (None, None) => None,
            };
            let effective_ms = match effective {
                None => -1,
                Some(d) => {
                    let ms = d.as_millis().min(i32::MAX as u128) as i32;
                    // Round sub-millisecond remainders up so the loop does
                    // not spin against the clock.
                    if ms == 0 && !d.is_zero() { 1 } else { ms }
                }
            };

            let mut pollfds: Vec<libc::pollfd> = self
                .fds
                .iter()
                .map(|(fd, events)| {
                    let mut mask: libc::c_short = 0;
                    if events.contains(PollEvents::READ) {
                        mask |= libc::POLLIN;
                    }
                    if events.contains(PollEvents::WRITE) {
                        mask |= libc::POLLOUT;
                    }
                    libc::pollfd {
                        fd: *fd,
                        events: mask,
                        revents: 0,
                    }
                })
                .collect();

            let n = syscall::retry("poll failed", || unsafe {
                libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, effective_ms)
            })?;
            if n > 0 {
                for pfd in &pollfds {
                    if pfd.revents == 0 {
                        continue;
                    }
                    if pfd.revents & (libc::POLLERR | libc::POLLHUP | libc::POLLNVAL) != 0 {
                        return Ok(Some(PollResult::FdError { fd: pfd.fd }));
                    }
                    if pfd.revents & libc::POLLOUT != 0 {
                        return Ok(Some(PollResult::FdWritable { fd: pfd.fd }));
                    }
                    if pfd.revents & libc::POLLIN != 0 {
                        return Ok(Some(PollResult::FdReadable { fd: pfd.fd }));
                    }
                }
            }

            // The caller's deadline wins over any timer cadence.
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.fds.clear();
        self.timers.clear();
    }
}

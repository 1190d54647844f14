//! BSD poller: kqueue with EVFILT_TIMER.
//!
//! Timer data is the interval in milliseconds (the filter's default unit);
//! re-adding an existing filter replaces it, which makes re-registration
//! naturally idempotent. Fd filters use EV_CLEAR so readiness reports are
//! edge-like and do not spin.

use super::{PollEvents, PollResult, Poller, TimerHandle};
use crate::error::{IoError, Result};
use crate::syscall;
use std::collections::HashSet;
use std::os::unix::io::RawFd;
use std::ptr;
use std::time::Duration;

pub struct KqueuePoller {
    kq: RawFd,
    timers: HashSet<u64>,
    next_timer: u64,
    closed: bool,
}

fn event(ident: usize, filter: i16, flags: u16, data: i64) -> libc::kevent {
    let mut ev: libc::kevent = unsafe { std::mem::zeroed() };
    ev.ident = ident as libc::uintptr_t;
    ev.filter = filter as _;
    ev.flags = flags as _;
    ev.data = data as _;
    ev
}

impl KqueuePoller {
    pub fn new() -> Result<KqueuePoller> {
        let kq = unsafe { libc::kqueue() };
        if kq < 0 {
            return Err(IoError::last("kqueue failed"));
        }
        Ok(KqueuePoller {
            kq,
            timers: HashSet::new(),
            next_timer: 1,
            closed: false,
        })
    }

    fn apply(&self, changes: &[libc::kevent]) -> Result<()> {
        syscall::retry("kevent failed", || unsafe {
            libc::kevent(
                self.kq,
                changes.as_ptr(),
                changes.len() as _,
                ptr::null_mut(),
                0,
                ptr::null(),
            )
        })?;
        Ok(())
    }
}

impl Poller for KqueuePoller {
    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle> {
        let id = self.next_timer;
        self.next_timer += 1;
        let mut flags = libc::EV_ADD | libc::EV_ENABLE;
        if !repeating {
            flags |= libc::EV_ONESHOT;
        }
        let change = event(
            id as usize,
            libc::EVFILT_TIMER,
            flags,
            interval.as_millis().max(1) as i64,
        );
        self.apply(&[change])?;
        self.timers.insert(id);
        Ok(TimerHandle(id))
    }

    fn cancel_timer(&mut self, handle: TimerHandle) -> Result<()> {
        if self.timers.remove(&handle.0) {
            let change = event(handle.0 as usize, libc::EVFILT_TIMER, libc::EV_DELETE, 0);
            let _ = self.apply(&[change]); // already-fired one-shots report ENOENT
        }
        Ok(())
    }

    fn register_fd(&mut self, fd: RawFd, events: PollEvents) -> Result<()> {
        let mut changes = Vec::with_capacity(2);
        if events.contains(PollEvents::READ) || events.contains(PollEvents::ERROR) {
            changes.push(event(
                fd as usize,
                libc::EVFILT_READ,
                libc::EV_ADD | libc::EV_ENABLE | libc::EV_CLEAR,
                0,
            ));
        }
        if events.contains(PollEvents::WRITE) {
            changes.push(event(
                fd as usize,
                libc::EVFILT_WRITE,
                libc::EV_ADD | libc::EV_ENABLE | libc::EV_CLEAR,
                0,
            ));
        }
        if changes.is_empty() {
            return Ok(());
        }
        self.apply(&changes)
    }

    fn unregister_fd(&mut self, fd: RawFd) -> Result<()> {
        // Delete both filters; a missing one is not an error.
        for filter in [libc::EVFILT_READ, libc::EVFILT_WRITE] {
            let change = event(fd as usize, filter, libc::EV_DELETE, 0);
            let _ = self.apply(&[change]);
        }
        Ok(())
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<PollResult>> {
        let ts;
        let ts_ptr = match timeout {
            Some(d) => {
                ts = libc::timespec {
                    tv_sec: d.as_secs() as libc::time_t,
                    tv_nsec: d.subsec_nanos() as libc::c_long,
                };
                &ts as *const libc::timespec
            }
            None => ptr::null(),
        };
        let mut out: libc::kevent = unsafe { std::mem::zeroed() };
        let n = syscall::retry("kevent failed", || unsafe {
            libc::kevent(self.kq, ptr::null(), 0, &mut out, 1, ts_ptr)
        })?;
        if n == 0 {
            return Ok(None);
        }

        if out.filter == libc::EVFILT_TIMER {
            let id = out.ident as u64;
            if out.flags & libc::EV_ONESHOT != 0 {
                self.timers.remove(&id);
            }
            return Ok(Some(PollResult::Timer {
                handle: TimerHandle(id),
                expirations: (out.data as u64).max(1),
            }));
        }

        let fd = out.ident as RawFd;
        if out.flags & libc::EV_ERROR != 0 {
            return Ok(Some(PollResult::FdError { fd }));
        }
        if out.filter == libc::EVFILT_WRITE {
            return Ok(Some(PollResult::FdWritable { fd }));
        }
        Ok(Some(PollResult::FdReadable { fd }))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.timers.clear();
        unsafe { libc::close(self.kq) };
    }
}

impl Drop for KqueuePoller {
    fn drop(&mut self) {
        self.close();
    }
}

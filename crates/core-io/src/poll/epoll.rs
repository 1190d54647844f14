//! Linux poller: epoll with one timerfd per timer.
//!
//! Timers are `timerfd_create(CLOCK_MONOTONIC)` descriptors armed with
//! `timerfd_settime`; the kernel accumulates expirations, and reading the
//! eight-byte counter both drains and reports them. Epoll tokens carry a
//! high-bit tag separating timer ids from plain fds.

use super::{timeout_ms, PollEvents, PollResult, Poller, TimerHandle};
use crate::error::{IoError, Result};
use crate::syscall;
use std::collections::{HashMap, HashSet};
use std::os::unix::io::RawFd;
use std::time::Duration;

const TIMER_TAG: u64 = 1 << 63;

pub struct EpollPoller {
    epfd: RawFd,
    /// timer id -> (timerfd, repeating)
    timers: HashMap<u64, (RawFd, bool)>,
    registered: HashSet<RawFd>,
    next_timer: u64,
    closed: bool,
}

impl EpollPoller {
    pub fn new() -> Result<EpollPoller> {
        let epfd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epfd < 0 {
            return Err(IoError::last("epoll_create1 failed"));
        }
        Ok(EpollPoller {
            epfd,
            timers: HashMap::new(),
            registered: HashSet::new(),
            next_timer: 1,
            closed: false,
        })
    }

    fn ctl(&self, op: libc::c_int, fd: RawFd, events: u32, token: u64) -> Result<()> {
        let mut ev = libc::epoll_event { events, u64: token };
        if unsafe { libc::epoll_ctl(self.epfd, op, fd, &mut ev) } != 0 {
            return Err(IoError::last("epoll_ctl failed"));
        }
        Ok(())
    }

    fn epoll_mask(events: PollEvents) -> u32 {
        let mut mask = 0u32;
        if events.contains(PollEvents::READ) {
            mask |= libc::EPOLLIN as u32;
        }
        if events.contains(PollEvents::WRITE) {
            mask |= libc::EPOLLOUT as u32;
        }
        // EPOLLERR is always reported; requesting it explicitly is harmless.
        if events.contains(PollEvents::ERROR) {
            mask |= libc::EPOLLERR as u32;
        }
        mask
    }

    /// Drain a timerfd's expiration counter.
    fn read_expirations(fd: RawFd) -> u64 {
        let mut buf = [0u8; 8];
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), 8) };
        if n == 8 {
            u64::from_ne_bytes(buf)
        } else {
            1
        }
    }
}

impl Poller for EpollPoller {
    fn add_timer(&mut self, interval: Duration, repeating: bool) -> Result<TimerHandle> {
        let tfd = unsafe {
            libc::timerfd_create(
                libc::CLOCK_MONOTONIC,
                libc::TFD_NONBLOCK | libc::TFD_CLOEXEC,
            )
        };
        if tfd < 0 {
            return Err(IoError::last("timerfd_create failed"));
        }

        let value = libc::timespec {
            tv_sec: interval.as_secs() as libc::time_t,
            tv_nsec: interval.subsec_nanos() as libc::c_long,
        };
        let spec = libc::itimerspec {
            it_interval: if repeating {
                value
            } else {
                libc::timespec {
                    tv_sec: 0,
                    tv_nsec: 0,
                }
            },
            it_value: value,
        };
        if unsafe { libc::timerfd_settime(tfd, 0, &spec, std::ptr::null_mut()) } != 0 {
            let err = IoError::last("timerfd_settime failed");
            unsafe { libc::close(tfd) };
            return Err(err);
        }

        let id = self.next_timer;
        self.next_timer += 1;
        self.ctl(
            libc::EPOLL_CTL_ADD,
            tfd,
            libc::EPOLLIN as u32,
            TIMER_TAG | id,
        )?;
        self.timers.insert(id, (tfd, repeating));
        Ok(TimerHandle(id))
    }

    fn cancel_timer(&mut self, handle: TimerHandle) -> Result<()> {
        if let Some((tfd, _)) = self.timers.remove(&handle.0) {
            let _ = self.ctl(libc::EPOLL_CTL_DEL, tfd, 0, 0);
            unsafe { libc::close(tfd) };
        }
        Ok(())
    }

    fn register_fd(&mut self, fd: RawFd, events: PollEvents) -> Result<()> {
        let mask = Self::epoll_mask(events);
        let op = if self.registered.contains(&fd) {
            libc::EPOLL_CTL_MOD
        } else {
            libc::EPOLL_CTL_ADD
        };
        match self.ctl(op, fd, mask, fd as u64) {
            Ok(()) => {}
            // Raced registration state: flip the operation once.
            Err(err) if err.errno == libc::EEXIST => {
                self.ctl(libc::EPOLL_CTL_MOD, fd, mask, fd as u64)?;
            }
            Err(err) if err.errno == libc::ENOENT => {
                self.ctl(libc::EPOLL_CTL_ADD, fd, mask, fd as u64)?;
            }
            Err(err) => return Err(err),
        }
        self.registered.insert(fd);
        Ok(())
    }

    fn unregister_fd(&mut self, fd: RawFd) -> Result<()> {
        if self.registered.remove(&fd) {
            let _ = self.ctl(libc::EPOLL_CTL_DEL, fd, 0, 0);
        }
        Ok(())
    }

    fn wait(&mut self, timeout: Option<Duration>) -> Result<Option<PollResult>> {
        let mut event = libc::epoll_event { events: 0, u64: 0 };
        let n = syscall::retry("epoll_wait failed", || unsafe {
            libc::epoll_wait(self.epfd, &mut event, 1, timeout_ms(timeout))
        })?;
        if n == 0 {
            return Ok(None);
        }

        let token = event.u64;
        if token & TIMER_TAG != 0 {
            let id = token & !TIMER_TAG;
            let Some(&(tfd, repeating)) = self.timers.get(&id) else {
                return Ok(None); // cancelled between wait and dispatch
            };
            let expirations = Self::read_expirations(tfd);
            if !repeating {
                self.cancel_timer(TimerHandle(id))?;
            }
            return Ok(Some(PollResult::Timer {
                handle: TimerHandle(id),
                expirations,
            }));
        }

        let fd = token as RawFd;
        let events = event.events;
        if events & (libc::EPOLLERR as u32 | libc::EPOLLHUP as u32) != 0 {
            return Ok(Some(PollResult::FdError { fd }));
        }
        if events & libc::EPOLLOUT as u32 != 0 {
            return Ok(Some(PollResult::FdWritable { fd }));
        }
        Ok(Some(PollResult::FdReadable { fd }))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for (_, (tfd, _)) in self.timers.drain() {
            unsafe { libc::close(tfd) };
        }
        unsafe { libc::close(self.epfd) };
    }
}

impl Drop for EpollPoller {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn timer_fires_with_expiration_count() {
        let mut poller = EpollPoller::new().unwrap();
        let handle = poller
            .add_timer(Duration::from_millis(10), true)
            .unwrap();
        match poller.wait(Some(Duration::from_millis(500))).unwrap() {
            Some(PollResult::Timer {
                handle: fired,
                expirations,
            }) => {
                assert_eq!(fired, handle);
                assert!(expirations >= 1);
            }
            other => panic!("expected timer, got {other:?}"),
        }
        poller.close();
    }

    #[test]
    fn missed_ticks_accumulate() {
        let mut poller = EpollPoller::new().unwrap();
        poller.add_timer(Duration::from_millis(5), true).unwrap();
        std::thread::sleep(Duration::from_millis(40));
        match poller.wait(Some(Duration::from_millis(100))).unwrap() {
            Some(PollResult::Timer { expirations, .. }) => {
                assert!(expirations >= 4, "expected coalesced ticks, got {expirations}");
            }
            other => panic!("expected timer, got {other:?}"),
        }
    }

    #[test]
    fn one_shot_timer_disarms() {
        let mut poller = EpollPoller::new().unwrap();
        poller.add_timer(Duration::from_millis(5), false).unwrap();
        assert!(matches!(
            poller.wait(Some(Duration::from_millis(200))).unwrap(),
            Some(PollResult::Timer { .. })
        ));
        assert_eq!(poller.wait(Some(Duration::from_millis(30))).unwrap(), None);
    }

    #[test]
    fn fd_readiness_and_reregistration() {
        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let [read_fd, write_fd] = fds;

        let mut poller = EpollPoller::new().unwrap();
        poller.register_fd(read_fd, PollEvents::READ).unwrap();
        // Re-registration of a known fd must not error.
        poller.register_fd(read_fd, PollEvents::READ).unwrap();

        assert_eq!(poller.wait(Some(Duration::from_millis(10))).unwrap(), None);
        assert_eq!(unsafe { libc::write(write_fd, b"!".as_ptr().cast(), 1) }, 1);
        assert_eq!(
            poller.wait(Some(Duration::from_millis(200))).unwrap(),
            Some(PollResult::FdReadable { fd: read_fd })
        );

        poller.unregister_fd(read_fd).unwrap();
        unsafe {
            libc::close(read_fd);
            libc::close(write_fd);
        }
    }

    #[test]
    fn user_timeout_beats_long_timer() {
        let mut poller = EpollPoller::new().unwrap();
        poller.add_timer(Duration::from_millis(200), true).unwrap();
        let start = Instant::now();
        let result = poller.wait(Some(Duration::from_millis(20))).unwrap();
        assert_eq!(result, None);
        assert!(
            start.elapsed() < Duration::from_millis(80),
            "20ms wait took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn close_is_idempotent() {
        let mut poller = EpollPoller::new().unwrap();
        poller.close();
        poller.close();
    }
}

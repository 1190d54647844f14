//! Resize source: SIGWINCH flag plus a polling thread.
//!
//! The signal handler performs exactly one async-signal-safe operation, an
//! atomic store registered through `signal_hook::flag`, and the polling
//! thread does everything else: it swaps the flag, queries the window size
//! with the ioctl, and emits the event. Sustained signal bursts collapse
//! into however many swaps the poller observes; nothing blocks inside the
//! handler and nothing is lost silently.

use crate::event::{Event, ResizeEvent};
use crate::source::{EventSink, Source};
use core_io::window_size;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Default flag-poll cadence.
pub const RESIZE_POLL_INTERVAL: Duration = Duration::from_millis(30);

pub struct ResizeSource {
    fd: RawFd,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    signal_id: Option<signal_hook::SigId>,
}

impl ResizeSource {
    pub fn new(fd: RawFd) -> ResizeSource {
        ResizeSource::with_poll_interval(fd, RESIZE_POLL_INTERVAL)
    }

    pub fn with_poll_interval(fd: RawFd, poll_interval: Duration) -> ResizeSource {
        ResizeSource {
            fd,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            flag: Arc::new(AtomicBool::new(false)),
            handle: None,
            signal_id: None,
        }
    }

    /// Test hook: raise the flag as a signal handler would.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Source for ResizeSource {
    fn name(&self) -> String {
        "resize".to_string()
    }

    fn start(&mut self, sink: EventSink) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        match signal_hook::flag::register(signal_hook::consts::SIGWINCH, Arc::clone(&self.flag)) {
            Ok(id) => self.signal_id = Some(id),
            Err(err) => {
                tracing::warn!(target: "termisu.events", %err, "SIGWINCH registration failed");
            }
        }

        let fd = self.fd;
        let poll_interval = self.poll_interval;
        let running = Arc::clone(&self.running);
        let flag = Arc::clone(&self.flag);
        self.handle = Some(std::thread::spawn(move || {
            let mut last: Option<(i32, i32)> = None;
            while running.load(Ordering::SeqCst) {
                if flag.swap(false, Ordering::SeqCst) {
                    match window_size(fd) {
                        Ok((width, height)) => {
                            let event = ResizeEvent {
                                width,
                                height,
                                old_width: last.map(|(w, _)| w),
                                old_height: last.map(|(_, h)| h),
                            };
                            last = Some((width, height));
                            if sink.send(Event::Resize(event)).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(target: "termisu.events", %err, "size query failed");
                        }
                    }
                }
                std::thread::sleep(poll_interval);
            }
            running.store(false, Ordering::SeqCst);
        }));
        tracing::debug!(target: "termisu.events", source = "resize", "source started");
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(id) = self.signal_id.take() {
            signal_hook::low_level::unregister(id);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for ResizeSource {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Sleep-based timer source.
//!
//! A thread waits out the interval on a private stop channel, so ticks have
//! sleep-grade precision but shutdown is immediate regardless of how long
//! the interval is. For kernel-precision ticks with missed-tick accounting,
//! use `SystemTimerSource`.

use crate::event::{Event, TickEvent};
use crate::source::{EventSink, Source};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

pub struct TimerSource {
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
}

impl TimerSource {
    pub fn new(interval: Duration) -> TimerSource {
        TimerSource {
            interval: interval.max(Duration::from_millis(1)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            stop_tx: None,
        }
    }
}

impl Source for TimerSource {
    fn name(&self) -> String {
        "timer".to_string()
    }

    fn start(&mut self, sink: EventSink) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let (stop_tx, stop_rx): (Sender<()>, Receiver<()>) = bounded(1);
        self.stop_tx = Some(stop_tx);
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        self.handle = Some(std::thread::spawn(move || {
            let start = Instant::now();
            let mut last = start;
            let mut frame = 0u64;
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break, // stop requested or source dropped
                }
                let now = Instant::now();
                frame += 1;
                let tick = TickEvent {
                    elapsed: now.duration_since(start),
                    delta: now.duration_since(last),
                    frame,
                };
                last = now;
                if sink.send(Event::Tick(tick)).is_err() {
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        }));
        tracing::debug!(
            target: "termisu.events",
            source = "timer",
            interval_ms = self.interval.as_millis() as u64,
            "source started"
        );
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_tx = None; // dropping the sender wakes the thread
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for TimerSource {
    fn drop(&mut self) {
        self.stop();
    }
}

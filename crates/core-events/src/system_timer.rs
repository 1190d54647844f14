//! Poller-backed timer source with kernel precision.
//!
//! Ticks come from the platform poller's timer facility (timerfd on Linux,
//! EVFILT_TIMER on the BSDs), which counts expirations while the consumer
//! lags; the frame counter advances by that count so missed ticks are
//! visible rather than silently collapsed.

use crate::event::{Event, TickEvent};
use crate::source::{EventSink, Source};
use core_io::new_poller;
use core_io::PollResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Wait slice so the thread re-checks its running flag promptly.
const WAIT_SLICE: Duration = Duration::from_millis(100);

pub struct SystemTimerSource {
    interval: Duration,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SystemTimerSource {
    pub fn new(interval: Duration) -> SystemTimerSource {
        SystemTimerSource {
            interval: interval.max(Duration::from_millis(1)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl Source for SystemTimerSource {
    fn name(&self) -> String {
        "system-timer".to_string()
    }

    fn start(&mut self, sink: EventSink) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        self.handle = Some(std::thread::spawn(move || {
            let mut poller = match new_poller() {
                Ok(poller) => poller,
                Err(err) => {
                    tracing::warn!(target: "termisu.events", %err, "poller creation failed");
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };
            if let Err(err) = poller.add_timer(interval, true) {
                tracing::warn!(target: "termisu.events", %err, "timer arm failed");
                running.store(false, Ordering::SeqCst);
                return;
            }

            let start = Instant::now();
            let mut last = start;
            let mut frame = 0u64;
            while running.load(Ordering::SeqCst) {
                match poller.wait(Some(WAIT_SLICE)) {
                    Ok(Some(PollResult::Timer { expirations, .. })) => {
                        let now = Instant::now();
                        frame += expirations.max(1);
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
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(target: "termisu.events", %err, "poller wait failed");
                        break;
                    }
                }
            }
            poller.close();
            running.store(false, Ordering::SeqCst);
        }));
        tracing::debug!(
            target: "termisu.events",
            source = "system-timer",
            interval_ms = self.interval.as_millis() as u64,
            "source started"
        );
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for SystemTimerSource {
    fn drop(&mut self) {
        self.stop();
    }
}

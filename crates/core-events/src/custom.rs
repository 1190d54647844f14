//! Adapter turning a plain closure into a polled event source.

use crate::event::Event;
use crate::source::{EventSink, Source};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Polls a producer closure on an interval and forwards whatever events it
/// yields. Useful for application-defined sources (watching a queue, a
/// child process, a file) without implementing `Source` from scratch.
pub struct CustomSource<F>
where
    F: FnMut() -> Option<Event> + Send + 'static,
{
    name: String,
    interval: Duration,
    producer: Option<F>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    stop_tx: Option<Sender<()>>,
}

impl<F> CustomSource<F>
where
    F: FnMut() -> Option<Event> + Send + 'static,
{
    pub fn new(name: impl Into<String>, interval: Duration, producer: F) -> CustomSource<F> {
        CustomSource {
            name: name.into(),
            interval: interval.max(Duration::from_millis(1)),
            producer: Some(producer),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            stop_tx: None,
        }
    }
}

impl<F> Source for CustomSource<F>
where
    F: FnMut() -> Option<Event> + Send + 'static,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn start(&mut self, sink: EventSink) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let Some(mut producer) = self.producer.take() else {
            // A custom source is one-shot: once its closure ran to stop, a
            // restart has nothing left to poll.
            self.running.store(false, Ordering::SeqCst);
            return;
        };
        let (stop_tx, stop_rx) = bounded::<()>(1);
        self.stop_tx = Some(stop_tx);
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        self.handle = Some(std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    _ => break,
                }
                if let Some(event) = producer() {
                    if sink.send(event).is_err() {
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        }));
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop_tx = None;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl<F> Drop for CustomSource<F>
where
    F: FnMut() -> Option<Event> + Send + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

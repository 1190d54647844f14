//! The multiplexing loop: sources in, one bounded channel out.

use crate::event::Event;
use crate::source::Source;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Bounded channel capacity. Producers block (or drop, in signal-adjacent
/// paths using try-send) when the consumer lags this far behind.
pub const EVENT_CHANNEL_CAP: usize = 128;

pub struct EventLoop {
    sender: Option<Sender<Event>>,
    receiver: Receiver<Event>,
    sources: Vec<Box<dyn Source>>,
    running: AtomicBool,
}

impl Default for EventLoop {
    fn default() -> Self {
        EventLoop::new()
    }
}

impl EventLoop {
    pub fn new() -> EventLoop {
        EventLoop::with_capacity(EVENT_CHANNEL_CAP)
    }

    pub fn with_capacity(capacity: usize) -> EventLoop {
        let (sender, receiver) = bounded(capacity);
        EventLoop {
            sender: Some(sender),
            receiver,
            sources: Vec::new(),
            running: AtomicBool::new(false),
        }
    }

    /// A producer handle for external publishers (the terminal facade posts
    /// mode changes through this).
    pub fn sink(&self) -> Option<Sender<Event>> {
        self.sender.clone()
    }

    /// The consumer side. Closed once `stop` has run and every source shut
    /// down.
    pub fn events(&self) -> &Receiver<Event> {
        &self.receiver
    }

    /// Convenience drain with a timeout; `None` on timeout or closed loop.
    pub fn next_event(&self, timeout: Duration) -> Option<Event> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register a source; a running loop starts it immediately.
    pub fn add_source(&mut self, mut source: Box<dyn Source>) {
        if self.running() {
            if let Some(sink) = self.sink() {
                source.start(sink);
            }
        }
        tracing::debug!(target: "termisu.events", source = %source.name(), "source added");
        self.sources.push(source);
    }

    /// Stop and drop the source with the given name.
    pub fn remove_source(&mut self, name: &str) -> bool {
        let Some(index) = self.sources.iter().position(|s| s.name() == name) else {
            return false;
        };
        let mut source = self.sources.remove(index);
        source.stop();
        tracing::debug!(target: "termisu.events", source = name, "source removed");
        true
    }

    /// Start all sources. No-op when already running.
    pub fn start(&mut self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let Some(sender) = self.sender.clone() else {
            self.running.store(false, Ordering::SeqCst);
            return;
        };
        for source in &mut self.sources {
            source.start(sender.clone());
        }
        tracing::debug!(
            target: "termisu.events",
            sources = self.sources.len(),
            "event loop started"
        );
    }

    /// Stop all sources and close the channel. Idempotent; the receiver
    /// drains any queued events and then reports disconnection.
    pub fn stop(&mut self) {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Never started (or already stopped): still release the sender so
            // the channel closes for consumers.
            self.sender = None;
            return;
        }
        for source in &mut self.sources {
            source.stop();
        }
        self.sender = None;
        tracing::debug!(target: "termisu.events", "event loop stopped");
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

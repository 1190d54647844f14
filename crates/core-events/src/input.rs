//! Input source: a reader + parser loop feeding the sink.

use crate::event::Event;
use crate::source::{EventSink, Source};
use core_input::{InputEvent, InputParser};
use core_io::{Reader, Result};
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// How long the reader blocks per iteration; bounds stop latency.
const POLL_INTERVAL_MS: i32 = 30;

pub struct InputSource {
    fd: RawFd,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    /// Reader + parser pair for `poll_sync` callers while the background
    /// thread is not running.
    sync_state: Option<(Reader, InputParser)>,
}

impl InputSource {
    /// Watch `fd` (the tty's read descriptor) for input.
    pub fn new(fd: RawFd) -> InputSource {
        InputSource {
            fd,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            sync_state: None,
        }
    }

    /// Synchronous single-event poll bypassing the channel, for callers that
    /// drive input themselves. Returns `None` on timeout, and always `None`
    /// while the background thread owns the descriptor.
    pub fn poll_sync(&mut self, timeout_ms: i32) -> Result<Option<InputEvent>> {
        if self.running() {
            tracing::debug!(
                target: "termisu.events",
                "poll_sync ignored while the input source is running"
            );
            return Ok(None);
        }
        let (reader, parser) = self
            .sync_state
            .get_or_insert_with(|| (Reader::new(self.fd), InputParser::new()));
        if !reader.wait_for_data(timeout_ms)? {
            return Ok(None);
        }
        parser.next_event(reader)
    }

    fn convert(event: InputEvent) -> Event {
        match event {
            InputEvent::Key(key) => Event::Key(key),
            InputEvent::Mouse(mouse) => Event::Mouse(mouse),
            InputEvent::FocusGained => Event::FocusGained,
            InputEvent::FocusLost => Event::FocusLost,
        }
    }
}

impl Source for InputSource {
    fn name(&self) -> String {
        "input".to_string()
    }

    fn start(&mut self, sink: EventSink) {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        // The background thread owns its own reader; any sync-poll buffer is
        // dropped rather than shared across threads.
        self.sync_state = None;
        let fd = self.fd;
        let running = Arc::clone(&self.running);
        self.handle = Some(std::thread::spawn(move || {
            let mut reader = Reader::new(fd);
            let mut parser = InputParser::new();
            while running.load(Ordering::SeqCst) {
                match reader.wait_for_data(POLL_INTERVAL_MS) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        tracing::warn!(target: "termisu.events", %err, "input read failed");
                        break;
                    }
                }
                loop {
                    match parser.next_event(&mut reader) {
                        Ok(Some(event)) => {
                            if sink.send(Self::convert(event)).is_err() {
                                running.store(false, Ordering::SeqCst);
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(err) => {
                            tracing::warn!(target: "termisu.events", %err, "input parse failed");
                            running.store(false, Ordering::SeqCst);
                            break;
                        }
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        }));
        tracing::debug!(target: "termisu.events", source = "input", "source started");
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

impl Drop for InputSource {
    fn drop(&mut self) {
        self.stop();
    }
}

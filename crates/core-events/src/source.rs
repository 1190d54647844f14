//! The event-source contract.

use crate::event::Event;

/// Where sources deliver. Cloned per source from the loop's bounded channel;
/// a disconnected sink is the universal stop signal.
pub type EventSink = crossbeam_channel::Sender<Event>;

/// A push-based event producer owning one background thread.
///
/// `start` is idempotent: a compare-and-set on the running flag gates thread
/// spawn, so a second call is a no-op. `stop` is idempotent too and safe
/// from any thread; it must not panic when the source never started.
/// Implementations treat a closed sink as a stop request and exit quietly.
pub trait Source: Send {
    fn name(&self) -> String;
    fn start(&mut self, sink: EventSink);
    fn stop(&mut self);
    fn running(&self) -> bool;
}

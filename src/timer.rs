//! Delayed delivery of a single event.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, instrument};

/// Posts one event to the event loop after a fixed delay.
///
/// At most one delivery is pending: arming again aborts the previous one.
/// Each arming gets a new generation, and [`Deferred::fire`] only accepts
/// the generation currently armed, so an event already queued by an
/// overridden arming is recognised as stale.
#[derive(Debug)]
pub struct Deferred {
    name: &'static str,
    delay: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Deferred {
    /// Creates an idle timer.
    pub fn new(name: &'static str, delay: Duration) -> Self {
        Self {
            name,
            delay,
            generation: 0,
            handle: None,
        }
    }

    /// Schedules `make(generation)` on `events`, cancelling any pending delivery.
    #[instrument(skip(self, events, make), fields(timer = self.name))]
    pub fn arm<E, F>(&mut self, events: &mpsc::UnboundedSender<E>, make: F) -> u64
    where
        E: Send + 'static,
        F: FnOnce(u64) -> E + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let delay = self.delay;
        let events = events.clone();

        self.handle = Some(tokio::spawn(async move {
            sleep(delay).await;
            // Receiver gone means the loop has shut down.
            let _ = events.send(make(generation));
        }));

        debug!(generation, delay_ms = delay.as_millis() as u64, "Timer armed");
        generation
    }

    /// Cancels the pending delivery. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                debug!(timer = self.name, generation = self.generation, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Consumes a delivered event. Returns false for stale generations.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && generation == self.generation {
            self.handle = None;
            true
        } else {
            debug!(
                timer = self.name,
                generation,
                current = self.generation,
                "Ignoring stale timer event"
            );
            false
        }
    }

    /// True while a delivery is pending.
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for Deferred {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

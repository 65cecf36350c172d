use std::sync::Arc;
use std::time::Duration;

use hourglass_rs::SafeTimeProvider;
use tokio::sync::watch;

use crate::events::{Event, EventLog};
use crate::schedule::ScheduledTask;
use crate::types::CustomerId;

/// turns raw input into a stable identifier after a quiet period
pub struct DebouncedResolver {
    window: Duration,
    raw: String,
    publisher: Arc<watch::Sender<CustomerId>>,
    pending: Option<ScheduledTask>,
    events: EventLog,
    time: Arc<SafeTimeProvider>,
}

impl DebouncedResolver {
    pub fn new(window: Duration, events: EventLog, time: Arc<SafeTimeProvider>) -> Self {
        let (publisher, _) = watch::channel(CustomerId::new());
        Self {
            window,
            raw: String::new(),
            publisher: Arc::new(publisher),
            pending: None,
            events,
            time,
        }
    }

    /// receiver of stable identifier publications
    pub fn subscribe(&self) -> watch::Receiver<CustomerId> {
        self.publisher.subscribe()
    }

    /// currently published identifier; empty means none
    pub fn current(&self) -> CustomerId {
        self.publisher.borrow().clone()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// true while a publication is waiting for the quiet period to end
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(ScheduledTask::is_pending)
    }

    /// feed the latest raw input
    pub fn input(&mut self, raw: &str) {
        if raw == self.raw && self.is_pending() {
            return;
        }
        self.raw = raw.to_string();

        // restarting the timer cancels the previous one
        if let Some(mut task) = self.pending.take() {
            task.cancel();
        }

        let trimmed = raw.trim().to_string();
        if trimmed.is_empty() {
            publish(&self.publisher, &self.events, &self.time, trimmed);
            return;
        }

        let publisher = self.publisher.clone();
        let events = self.events.clone();
        let time = self.time.clone();
        self.pending = Some(ScheduledTask::schedule(self.window, async move {
            publish(&publisher, &events, &time, trimmed);
        }));
    }

    /// cancel any pending publication; the resolver stays usable
    pub fn cancel_pending(&mut self) {
        if let Some(mut task) = self.pending.take() {
            task.cancel();
        }
    }

    /// tear down; a pending publication never fires afterwards
    pub fn shutdown(mut self) {
        self.cancel_pending();
    }
}

/// publish unless it repeats the current identifier
fn publish(
    publisher: &watch::Sender<CustomerId>,
    events: &EventLog,
    time: &SafeTimeProvider,
    identifier: CustomerId,
) {
    let changed = publisher.send_if_modified(|current| {
        if *current == identifier {
            false
        } else {
            *current = identifier.clone();
            true
        }
    });

    if changed {
        tracing::debug!(identifier = %identifier, "stable identifier published");
        events.emit(Event::IdentifierPublished {
            identifier,
            timestamp: time.now(),
        });
    }
}

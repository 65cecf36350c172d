use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{CustomerId, LoanId, PaymentType};

/// all events emitted by the resolver, coordinator and forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // identifier events
    IdentifierPublished {
        identifier: CustomerId,
        timestamp: DateTime<Utc>,
    },

    // overview fetch events
    FetchStarted {
        request_id: Uuid,
        customer_id: CustomerId,
        generation: u64,
        timestamp: DateTime<Utc>,
    },
    FetchSucceeded {
        request_id: Uuid,
        customer_id: CustomerId,
        loan_count: usize,
        timestamp: DateTime<Utc>,
    },
    FetchFailed {
        request_id: Uuid,
        customer_id: CustomerId,
        message: String,
        timestamp: DateTime<Utc>,
    },
    FetchDiscarded {
        request_id: Uuid,
        customer_id: CustomerId,
        generation: u64,
        timestamp: DateTime<Utc>,
    },
    StateCleared {
        timestamp: DateTime<Utc>,
    },

    // mutation events
    LoanCreated {
        loan_id: LoanId,
        customer_id: CustomerId,
        monthly_emi: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRecorded {
        payment_id: String,
        loan_id: LoanId,
        amount: Money,
        payment_type: PaymentType,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    LedgerLoaded {
        loan_id: LoanId,
        transaction_count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// remove the `count` oldest events
    pub fn drop_oldest(&mut self, count: usize) {
        let count = count.min(self.events.len());
        self.events.drain(..count);
    }
}

/// entries kept by an [`EventLog`] before the oldest are dropped
pub const DEFAULT_EVENT_CAPACITY: usize = 1_000;

/// event store shared between the components of one shell
///
/// Bounded: once `capacity` entries are held, each new event drops the oldest.
#[derive(Debug, Clone)]
pub struct EventLog {
    inner: Arc<Mutex<EventStore>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventStore::new())),
            capacity: capacity.max(1),
        }
    }

    pub fn emit(&self, event: Event) {
        let mut store = self.inner.lock();
        store.emit(event);
        let excess = store.events().len().saturating_sub(self.capacity);
        if excess > 0 {
            store.drop_oldest(excess);
        }
    }

    /// copy of everything recorded so far
    pub fn snapshot(&self) -> Vec<Event> {
        self.inner.lock().events().to_vec()
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.inner.lock().take_events()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// count events matching a predicate
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Event) -> bool,
    {
        self.inner.lock().events().iter().filter(|e| predicate(e)).count()
    }

    /// identifiers published so far, in order
    pub fn published_identifiers(&self) -> Vec<CustomerId> {
        self.inner
            .lock()
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::IdentifierPublished { identifier, .. } => Some(identifier.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_log_sees_all_emitters() {
        let log = EventLog::new();
        let other = log.clone();
        let now = Utc::now();

        log.emit(Event::IdentifierPublished {
            identifier: "A".to_string(),
            timestamp: now,
        });
        other.emit(Event::StateCleared { timestamp: now });
        other.emit(Event::IdentifierPublished {
            identifier: "B".to_string(),
            timestamp: now,
        });

        assert_eq!(log.snapshot().len(), 3);
        assert_eq!(log.published_identifiers(), vec!["A", "B"]);
        assert_eq!(log.count(|e| matches!(e, Event::StateCleared { .. })), 1);

        let taken = other.take_events();
        assert_eq!(taken.len(), 3);
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_log_drops_oldest_past_capacity() {
        let log = EventLog::with_capacity(3);
        let now = Utc::now();
        for id in ["A", "B", "C", "D", "E"] {
            log.emit(Event::IdentifierPublished {
                identifier: id.to_string(),
                timestamp: now,
            });
        }

        assert_eq!(log.snapshot().len(), 3);
        assert_eq!(log.published_identifiers(), vec!["C", "D", "E"]);
    }
}

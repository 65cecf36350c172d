use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hourglass_rs::SafeTimeProvider;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::LendingApi;
use crate::errors::Result;
use crate::events::{Event, EventLog};
use crate::models::CustomerOverview;
use crate::state::{FetchState, OverviewSnapshot, RequestState};
use crate::types::CustomerId;

/// re-fetch trigger handed to mutation forms
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self);
}

/// an issued fetch, waiting for its response
#[derive(Debug, Clone)]
pub struct FetchTicket {
    pub request_id: Uuid,
    pub customer_id: CustomerId,
    pub generation: u64,
}

/// outcome of applying a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Discarded,
}

pub struct OverviewCoordinator {
    api: Arc<dyn LendingApi>,
    identifier: watch::Receiver<CustomerId>,
    state: watch::Sender<FetchState>,
    generation: AtomicU64,
    events: EventLog,
    time: Arc<SafeTimeProvider>,
}

impl OverviewCoordinator {
    pub fn new(
        api: Arc<dyn LendingApi>,
        identifier: watch::Receiver<CustomerId>,
        events: EventLog,
        time: Arc<SafeTimeProvider>,
    ) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self {
            api,
            identifier,
            state,
            generation: AtomicU64::new(0),
            events,
            time,
        }
    }

    /// snapshot of the current state
    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// identifier the coordinator is currently serving
    pub fn current_identifier(&self) -> CustomerId {
        self.identifier.borrow().clone()
    }

    /// latest generation issued
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// re-fetch the overview for the current identifier
    pub async fn refresh(&self) {
        let Some(ticket) = self.begin() else {
            return;
        };
        let outcome = self.api.customer_overview(&ticket.customer_id).await;
        self.complete(&ticket, outcome);
    }

    /// issue a new generation and move to Loading, or to Idle when there is
    /// no identifier; returns the ticket the network half must carry
    pub fn begin(&self) -> Option<FetchTicket> {
        let customer_id = self.current_identifier();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if customer_id.is_empty() {
            let was_idle = self.state.borrow().is_idle();
            let cleared = self.transition(generation, None, FetchState::Idle);
            if cleared && !was_idle {
                tracing::debug!(generation, "overview cleared");
                self.events.emit(Event::StateCleared {
                    timestamp: self.time.now(),
                });
            }
            return None;
        }

        let ticket = FetchTicket {
            request_id: Uuid::new_v4(),
            customer_id,
            generation,
        };

        if !self.transition(generation, Some(&ticket.customer_id), FetchState::Loading) {
            // superseded before it started
            return None;
        }

        tracing::debug!(
            customer_id = %ticket.customer_id,
            generation,
            request_id = %ticket.request_id,
            "overview fetch started"
        );
        self.events.emit(Event::FetchStarted {
            request_id: ticket.request_id,
            customer_id: ticket.customer_id.clone(),
            generation,
            timestamp: self.time.now(),
        });

        Some(ticket)
    }

    /// apply a response if its ticket is still current
    pub fn complete(&self, ticket: &FetchTicket, outcome: Result<CustomerOverview>) -> Resolution {
        let now = self.time.now();

        let (next, event) = match outcome {
            Ok(overview) => {
                let loan_count = overview.loans.len();
                let snapshot =
                    OverviewSnapshot::from_overview(ticket.customer_id.clone(), overview, now);
                (
                    RequestState::Success(snapshot),
                    Event::FetchSucceeded {
                        request_id: ticket.request_id,
                        customer_id: ticket.customer_id.clone(),
                        loan_count,
                        timestamp: now,
                    },
                )
            }
            Err(err) => {
                let message = err.user_message();
                (
                    RequestState::Failure(message.clone()),
                    Event::FetchFailed {
                        request_id: ticket.request_id,
                        customer_id: ticket.customer_id.clone(),
                        message,
                        timestamp: now,
                    },
                )
            }
        };

        if self.transition(ticket.generation, Some(&ticket.customer_id), next) {
            match &event {
                Event::FetchFailed { message, .. } => tracing::warn!(
                    customer_id = %ticket.customer_id,
                    generation = ticket.generation,
                    %message,
                    "overview fetch failed"
                ),
                _ => tracing::debug!(
                    customer_id = %ticket.customer_id,
                    generation = ticket.generation,
                    "overview fetch applied"
                ),
            }
            self.events.emit(event);
            Resolution::Applied
        } else {
            tracing::debug!(
                customer_id = %ticket.customer_id,
                generation = ticket.generation,
                latest = self.generation(),
                "stale overview response discarded"
            );
            // identifier moved on but nothing newer was issued: leave Loading
            let settled = self.state.send_if_modified(|state| {
                if self.generation.load(Ordering::SeqCst) != ticket.generation || !state.is_loading() {
                    return false;
                }
                *state = FetchState::Idle;
                true
            });
            if settled {
                tracing::debug!(generation = ticket.generation, "overview reset to idle");
            }
            self.events.emit(Event::FetchDiscarded {
                request_id: ticket.request_id,
                customer_id: ticket.customer_id.clone(),
                generation: ticket.generation,
                timestamp: now,
            });
            Resolution::Discarded
        }
    }

    /// write `next` only if `generation` is still the latest and, when given,
    /// the identifier still matches; the check runs under the channel's lock
    fn transition(&self, generation: u64, customer_id: Option<&str>, next: FetchState) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            if let Some(id) = customer_id {
                if *self.identifier.borrow() != id {
                    return false;
                }
            }
            *state = next;
            true
        })
    }

    /// follow identifier publications until the returned binding is dropped
    ///
    /// Performs one refresh for the identifier current at bind time. Each
    /// later publication begins a refresh immediately and resolves it on its
    /// own task, so a slow fetch never delays the next one.
    pub fn bind(self: &Arc<Self>) -> CoordinatorBinding {
        let coordinator = Arc::clone(self);
        let mut publications = self.identifier.clone();
        publications.borrow_and_update();

        let handle = tokio::spawn(async move {
            coordinator.spawn_refresh();
            while publications.changed().await.is_ok() {
                coordinator.spawn_refresh();
            }
        });

        CoordinatorBinding { handle }
    }

    fn spawn_refresh(self: &Arc<Self>) {
        if let Some(ticket) = self.begin() {
            let coordinator = Arc::clone(self);
            tokio::spawn(async move {
                let outcome = coordinator.api.customer_overview(&ticket.customer_id).await;
                coordinator.complete(&ticket, outcome);
            });
        }
    }
}

#[async_trait]
impl Refresh for OverviewCoordinator {
    async fn refresh(&self) {
        OverviewCoordinator::refresh(self).await
    }
}

/// live subscription of a coordinator to identifier publications
#[derive(Debug)]
pub struct CoordinatorBinding {
    handle: JoinHandle<()>,
}

impl CoordinatorBinding {
    pub fn unbind(self) {}
}

impl Drop for CoordinatorBinding {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

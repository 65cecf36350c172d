use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::models::{CustomerOverview, Loan};
use crate::types::CustomerId;

/// state of one request/response cycle
///
/// Exactly one variant holds at a time, so a view can never be loading and
/// failed at once. Failure carries the message shown to the user and no
/// payload, which is how cached data is dropped on error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestState<T> {
    Idle,
    Loading,
    Success(T),
    Failure(String),
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        RequestState::Idle
    }
}

impl<T> RequestState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, RequestState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            RequestState::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failure(message) => Some(message),
            _ => None,
        }
    }

    /// short label for logs and status lines
    pub fn label(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Loading => "loading",
            RequestState::Success(_) => "success",
            RequestState::Failure(_) => "failure",
        }
    }
}

/// customer overview as held by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewSnapshot {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub loans: Vec<Loan>,
    pub fetched_at: DateTime<Utc>,
}

impl OverviewSnapshot {
    pub fn from_overview(
        customer_id: CustomerId,
        overview: CustomerOverview,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_id,
            customer_name: overview.customer_name,
            loans: overview.loans,
            fetched_at,
        }
    }

    pub fn loan(&self, loan_id: &str) -> Option<&Loan> {
        self.loans.iter().find(|l| l.loan_id == loan_id)
    }

    /// total still owed across all loans
    pub fn total_outstanding(&self) -> Money {
        self.loans
            .iter()
            .map(Loan::outstanding)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    pub fn total_emi(&self) -> Money {
        self.loans
            .iter()
            .filter(|l| l.emis_left > 0)
            .map(|l| l.emi_amount)
            .fold(Money::ZERO, |acc, x| acc + x)
    }
}

/// state of the customer overview
pub type FetchState = RequestState<OverviewSnapshot>;

impl FetchState {
    pub fn customer_name(&self) -> Option<&str> {
        self.payload().map(|s| s.customer_name.as_str())
    }

    /// loans currently displayed; empty unless the last fetch succeeded
    pub fn loans(&self) -> &[Loan] {
        self.payload().map(|s| s.loans.as_slice()).unwrap_or(&[])
    }
}

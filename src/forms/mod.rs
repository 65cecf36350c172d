pub mod apply;
pub mod payment;

use std::str::FromStr;
use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;

use crate::api::LendingApi;
use crate::coordinator::Refresh;
use crate::errors::{LendingError, Result};
use crate::events::EventLog;

pub use apply::LoanApplicationForm;
pub use payment::PaymentForm;

/// collaborators shared by the forms and the ledger viewer
#[derive(Clone)]
pub struct FormContext {
    pub api: Arc<dyn LendingApi>,
    pub refresher: Arc<dyn Refresh>,
    pub events: EventLog,
    pub time: Arc<SafeTimeProvider>,
}

/// parse a required, strictly positive decimal field
pub(crate) fn positive_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LendingError::validation(field, "is required"));
    }
    let value = Decimal::from_str(trimmed)
        .map_err(|_| LendingError::validation(field, format!("{:?} is not a number", trimmed)))?;
    if value <= Decimal::ZERO {
        return Err(LendingError::validation(field, "must be greater than zero"));
    }
    Ok(value)
}

/// parse a required, non-empty identifier field
pub(crate) fn required_text(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LendingError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

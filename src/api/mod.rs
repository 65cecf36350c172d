pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;

use crate::errors::Result;
use crate::models::{
    CreateLoanRequest, CreateLoanResponse, CustomerOverview, Ledger, PaymentReceipt,
    PaymentRequest,
};

pub use http::HttpLendingApi;

/// remote lending service
///
/// Every method performs exactly one request. Non-2xx responses come back as
/// [`LendingError::Api`](crate::LendingError::Api), unreachable servers as
/// [`LendingError::Transport`](crate::LendingError::Transport).
#[async_trait]
pub trait LendingApi: Send + Sync {
    /// GET /customers/{id}/overview
    async fn customer_overview(&self, customer_id: &str) -> Result<CustomerOverview>;

    /// POST /loans
    async fn create_loan(&self, request: &CreateLoanRequest) -> Result<CreateLoanResponse>;

    /// POST /loans/{id}/payments
    async fn record_payment(&self, loan_id: &str, request: &PaymentRequest) -> Result<PaymentReceipt>;

    /// GET /loans/{id}/ledger
    async fn loan_ledger(&self, loan_id: &str) -> Result<Ledger>;
}

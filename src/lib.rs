pub mod api;
pub mod config;
pub mod coordinator;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod forms;
pub mod ledger;
pub mod models;
pub mod quote;
pub mod render;
pub mod resolver;
pub mod schedule;
pub mod shell;
pub mod state;
pub mod types;

// re-export key types
pub use api::{HttpLendingApi, LendingApi};
pub use config::FrontendConfig;
pub use coordinator::{CoordinatorBinding, FetchTicket, OverviewCoordinator, Refresh, Resolution};
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventLog, EventStore};
pub use forms::{FormContext, LoanApplicationForm, PaymentForm};
pub use ledger::LedgerViewer;
pub use models::{
    CreateLoanRequest, CreateLoanResponse, CustomerOverview, Ledger, Loan, LoanCreated,
    PaymentReceipt, PaymentRequest, Transaction,
};
pub use quote::LoanQuote;
pub use resolver::DebouncedResolver;
pub use state::{FetchState, OverviewSnapshot, RequestState};
pub use types::{CustomerId, LoanId, PaymentType};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;

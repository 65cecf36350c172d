use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::{positive_decimal, required_text, FormContext};
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::events::Event;
use crate::models::{CreateLoanRequest, CreateLoanResponse};
use crate::quote::LoanQuote;
use crate::state::RequestState;

/// longest loan period the form accepts
pub const MAX_PERIOD_YEARS: u32 = 30;

/// highest yearly rate the form accepts, in percent
pub const MAX_RATE_PERCENT: u32 = 100;

/// loan application form
pub struct LoanApplicationForm {
    pub customer_id: String,
    pub loan_amount: String,
    pub interest_rate: String,
    pub period_years: String,
    state: RequestState<CreateLoanResponse>,
    ctx: FormContext,
}

impl LoanApplicationForm {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            customer_id: String::new(),
            loan_amount: String::new(),
            interest_rate: String::new(),
            period_years: String::new(),
            state: RequestState::Idle,
            ctx,
        }
    }

    pub fn state(&self) -> &RequestState<CreateLoanResponse> {
        &self.state
    }

    /// clear the fields and the last outcome, keeping the customer
    pub fn reset(&mut self) {
        self.loan_amount.clear();
        self.interest_rate.clear();
        self.period_years.clear();
        self.state = RequestState::Idle;
    }

    /// build the request body or report the first invalid field
    pub fn validate(&self) -> Result<CreateLoanRequest> {
        let customer_id = required_text("customer_id", &self.customer_id)?;
        let loan_amount = positive_decimal("loan_amount", &self.loan_amount)?;

        let rate = Rate::parse_percentage(&self.interest_rate)
            .map_err(|_| LendingError::validation("interest_rate_yearly", "is not a number"))?;
        if rate.is_negative() {
            return Err(LendingError::validation("interest_rate_yearly", "must not be negative"));
        }
        if rate.as_percentage() > Decimal::from(MAX_RATE_PERCENT) {
            return Err(LendingError::validation(
                "interest_rate_yearly",
                format!("must be at most {}%", MAX_RATE_PERCENT),
            ));
        }

        let years = positive_decimal("loan_period_years", &self.period_years)?;
        if years.fract() != Decimal::ZERO {
            return Err(LendingError::validation("loan_period_years", "must be a whole number of years"));
        }
        let loan_period_years = years
            .to_u32()
            .filter(|y| *y <= MAX_PERIOD_YEARS)
            .ok_or_else(|| {
                LendingError::validation(
                    "loan_period_years",
                    format!("must be at most {}", MAX_PERIOD_YEARS),
                )
            })?;

        Ok(CreateLoanRequest {
            customer_id,
            loan_amount,
            interest_rate_yearly: rate.as_percentage(),
            loan_period_years,
        })
    }

    /// indicative figures for the current fields, if they are valid and fit
    pub fn quote(&self) -> Option<LoanQuote> {
        let request = self.validate().ok()?;
        LoanQuote::calculate(
            Money::from_decimal(request.loan_amount),
            Rate::from_percentage(request.interest_rate_yearly),
            request.loan_period_years,
        )
    }

    /// submit the application; on success the overview is refreshed
    pub async fn submit(&mut self) -> Result<CreateLoanResponse> {
        let request = match self.validate() {
            Ok(request) => request,
            Err(err) => {
                self.state = RequestState::Failure(err.user_message());
                return Err(err);
            }
        };

        self.state = RequestState::Loading;
        match self.ctx.api.create_loan(&request).await {
            Ok(response) => {
                tracing::info!(
                    loan_id = %response.data.loan_id,
                    customer_id = %response.data.customer_id,
                    "loan application accepted"
                );
                self.ctx.events.emit(Event::LoanCreated {
                    loan_id: response.data.loan_id.clone(),
                    customer_id: response.data.customer_id.clone(),
                    monthly_emi: response.data.monthly_emi,
                    timestamp: self.ctx.time.now(),
                });
                self.state = RequestState::Success(response.clone());
                self.ctx.refresher.refresh().await;
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(customer_id = %request.customer_id, error = %err, "loan application failed");
                self.state = RequestState::Failure(err.user_message());
                Err(err)
            }
        }
    }
}

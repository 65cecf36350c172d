use super::{positive_decimal, required_text, FormContext};
use crate::decimal::Money;
use crate::errors::Result;
use crate::events::Event;
use crate::models::{PaymentReceipt, PaymentRequest};
use crate::state::RequestState;
use crate::types::{LoanId, PaymentType};

/// payment recording form
pub struct PaymentForm {
    pub loan_id: String,
    pub amount: String,
    pub payment_type: PaymentType,
    state: RequestState<PaymentReceipt>,
    ctx: FormContext,
}

impl PaymentForm {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            loan_id: String::new(),
            amount: String::new(),
            payment_type: PaymentType::Emi,
            state: RequestState::Idle,
            ctx,
        }
    }

    pub fn state(&self) -> &RequestState<PaymentReceipt> {
        &self.state
    }

    pub fn reset(&mut self) {
        self.loan_id.clear();
        self.amount.clear();
        self.payment_type = PaymentType::Emi;
        self.state = RequestState::Idle;
    }

    pub fn validate(&self) -> Result<(LoanId, PaymentRequest)> {
        let loan_id = required_text("loan_id", &self.loan_id)?;
        let amount = positive_decimal("amount", &self.amount)?;
        Ok((
            loan_id,
            PaymentRequest {
                amount,
                payment_type: self.payment_type,
            },
        ))
    }

    /// record the payment; on success the overview is refreshed
    pub async fn submit(&mut self) -> Result<PaymentReceipt> {
        let (loan_id, request) = match self.validate() {
            Ok(valid) => valid,
            Err(err) => {
                self.state = RequestState::Failure(err.user_message());
                return Err(err);
            }
        };

        self.state = RequestState::Loading;
        match self.ctx.api.record_payment(&loan_id, &request).await {
            Ok(receipt) => {
                tracing::info!(
                    loan_id = %receipt.loan_id,
                    payment_id = %receipt.payment_id,
                    remaining = %receipt.remaining_balance,
                    "payment recorded"
                );
                self.ctx.events.emit(Event::PaymentRecorded {
                    payment_id: receipt.payment_id.clone(),
                    loan_id: receipt.loan_id.clone(),
                    amount: Money::from_decimal(request.amount),
                    payment_type: request.payment_type,
                    remaining_balance: receipt.remaining_balance,
                    timestamp: self.ctx.time.now(),
                });
                self.state = RequestState::Success(receipt.clone());
                self.ctx.refresher.refresh().await;
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(%loan_id, error = %err, "payment failed");
                self.state = RequestState::Failure(err.user_message());
                Err(err)
            }
        }
    }
}

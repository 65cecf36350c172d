use crate::decimal::Money;
use crate::errors::Result;
use crate::events::Event;
use crate::forms::{required_text, FormContext};
use crate::models::{Ledger, Transaction};
use crate::state::RequestState;
use crate::types::PaymentType;

/// transaction ledger viewer for a single loan
pub struct LedgerViewer {
    pub loan_id: String,
    state: RequestState<Ledger>,
    ctx: FormContext,
}

impl LedgerViewer {
    pub fn new(ctx: FormContext) -> Self {
        Self {
            loan_id: String::new(),
            state: RequestState::Idle,
            ctx,
        }
    }

    pub fn state(&self) -> &RequestState<Ledger> {
        &self.state
    }

    pub fn clear(&mut self) {
        self.loan_id.clear();
        self.state = RequestState::Idle;
    }

    /// fetch the ledger for `loan_id`
    pub async fn load(&mut self) -> Result<Ledger> {
        let loan_id = match required_text("loan_id", &self.loan_id) {
            Ok(id) => id,
            Err(err) => {
                self.state = RequestState::Failure(err.user_message());
                return Err(err);
            }
        };

        self.state = RequestState::Loading;
        match self.ctx.api.loan_ledger(&loan_id).await {
            Ok(ledger) => {
                tracing::debug!(%loan_id, transactions = ledger.transactions.len(), "ledger loaded");
                self.ctx.events.emit(Event::LedgerLoaded {
                    loan_id: ledger.loan_id.clone(),
                    transaction_count: ledger.transactions.len(),
                    timestamp: self.ctx.time.now(),
                });
                self.state = RequestState::Success(ledger.clone());
                Ok(ledger)
            }
            Err(err) => {
                tracing::warn!(%loan_id, error = %err, "ledger request failed");
                self.state = RequestState::Failure(err.user_message());
                Err(err)
            }
        }
    }
}

impl Ledger {
    /// sum of all entries of one payment type
    pub fn total_by_type(&self, payment_type: PaymentType) -> Money {
        self.transactions
            .iter()
            .filter(|t| t.payment_type() == Some(payment_type))
            .map(|t| t.amount)
            .fold(Money::ZERO, |acc, x| acc + x)
    }

    /// transactions ordered oldest first; unparsable dates keep their position at the end
    pub fn chronological(&self) -> Vec<&Transaction> {
        let mut ordered: Vec<&Transaction> = self.transactions.iter().collect();
        ordered.sort_by_key(|t| (t.parsed_date().is_none(), t.parsed_date()));
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::scripted::ScriptedApi;
    use crate::api::LendingApi;
    use crate::coordinator::Refresh;
    use crate::events::EventLog;
    use crate::models::PaymentRequest;
    use async_trait::async_trait;
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    struct NoRefresh;

    #[async_trait]
    impl Refresh for NoRefresh {
        async fn refresh(&self) {}
    }

    fn viewer(api: Arc<ScriptedApi>) -> LedgerViewer {
        LedgerViewer::new(FormContext {
            api,
            refresher: Arc::new(NoRefresh),
            events: EventLog::new(),
            time: Arc::new(SafeTimeProvider::new(TimeSource::System)),
        })
    }

    #[tokio::test]
    async fn test_ledger_after_payments() {
        let api = Arc::new(ScriptedApi::new());
        api.add_customer("CUST001", "Asha Rao");
        api.add_loan("CUST001", "L123", 12_000, 1_000, 12);
        for (amount, payment_type) in [(1_000, PaymentType::Emi), (3_000, PaymentType::LumpSum)] {
            api.record_payment(
                "L123",
                &PaymentRequest {
                    amount: Decimal::from(amount),
                    payment_type,
                },
            )
            .await
            .unwrap();
        }

        let mut viewer = viewer(api);
        viewer.loan_id = "L123".to_string();
        let ledger = viewer.load().await.unwrap();

        assert_eq!(ledger.transactions.len(), 2);
        assert_eq!(ledger.balance_amount, Money::from_major(8_000));
        assert_eq!(ledger.total_by_type(PaymentType::LumpSum), Money::from_major(3_000));
        assert!(viewer.state().payload().is_some());
    }

    #[tokio::test]
    async fn test_unknown_loan_is_failure() {
        let api = Arc::new(ScriptedApi::new());
        let mut viewer = viewer(api);
        viewer.loan_id = "NOPE".to_string();

        assert!(viewer.load().await.is_err());
        assert_eq!(viewer.state().error(), Some("loan not found"));
    }

    #[test]
    fn test_chronological_order() {
        let tx = |id: &str, date: &str| Transaction {
            transaction_id: id.to_string(),
            date: date.to_string(),
            kind: "EMI".to_string(),
            amount: Money::from_major(1),
        };
        let ledger = Ledger {
            loan_id: "L1".to_string(),
            customer_id: "C1".to_string(),
            principal: Money::ZERO,
            total_amount: Money::ZERO,
            monthly_emi: Money::ZERO,
            amount_paid: Money::ZERO,
            balance_amount: Money::ZERO,
            emis_left: 0,
            transactions: vec![
                tx("3", "2024-03-01"),
                tx("x", "unknown"),
                tx("1", "2024-01-01T09:00:00"),
                tx("2", "2024-02-01T09:00:00Z"),
            ],
        };

        let ordered = ledger.chronological();
        let ids: Vec<&str> = ordered
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "x"]);
    }
}

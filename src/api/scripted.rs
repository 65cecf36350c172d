use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::prelude::ToPrimitive;

use super::LendingApi;
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::models::{
    CreateLoanRequest, CreateLoanResponse, CustomerOverview, Ledger, Loan, LoanCreated,
    PaymentReceipt, PaymentRequest, Transaction,
};
use crate::quote::LoanQuote;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ApiCall {
    Overview(String),
    CreateLoan(CreateLoanRequest),
    RecordPayment(String, PaymentRequest),
    Ledger(String),
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    customers: Mutex<HashMap<String, CustomerOverview>>,
    ledgers: Mutex<HashMap<String, Vec<Transaction>>>,
    owners: Mutex<HashMap<String, String>>,
    delays: Mutex<HashMap<String, Duration>>,
    failures: Mutex<HashMap<String, VecDeque<LendingError>>>,
    calls: Mutex<Vec<ApiCall>>,
    next_id: Mutex<u64>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, customer_id: &str, name: &str) {
        self.customers.lock().insert(
            customer_id.to_string(),
            CustomerOverview {
                customer_name: name.to_string(),
                loans: Vec::new(),
            },
        );
    }

    /// add a loan with no interest and nothing paid yet
    pub fn add_loan(&self, customer_id: &str, loan_id: &str, principal: i64, emi: i64, emis: u32) {
        let loan = Loan {
            loan_id: loan_id.to_string(),
            principal: Money::from_major(principal),
            total_amount: Money::from_major(principal),
            total_interest: Money::ZERO,
            emi_amount: Money::from_major(emi),
            amount_paid: Money::ZERO,
            emis_left: emis,
        };
        if let Some(customer) = self.customers.lock().get_mut(customer_id) {
            customer.loans.push(loan);
        }
        self.owners
            .lock()
            .insert(loan_id.to_string(), customer_id.to_string());
    }

    /// delay every response for a customer or loan id
    pub fn set_delay(&self, key: &str, delay: Duration) {
        self.delays.lock().insert(key.to_string(), delay);
    }

    /// fail the next request for a customer or loan id
    pub fn fail_next(&self, key: &str, err: LendingError) {
        self.failures
            .lock()
            .entry(key.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().clone()
    }

    pub fn overview_calls(&self, customer_id: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ApiCall::Overview(id) if id == customer_id))
            .count()
    }

    async fn script(&self, key: &str, call: ApiCall) -> Result<()> {
        self.calls.lock().push(call);
        let delay = self.delays.lock().get(key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self
            .failures
            .lock()
            .get_mut(key)
            .and_then(VecDeque::pop_front);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{}{}", prefix, *next)
    }

    fn not_found(what: &str) -> LendingError {
        LendingError::Api {
            status: 404,
            message: format!("{} not found", what),
        }
    }
}

#[async_trait]
impl LendingApi for ScriptedApi {
    async fn customer_overview(&self, customer_id: &str) -> Result<CustomerOverview> {
        self.script(customer_id, ApiCall::Overview(customer_id.to_string()))
            .await?;
        self.customers
            .lock()
            .get(customer_id)
            .cloned()
            .ok_or_else(|| Self::not_found("customer"))
    }

    async fn create_loan(&self, request: &CreateLoanRequest) -> Result<CreateLoanResponse> {
        self.script(&request.customer_id, ApiCall::CreateLoan(request.clone()))
            .await?;

        let quote = LoanQuote::calculate(
            Money::from_decimal(request.loan_amount),
            Rate::from_percentage(request.interest_rate_yearly),
            request.loan_period_years,
        )
        .ok_or_else(|| LendingError::Api {
            status: 422,
            message: "loan terms out of range".to_string(),
        })?;
        let loan_id = self.next_id("LN");

        let mut customers = self.customers.lock();
        let customer = customers
            .get_mut(&request.customer_id)
            .ok_or_else(|| Self::not_found("customer"))?;
        customer.loans.push(Loan {
            loan_id: loan_id.clone(),
            principal: quote.principal,
            total_amount: quote.total_payable,
            total_interest: quote.total_interest,
            emi_amount: quote.monthly_emi,
            amount_paid: Money::ZERO,
            emis_left: quote.months,
        });
        self.owners
            .lock()
            .insert(loan_id.clone(), request.customer_id.clone());

        Ok(CreateLoanResponse {
            message: Some("Loan created successfully".to_string()),
            data: LoanCreated {
                loan_id,
                customer_id: request.customer_id.clone(),
                total_amount_payable: quote.total_payable,
                monthly_emi: quote.monthly_emi,
            },
        })
    }

    async fn record_payment(&self, loan_id: &str, request: &PaymentRequest) -> Result<PaymentReceipt> {
        self.script(
            loan_id,
            ApiCall::RecordPayment(loan_id.to_string(), request.clone()),
        )
        .await?;

        let owner = self
            .owners
            .lock()
            .get(loan_id)
            .cloned()
            .ok_or_else(|| Self::not_found("loan"))?;
        let amount = Money::from_decimal(request.amount);
        let payment_id = self.next_id("PAY");

        let mut customers = self.customers.lock();
        let loan = customers
            .get_mut(&owner)
            .and_then(|c| c.loans.iter_mut().find(|l| l.loan_id == loan_id))
            .ok_or_else(|| Self::not_found("loan"))?;

        loan.amount_paid += amount;
        let remaining = loan.outstanding();
        loan.emis_left = if loan.emi_amount.is_zero() {
            0
        } else {
            (remaining.as_decimal() / loan.emi_amount.as_decimal())
                .ceil()
                .to_u32()
                .unwrap_or(0)
        };
        let emis_left = loan.emis_left;

        self.ledgers
            .lock()
            .entry(loan_id.to_string())
            .or_default()
            .push(Transaction {
                transaction_id: payment_id.clone(),
                date: "2024-01-01T00:00:00".to_string(),
                kind: request.payment_type.as_str().to_string(),
                amount,
            });

        Ok(PaymentReceipt {
            message: Some("Payment recorded".to_string()),
            payment_id,
            loan_id: loan_id.to_string(),
            remaining_balance: remaining,
            emis_left,
        })
    }

    async fn loan_ledger(&self, loan_id: &str) -> Result<Ledger> {
        self.script(loan_id, ApiCall::Ledger(loan_id.to_string()))
            .await?;

        let owner = self
            .owners
            .lock()
            .get(loan_id)
            .cloned()
            .ok_or_else(|| Self::not_found("loan"))?;
        let customers = self.customers.lock();
        let loan = customers
            .get(&owner)
            .and_then(|c| c.loans.iter().find(|l| l.loan_id == loan_id))
            .ok_or_else(|| Self::not_found("loan"))?;

        Ok(Ledger {
            loan_id: loan.loan_id.clone(),
            customer_id: owner.clone(),
            principal: loan.principal,
            total_amount: loan.total_amount,
            monthly_emi: loan.emi_amount,
            amount_paid: loan.amount_paid,
            balance_amount: loan.outstanding(),
            emis_left: loan.emis_left,
            transactions: self
                .ledgers
                .lock()
                .get(loan_id)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

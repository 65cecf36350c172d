use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{deserialize_identifier, CustomerId, LoanId, PaymentType};

/// read-only loan projection from the customer overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    #[serde(deserialize_with = "deserialize_identifier")]
    pub loan_id: LoanId,
    pub principal: Money,
    /// total payable over the life of the loan
    pub total_amount: Money,
    pub total_interest: Money,
    pub emi_amount: Money,
    pub amount_paid: Money,
    /// estimated installments remaining
    pub emis_left: u32,
}

impl Loan {
    pub fn outstanding(&self) -> Money {
        (self.total_amount - self.amount_paid).max(Money::ZERO)
    }
}

/// body of GET /customers/{id}/overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOverview {
    pub customer_name: String,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

/// body of POST /loans
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateLoanRequest {
    pub customer_id: CustomerId,
    #[serde(with = "rust_decimal::serde::float")]
    pub loan_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub interest_rate_yearly: Decimal,
    pub loan_period_years: u32,
}

/// body of a successful POST /loans
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateLoanResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub data: LoanCreated,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoanCreated {
    #[serde(deserialize_with = "deserialize_identifier")]
    pub loan_id: LoanId,
    #[serde(deserialize_with = "deserialize_identifier")]
    pub customer_id: CustomerId,
    pub total_amount_payable: Money,
    pub monthly_emi: Money,
}

/// body of POST /loans/{id}/payments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub payment_type: PaymentType,
}

/// body of a successful POST /loans/{id}/payments
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(deserialize_with = "deserialize_identifier")]
    pub payment_id: String,
    #[serde(deserialize_with = "deserialize_identifier")]
    pub loan_id: LoanId,
    pub remaining_balance: Money,
    pub emis_left: u32,
}

/// ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(deserialize_with = "deserialize_identifier")]
    pub transaction_id: String,
    /// date as sent by the backend
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Money,
}

impl Transaction {
    /// parse `date` as rfc3339, then naive date-time, then plain date
    pub fn parsed_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.date.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(naive.and_utc());
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// payment type if this entry records one
    pub fn payment_type(&self) -> Option<PaymentType> {
        self.kind.parse().ok()
    }
}

/// body of GET /loans/{id}/ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(deserialize_with = "deserialize_identifier")]
    pub loan_id: LoanId,
    #[serde(deserialize_with = "deserialize_identifier")]
    pub customer_id: CustomerId,
    pub principal: Money,
    pub total_amount: Money,
    pub monthly_emi: Money,
    pub amount_paid: Money,
    pub balance_amount: Money,
    pub emis_left: u32,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// error body convention for non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    /// some deployments report errors under `detail` instead
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

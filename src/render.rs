use std::fmt::Write;

use crate::models::{CreateLoanResponse, Ledger, PaymentReceipt};
use crate::quote::LoanQuote;
use crate::state::{FetchState, RequestState};

pub fn overview(state: &FetchState) -> String {
    match state {
        RequestState::Idle => "Enter a customer id to see their loans.".to_string(),
        RequestState::Loading => "Loading customer overview...".to_string(),
        RequestState::Failure(message) => format!("Error: {}", message),
        RequestState::Success(snapshot) => {
            let mut out = String::new();
            let _ = writeln!(
                out,
                "{} ({})",
                snapshot.customer_name, snapshot.customer_id
            );
            if snapshot.loans.is_empty() {
                out.push_str("No loans yet.");
                return out;
            }
            let _ = writeln!(
                out,
                "{:<12} {:>14} {:>14} {:>12} {:>12} {:>14} {:>9}",
                "LOAN", "PRINCIPAL", "TOTAL", "INTEREST", "EMI", "PAID", "EMIS LEFT"
            );
            for loan in &snapshot.loans {
                let _ = writeln!(
                    out,
                    "{:<12} {:>14} {:>14} {:>12} {:>12} {:>14} {:>9}",
                    loan.loan_id,
                    loan.principal.to_string(),
                    loan.total_amount.to_string(),
                    loan.total_interest.to_string(),
                    loan.emi_amount.to_string(),
                    loan.amount_paid.to_string(),
                    loan.emis_left
                );
            }
            let _ = write!(
                out,
                "Outstanding {} across {} loan(s)",
                snapshot.total_outstanding(),
                snapshot.loans.len()
            );
            out
        }
    }
}

pub fn quote(quote: &LoanQuote) -> String {
    format!(
        "Indicative: EMI {} x {} months, total {} (interest {}) at {}",
        quote.monthly_emi, quote.months, quote.total_payable, quote.total_interest, quote.annual_rate
    )
}

pub fn application(state: &RequestState<CreateLoanResponse>) -> String {
    match state {
        RequestState::Idle => "Apply: apply <amount> <rate%> <years>".to_string(),
        RequestState::Loading => "Submitting application...".to_string(),
        RequestState::Failure(message) => format!("Application failed: {}", message),
        RequestState::Success(response) => format!(
            "{} Loan {} for {}: EMI {}, total payable {}",
            response.message.as_deref().unwrap_or("Loan created."),
            response.data.loan_id,
            response.data.customer_id,
            response.data.monthly_emi,
            response.data.total_amount_payable
        ),
    }
}

pub fn payment(state: &RequestState<PaymentReceipt>) -> String {
    match state {
        RequestState::Idle => "Pay: pay <loan_id> <amount> [emi|lump]".to_string(),
        RequestState::Loading => "Recording payment...".to_string(),
        RequestState::Failure(message) => format!("Payment failed: {}", message),
        RequestState::Success(receipt) => format!(
            "{} Payment {} on loan {}: remaining {}, {} EMI(s) left",
            receipt.message.as_deref().unwrap_or("Payment recorded."),
            receipt.payment_id,
            receipt.loan_id,
            receipt.remaining_balance,
            receipt.emis_left
        ),
    }
}

pub fn ledger(state: &RequestState<Ledger>) -> String {
    match state {
        RequestState::Idle => "Ledger: ledger <loan_id>".to_string(),
        RequestState::Loading => "Loading ledger...".to_string(),
        RequestState::Failure(message) => format!("Error: {}", message),
        RequestState::Success(ledger) => {
            let mut out = String::new();
            let _ = writeln!(
                out,
                "Loan {} ({}) principal {} total {} EMI {}",
                ledger.loan_id, ledger.customer_id, ledger.principal, ledger.total_amount, ledger.monthly_emi
            );
            let _ = writeln!(
                out,
                "Paid {}, balance {}, {} EMI(s) left",
                ledger.amount_paid, ledger.balance_amount, ledger.emis_left
            );
            if ledger.transactions.is_empty() {
                out.push_str("No transactions.");
                return out;
            }
            for tx in ledger.chronological() {
                let _ = writeln!(
                    out,
                    "{:<12} {:<25} {:<9} {:>12}",
                    tx.transaction_id,
                    tx.date,
                    tx.kind,
                    tx.amount.to_string()
                );
            }
            out.trim_end().to_string()
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};

/// indicative repayment figures for a draft loan application
///
/// Shown before submission only; the backend's figures are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Money,
    pub annual_rate: Rate,
    pub years: u32,
    pub months: u32,
    pub monthly_emi: Money,
    pub total_payable: Money,
    pub total_interest: Money,
}

impl LoanQuote {
    /// none when the figures do not fit in a decimal
    pub fn calculate(principal: Money, annual_rate: Rate, years: u32) -> Option<Self> {
        let months = years.checked_mul(12)?;
        let monthly_emi = calculate_emi(principal, annual_rate, months)?;
        let total_payable = if months == 0 {
            principal
        } else {
            Money::from_decimal(monthly_emi.as_decimal().checked_mul(Decimal::from(months))?)
        };
        let total_interest = (total_payable - principal).max(Money::ZERO);

        Some(Self {
            principal,
            annual_rate,
            years,
            months,
            monthly_emi,
            total_payable,
            total_interest,
        })
    }
}

/// calculate EMI for given parameters; none on overflow
pub fn calculate_emi(principal: Money, annual_rate: Rate, months: u32) -> Option<Money> {
    if months == 0 {
        return Some(principal);
    }

    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        // no interest case
        return principal
            .as_decimal()
            .checked_div(Decimal::from(months))
            .map(Money::from_decimal);
    }

    // EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)
    let base = Decimal::ONE.checked_add(r)?;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound = compound.checked_mul(base)?;
    }

    let numerator = principal.as_decimal().checked_mul(r)?.checked_mul(compound)?;
    let denominator = compound.checked_sub(Decimal::ONE)?;

    numerator.checked_div(denominator).map(Money::from_decimal)
}

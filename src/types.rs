use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// customer identifier as typed by the user and sent in request paths
pub type CustomerId = String;

/// loan identifier assigned by the lending api
pub type LoanId = String;

/// how a payment is applied by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    /// one scheduled installment
    #[serde(rename = "EMI")]
    Emi,
    /// arbitrary prepayment against the balance
    #[serde(rename = "LUMP_SUM")]
    LumpSum,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Emi => "EMI",
            PaymentType::LumpSum => "LUMP_SUM",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EMI" => Ok(PaymentType::Emi),
            "LUMP_SUM" | "LUMP" | "LUMPSUM" => Ok(PaymentType::LumpSum),
            other => Err(format!("unknown payment type: {}", other)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Text(String),
    Integer(i64),
}

/// accept identifiers sent either as json strings or integers
pub fn deserialize_identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawIdentifier::deserialize(deserializer)? {
        RawIdentifier::Text(s) => s,
        RawIdentifier::Integer(i) => i.to_string(),
    })
}

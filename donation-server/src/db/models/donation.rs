//! Donation Model

use super::serde_thing;
use serde::{Deserialize, Serialize};
use std::fmt;
use surrealdb::sql::Thing;

pub type DonationId = Thing;

/// Donation lifecycle states
///
/// PENDING is the only non-terminal state. Callback-driven processing never
/// leaves a terminal state; the admin direct-update path may (and the campaign
/// aggregate is adjusted accordingly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl DonationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DonationStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Pending => "PENDING",
            DonationStatus::Completed => "COMPLETED",
            DonationStatus::Failed => "FAILED",
            DonationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    InternetBanking,
    MobileBanking,
    DigitalWallet,
    BankTransfer,
    Cash,
    Check,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::InternetBanking => "INTERNET_BANKING",
            PaymentMethod::MobileBanking => "MOBILE_BANKING",
            PaymentMethod::DigitalWallet => "DIGITAL_WALLET",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::Other => "OTHER",
        }
    }
}

/// Donation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    #[serde(default, with = "serde_thing::option")]
    pub id: Option<DonationId>,
    /// Record link to the owning campaign
    #[serde(with = "serde_thing")]
    pub campaign: Thing,
    pub amount: f64,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub donor_phone: Option<String>,
    #[serde(default)]
    pub donor_email: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: DonationStatus,
    /// Assigned by the gateway adapter, or synthesized (DEMO_/MANUAL_ prefix)
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Settlement reference reported by the provider
    #[serde(default)]
    pub bank_tran_id: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

/// Public donation flow payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationCreate {
    pub campaign_id: String,
    pub amount: f64,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub donor_phone: Option<String>,
    #[serde(default)]
    pub donor_email: Option<String>,
    pub payment_method: PaymentMethod,
}

/// Admin manual-entry payload (no gateway round trip)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualDonationCreate {
    pub campaign_id: String,
    pub amount: f64,
    #[serde(default)]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub donor_phone: Option<String>,
    #[serde(default)]
    pub donor_email: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!DonationStatus::Pending.is_terminal());
        assert!(DonationStatus::Completed.is_terminal());
        assert!(DonationStatus::Failed.is_terminal());
        assert!(DonationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&DonationStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
        let back: DonationStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(back, DonationStatus::Cancelled);
    }

    #[test]
    fn test_payment_method_round_trip() {
        let json = serde_json::to_string(&PaymentMethod::MobileBanking).unwrap();
        assert_eq!(json, "\"MOBILE_BANKING\"");
    }
}

//! Payment Gateway Adapter
//!
//! Encapsulates the upstream provider's request/response contract behind the
//! [`PaymentGateway`] trait. The concrete adapter ([`SslCommerzGateway`]) is
//! constructed from explicit configuration and injected through the server
//! state, so tests can substitute a scripted fake.

mod sslcommerz;

pub use sslcommerz::SslCommerzGateway;

use async_trait::async_trait;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::AppError;
use crate::utils::time;

/// Prefix marking synthetic transaction ids from the simulated payment path
pub const DEMO_TRAN_PREFIX: &str = "DEMO_";
/// Prefix marking admin manual-entry transaction ids
pub const MANUAL_TRAN_PREFIX: &str = "MANUAL_";

/// Provider credentials and mode
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub store_id: String,
    pub store_password: String,
    pub is_live: bool,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            store_id: std::env::var("SSLCOMMERZ_STORE_ID").unwrap_or_default(),
            store_password: std::env::var("SSLCOMMERZ_STORE_PASSWORD").unwrap_or_default(),
            is_live: std::env::var("SSLCOMMERZ_IS_LIVE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }

    /// Whether real credentials are present
    ///
    /// Empty or recognizably placeholder values mean the adapter must never
    /// attempt a live call and serves the simulated payment page instead.
    pub fn is_configured(&self) -> bool {
        const PLACEHOLDERS: &[&str] = &["demo-store", "your-store-id"];
        !self.store_id.is_empty()
            && !self.store_password.is_empty()
            && !PLACEHOLDERS.contains(&self.store_id.as_str())
    }
}

/// Callback URLs handed to the provider when opening a session
#[derive(Debug, Clone)]
pub struct CallbackUrls {
    pub success: String,
    pub fail: String,
    pub cancel: String,
    pub ipn: String,
}

impl CallbackUrls {
    pub fn from_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            success: format!("{base}/api/payment/success"),
            fail: format!("{base}/api/payment/fail"),
            cancel: format!("{base}/api/payment/cancel"),
            ipn: format!("{base}/api/payment/ipn"),
        }
    }
}

/// Donation intent handed to the adapter
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// Pure donation record key (no table prefix)
    pub donation_id: String,
    pub amount: f64,
    pub currency: String,
    pub campaign_title: String,
    pub donor_name: Option<String>,
    pub donor_email: Option<String>,
    pub donor_phone: Option<String>,
    pub payment_method: String,
}

/// Opened payment session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// Where to send the donor's browser
    pub redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    pub transaction_id: String,
    pub is_demo: bool,
}

/// Provider-confirmed payment facts
#[derive(Debug, Clone)]
pub struct ValidatedPayment {
    pub transaction_id: String,
    pub amount: f64,
    pub bank_tran_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway credentials are not configured")]
    Unconfigured,

    #[error("Gateway request failed: {0}")]
    Request(String),

    #[error("Gateway rejected the session: {0}")]
    Rejected(String),

    #[error("Payment validation failed: {0}")]
    Validation(String),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Validation(msg) => AppError::Reconciliation(msg),
            other => AppError::Gateway(other.to_string()),
        }
    }
}

/// Upstream payment provider seam
///
/// One implementation talks to the real provider; tests inject fakes.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment session for a PENDING donation
    async fn initiate_session(
        &self,
        request: &SessionRequest,
        urls: &CallbackUrls,
    ) -> Result<PaymentSession, GatewayError>;

    /// Confirm a transaction claimed as successful against the provider's
    /// server-side validation endpoint
    async fn validate_payment(
        &self,
        validation_id: &str,
        transaction_id: &str,
        amount: f64,
    ) -> Result<ValidatedPayment, GatewayError>;
}

/// Synthesize a live transaction id: `DON_<id-suffix>_<millis>_<rand>`
pub fn live_transaction_id(donation_id: &str) -> String {
    let suffix: String = donation_id
        .chars()
        .rev()
        .take(8)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("DON_{}_{}_{}", suffix, time::now_millis(), random).to_uppercase()
}

/// Synthesize a demo transaction id: `DEMO_<donation>_<millis>`
pub fn demo_transaction_id(donation_id: &str) -> String {
    format!("{DEMO_TRAN_PREFIX}{}_{}", donation_id, time::now_millis())
}

/// Synthesize a manual-entry transaction id: `MANUAL_<millis>`
pub fn manual_transaction_id() -> String {
    format!("{MANUAL_TRAN_PREFIX}{}", time::now_millis())
}

/// Whether a transaction id came from the simulated payment path
pub fn is_demo_transaction(transaction_id: &str) -> bool {
    transaction_id.starts_with(DEMO_TRAN_PREFIX)
}

/// Build the synthetic session used when the provider cannot be reached or is
/// not configured: the donor lands on the local simulated payment page.
pub fn demo_session(base_url: &str, request: &SessionRequest) -> PaymentSession {
    let base = base_url.trim_end_matches('/');
    let transaction_id = demo_transaction_id(&request.donation_id);
    PaymentSession {
        redirect_url: format!(
            "{base}/payment-demo?donation_id={}&amount={}&method={}",
            request.donation_id, request.amount, request.payment_method
        ),
        session_key: None,
        transaction_id,
        is_demo: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SessionRequest {
        SessionRequest {
            donation_id: "abc12345".to_string(),
            amount: 500.0,
            currency: "BDT".to_string(),
            campaign_title: "General Fund".to_string(),
            donor_name: None,
            donor_email: None,
            donor_phone: None,
            payment_method: "MOBILE_BANKING".to_string(),
        }
    }

    #[test]
    fn test_placeholder_credentials_are_unconfigured() {
        let cfg = GatewayConfig {
            store_id: "demo-store".to_string(),
            store_password: "demo-password".to_string(),
            is_live: false,
        };
        assert!(!cfg.is_configured());

        let cfg = GatewayConfig {
            store_id: String::new(),
            store_password: String::new(),
            is_live: false,
        };
        assert!(!cfg.is_configured());

        let cfg = GatewayConfig {
            store_id: "realstore01".to_string(),
            store_password: "s3cret".to_string(),
            is_live: true,
        };
        assert!(cfg.is_configured());
    }

    #[test]
    fn test_demo_session_marks_transaction_synthetic() {
        let session = demo_session("http://localhost:3000/", &request());
        assert!(session.is_demo);
        assert!(is_demo_transaction(&session.transaction_id));
        assert!(session.redirect_url.starts_with("http://localhost:3000/payment-demo?"));
        assert!(session.redirect_url.contains("donation_id=abc12345"));
    }

    #[test]
    fn test_callback_urls_from_base() {
        let urls = CallbackUrls::from_base("https://donate.example.org/");
        assert_eq!(urls.ipn, "https://donate.example.org/api/payment/ipn");
        assert_eq!(urls.success, "https://donate.example.org/api/payment/success");
    }

    #[test]
    fn test_transaction_id_prefixes() {
        assert!(is_demo_transaction(&demo_transaction_id("x1")));
        assert!(!is_demo_transaction(&live_transaction_id("x1")));
        assert!(manual_transaction_id().starts_with(MANUAL_TRAN_PREFIX));
    }
}

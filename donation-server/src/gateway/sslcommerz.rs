//! SSLCommerz adapter
//!
//! Form-encoded HTTP contract against the provider's session and validation
//! endpoints. When credentials are missing or placeholder values, or when a
//! live initiation fails, the adapter degrades to the local simulated payment
//! page so the donor journey stays completable.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::{
    CallbackUrls, GatewayConfig, GatewayError, PaymentGateway, PaymentSession, SessionRequest,
    ValidatedPayment, demo_session, live_transaction_id,
};

const SANDBOX_BASE: &str = "https://sandbox.sslcommerz.com";
const LIVE_BASE: &str = "https://securepay.sslcommerz.com";

/// Amount comparison tolerance: the provider echoes amounts as decimal strings
const AMOUNT_EPSILON: f64 = 0.01;

#[derive(Debug, Deserialize)]
struct InitiationResponse {
    status: String,
    #[serde(default)]
    failedreason: Option<String>,
    #[serde(default)]
    sessionkey: Option<String>,
    #[serde(default, rename = "GatewayPageURL")]
    gateway_page_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    status: String,
    #[serde(default)]
    tran_id: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    bank_tran_id: Option<String>,
}

/// Live SSLCommerz client with demo fallback
pub struct SslCommerzGateway {
    config: GatewayConfig,
    client: reqwest::Client,
    base_url: String,
    /// Public base URL of this server, used for demo redirects
    public_base_url: String,
}

impl SslCommerzGateway {
    pub fn new(config: GatewayConfig, public_base_url: String) -> Self {
        let base_url = if config.is_live {
            LIVE_BASE.to_string()
        } else {
            SANDBOX_BASE.to_string()
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            config,
            client,
            base_url,
            public_base_url,
        }
    }

    pub fn is_demo_mode(&self) -> bool {
        !self.config.is_configured()
    }

    async fn initiate_live(
        &self,
        request: &SessionRequest,
        urls: &CallbackUrls,
        transaction_id: &str,
    ) -> Result<PaymentSession, GatewayError> {
        let endpoint = format!("{}/gwprocess/v4/api.php", self.base_url);

        let amount = format!("{:.2}", request.amount);
        let form: Vec<(&str, &str)> = vec![
            ("store_id", &self.config.store_id),
            ("store_passwd", &self.config.store_password),
            ("total_amount", &amount),
            ("currency", &request.currency),
            ("tran_id", transaction_id),
            ("success_url", &urls.success),
            ("fail_url", &urls.fail),
            ("cancel_url", &urls.cancel),
            ("ipn_url", &urls.ipn),
            ("product_name", &request.campaign_title),
            ("product_category", "Donation"),
            ("product_profile", "general"),
            ("cus_name", request.donor_name.as_deref().unwrap_or("Anonymous")),
            (
                "cus_email",
                request.donor_email.as_deref().unwrap_or("donor@example.org"),
            ),
            ("cus_phone", request.donor_phone.as_deref().unwrap_or("")),
            ("cus_add1", "N/A"),
            ("cus_city", "N/A"),
            ("cus_country", "Bangladesh"),
            // value_a carries the donation id back through every callback
            ("value_a", &request.donation_id),
        ];

        let response = self
            .client
            .post(&endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Request(format!(
                "Session request returned HTTP {}",
                response.status()
            )));
        }

        let body: InitiationResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Request(format!("Malformed session response: {e}")))?;

        if !body.status.eq_ignore_ascii_case("SUCCESS") {
            return Err(GatewayError::Rejected(
                body.failedreason
                    .unwrap_or_else(|| format!("Provider returned status {}", body.status)),
            ));
        }

        let redirect_url = body.gateway_page_url.ok_or_else(|| {
            GatewayError::Rejected("Provider returned no gateway page URL".to_string())
        })?;

        Ok(PaymentSession {
            redirect_url,
            session_key: body.sessionkey,
            transaction_id: transaction_id.to_string(),
            is_demo: false,
        })
    }
}

#[async_trait]
impl PaymentGateway for SslCommerzGateway {
    async fn initiate_session(
        &self,
        request: &SessionRequest,
        urls: &CallbackUrls,
    ) -> Result<PaymentSession, GatewayError> {
        if self.is_demo_mode() {
            info!(
                donation_id = %request.donation_id,
                "Gateway credentials absent, serving simulated payment page"
            );
            return Ok(demo_session(&self.public_base_url, request));
        }

        let transaction_id = live_transaction_id(&request.donation_id);
        match self.initiate_live(request, urls, &transaction_id).await {
            Ok(session) => Ok(session),
            Err(e) => {
                // The donor still gets a completable journey
                warn!(
                    donation_id = %request.donation_id,
                    error = %e,
                    "Live session initiation failed, falling back to simulated payment"
                );
                Ok(demo_session(&self.public_base_url, request))
            }
        }
    }

    async fn validate_payment(
        &self,
        validation_id: &str,
        transaction_id: &str,
        amount: f64,
    ) -> Result<ValidatedPayment, GatewayError> {
        if self.is_demo_mode() {
            return Err(GatewayError::Unconfigured);
        }

        let endpoint = format!("{}/validator/api/validationserverAPI.php", self.base_url);
        let form: Vec<(&str, &str)> = vec![
            ("val_id", validation_id),
            ("store_id", &self.config.store_id),
            ("store_passwd", &self.config.store_password),
            ("format", "json"),
        ];

        let response = self
            .client
            .post(&endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Request(format!(
                "Validation request returned HTTP {}",
                response.status()
            )));
        }

        let body: ValidationResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Request(format!("Malformed validation response: {e}")))?;

        if !matches!(body.status.as_str(), "VALID" | "VALIDATED") {
            return Err(GatewayError::Validation(format!(
                "Provider reports transaction as {}",
                body.status
            )));
        }

        let reported_tran = body.tran_id.unwrap_or_default();
        if reported_tran != transaction_id {
            return Err(GatewayError::Validation(
                "Transaction id mismatch between callback and provider record".to_string(),
            ));
        }

        let reported_amount: f64 = body
            .amount
            .as_deref()
            .and_then(|a| a.parse().ok())
            .unwrap_or(-1.0);
        if (reported_amount - amount).abs() > AMOUNT_EPSILON {
            return Err(GatewayError::Validation(format!(
                "Amount mismatch: callback {amount}, provider {reported_amount}"
            )));
        }

        Ok(ValidatedPayment {
            transaction_id: reported_tran,
            amount: reported_amount,
            bank_tran_id: body.bank_tran_id,
        })
    }
}

//! Reconciliation Controller
//!
//! The state machine that moves a donation through its lifecycle in response
//! to gateway callbacks, and keeps campaign totals consistent with completed
//! donations.
//!
//! The provider only guarantees an asynchronous, possibly duplicated,
//! possibly out-of-order notification (browser redirect AND server-to-server
//! IPN may each signal success). Every callback is therefore treated as
//! idempotent with respect to final state: the aggregate adjustment is gated
//! inside the repository transaction on the stored status actually changing,
//! and callbacks never move a donation out of a terminal state.

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tracing::{info, warn};

use crate::db::models::{Donation, DonationCreate, DonationStatus, ManualDonationCreate};
use crate::db::repository::{CampaignRepository, DonationRepository};
use crate::gateway::{
    CallbackUrls, GatewayError, PaymentGateway, PaymentSession, SessionRequest,
    is_demo_transaction, manual_transaction_id,
};
use crate::utils::{AppError, AppResult};

/// Success-callback fields (browser redirect or provider POST)
#[derive(Debug, Clone)]
pub struct SuccessCallback {
    pub donation_id: String,
    pub validation_id: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub bank_tran_id: Option<String>,
}

/// IPN payload fields the controller cares about
#[derive(Debug, Clone)]
pub struct IpnNotification {
    pub donation_id: String,
    pub validation_id: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub bank_tran_id: Option<String>,
    /// Provider-reported outcome (VALID / VALIDATED / CANCELLED / FAILED ...)
    pub status: String,
}

/// Outcome of processing a success callback
#[derive(Debug)]
pub enum SuccessOutcome {
    Completed(Donation),
    /// Validation refused or errored; the donation is FAILED and the donor is
    /// redirected with this reason code.
    Failed {
        donation: Donation,
        reason: &'static str,
    },
}

#[derive(Clone)]
pub struct ReconciliationService {
    donations: DonationRepository,
    campaigns: CampaignRepository,
    gateway: Arc<dyn PaymentGateway>,
    base_url: String,
}

impl ReconciliationService {
    pub fn new(db: Surreal<Db>, gateway: Arc<dyn PaymentGateway>, base_url: String) -> Self {
        Self {
            donations: DonationRepository::new(db.clone()),
            campaigns: CampaignRepository::new(db),
            gateway,
            base_url,
        }
    }

    fn pure_id(donation: &Donation) -> String {
        donation
            .id
            .as_ref()
            .map(|t| t.id.to_string())
            .unwrap_or_default()
    }

    /// Public donation flow: create a PENDING record and open a payment
    /// session, persisting the assigned transaction id before the redirect.
    pub async fn begin_donation(
        &self,
        data: DonationCreate,
    ) -> AppResult<(Donation, PaymentSession)> {
        let donation = self.donations.create(data).await?;
        let donation_id = Self::pure_id(&donation);

        let campaign_title = self
            .campaigns
            .find_by_id(&donation.campaign.id.to_string())
            .await?
            .map(|c| c.title)
            .unwrap_or_else(|| "Donation".to_string());

        let request = SessionRequest {
            donation_id: donation_id.clone(),
            amount: donation.amount,
            currency: "BDT".to_string(),
            campaign_title,
            donor_name: donation.donor_name.clone(),
            donor_email: donation.donor_email.clone(),
            donor_phone: donation.donor_phone.clone(),
            payment_method: donation.payment_method.as_str().to_string(),
        };
        let urls = CallbackUrls::from_base(&self.base_url);

        let session = self.gateway.initiate_session(&request, &urls).await?;
        self.donations
            .set_transaction_id(&donation_id, &session.transaction_id)
            .await?;

        info!(
            donation_id = %donation_id,
            transaction_id = %session.transaction_id,
            is_demo = session.is_demo,
            "Payment session opened"
        );

        let donation = self
            .donations
            .find_by_id(&donation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Donation {donation_id} not found")))?;
        Ok((donation, session))
    }

    /// Admin manual entry: lands directly in COMPLETED, no gateway round trip
    pub async fn create_manual(&self, data: ManualDonationCreate) -> AppResult<Donation> {
        let donation = self
            .donations
            .create_manual(data, manual_transaction_id())
            .await?;
        info!(
            donation_id = %Self::pure_id(&donation),
            amount = donation.amount,
            "Manual donation recorded"
        );
        Ok(donation)
    }

    async fn load(&self, donation_id: &str) -> AppResult<Donation> {
        self.donations
            .find_by_id(donation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Donation {donation_id} not found")))
    }

    /// Callbacks never leave a terminal state. Returns the stored donation
    /// when the callback should be ignored (redelivery or late arrival).
    fn terminal_guard(donation: Donation, target: DonationStatus) -> Result<Donation, Donation> {
        if donation.status.is_terminal() {
            if donation.status != target {
                warn!(
                    donation_id = %Self::pure_id(&donation),
                    current = %donation.status,
                    requested = %target,
                    "Ignoring callback against terminal donation"
                );
            }
            return Err(donation);
        }
        Ok(donation)
    }

    /// Success callback (browser redirect or provider POST)
    ///
    /// Demo transactions are trusted as-is; live transactions are confirmed
    /// against the provider's validation endpoint first. Any validation
    /// failure (including transport errors, which are not retried) marks the
    /// donation FAILED.
    pub async fn record_success(&self, callback: SuccessCallback) -> AppResult<SuccessOutcome> {
        let donation = self.load(&callback.donation_id).await?;
        let donation = match Self::terminal_guard(donation, DonationStatus::Completed) {
            Ok(d) => d,
            // Redelivery of an already-settled callback: idempotent no-op
            Err(d) => return Ok(SuccessOutcome::Completed(d)),
        };
        let donation_id = Self::pure_id(&donation);

        // Demo-ness is decided by the transaction id persisted at session
        // initiation. The callback's own tran_id is unauthenticated input and
        // must not be able to bypass provider validation.
        let stored_tran_id = donation.transaction_id.clone();

        if let Some(transaction_id) = stored_tran_id
            .as_deref()
            .filter(|t| is_demo_transaction(t))
            .map(str::to_string)
        {
            let bank_tran_id = callback
                .bank_tran_id
                .clone()
                .unwrap_or_else(|| format!("DEMO_BANK_{transaction_id}"));
            let updated = self
                .donations
                .transition_status(
                    &donation_id,
                    DonationStatus::Completed,
                    Some(transaction_id),
                    Some(bank_tran_id),
                )
                .await?;
            return Ok(SuccessOutcome::Completed(updated));
        }

        let validation_id = match callback.validation_id.as_deref() {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                return Err(AppError::Validation(
                    "Missing validation id in success callback".to_string(),
                ));
            }
        };
        let amount = callback.amount.unwrap_or(donation.amount);
        // Only used for the equality check at the provider
        let transaction_id = stored_tran_id
            .or_else(|| callback.transaction_id.clone())
            .unwrap_or_default();

        match self
            .gateway
            .validate_payment(&validation_id, &transaction_id, amount)
            .await
        {
            Ok(validated) => {
                let updated = self
                    .donations
                    .transition_status(
                        &donation_id,
                        DonationStatus::Completed,
                        Some(validated.transaction_id),
                        validated.bank_tran_id,
                    )
                    .await?;
                Ok(SuccessOutcome::Completed(updated))
            }
            Err(e) => {
                // Transport errors and provider rejections are not
                // distinguished here, and neither is retried.
                let reason = match &e {
                    GatewayError::Validation(_) => "validation_failed",
                    _ => "validation_error",
                };
                warn!(
                    donation_id = %donation_id,
                    error = %e,
                    "Provider validation failed, marking donation FAILED"
                );
                let updated = self
                    .donations
                    .transition_status(&donation_id, DonationStatus::Failed, None, None)
                    .await?;
                Ok(SuccessOutcome::Failed {
                    donation: updated,
                    reason,
                })
            }
        }
    }

    /// Fail callback from the provider
    pub async fn record_failure(&self, donation_id: &str) -> AppResult<Donation> {
        let donation = self.load(donation_id).await?;
        let donation = match Self::terminal_guard(donation, DonationStatus::Failed) {
            Ok(d) => d,
            Err(d) => return Ok(d),
        };
        let id = Self::pure_id(&donation);
        Ok(self
            .donations
            .transition_status(&id, DonationStatus::Failed, None, None)
            .await?)
    }

    /// Cancel callback (donor-initiated or session timeout)
    pub async fn record_cancellation(&self, donation_id: &str) -> AppResult<Donation> {
        let donation = self.load(donation_id).await?;
        let donation = match Self::terminal_guard(donation, DonationStatus::Cancelled) {
            Ok(d) => d,
            Err(d) => return Ok(d),
        };
        let id = Self::pure_id(&donation);
        Ok(self
            .donations
            .transition_status(&id, DonationStatus::Cancelled, None, None)
            .await?)
    }

    /// Instant Payment Notification: server-to-server, independent of the
    /// donor's browser redirect. Validated like a success callback, then the
    /// provider-reported status decides the final state.
    pub async fn record_ipn(&self, notification: IpnNotification) -> AppResult<Donation> {
        let donation = self.load(&notification.donation_id).await?;
        let target = match notification.status.as_str() {
            "VALID" | "VALIDATED" => DonationStatus::Completed,
            "CANCELLED" => DonationStatus::Cancelled,
            _ => DonationStatus::Failed,
        };
        let donation = match Self::terminal_guard(donation, target) {
            Ok(d) => d,
            Err(d) => return Ok(d),
        };
        let donation_id = Self::pure_id(&donation);

        match target {
            DonationStatus::Completed => {
                let outcome = self
                    .record_success(SuccessCallback {
                        donation_id,
                        validation_id: notification.validation_id,
                        transaction_id: notification.transaction_id,
                        amount: notification.amount,
                        bank_tran_id: notification.bank_tran_id,
                    })
                    .await?;
                Ok(match outcome {
                    SuccessOutcome::Completed(d) => d,
                    SuccessOutcome::Failed { donation, .. } => donation,
                })
            }
            DonationStatus::Cancelled => self.record_cancellation(&donation_id).await,
            _ => self.record_failure(&donation_id).await,
        }
    }

    /// Admin direct status update
    ///
    /// This path may move a donation out of a terminal state (the observed
    /// back-office anomaly); the campaign aggregate is adjusted in the same
    /// transaction either way.
    pub async fn admin_update_status(
        &self,
        donation_id: &str,
        new_status: DonationStatus,
        transaction_id: Option<String>,
    ) -> AppResult<Donation> {
        Ok(self
            .donations
            .transition_status(donation_id, new_status, transaction_id, None)
            .await?)
    }

    pub fn donations(&self) -> &DonationRepository {
        &self.donations
    }

    pub fn campaigns(&self) -> &CampaignRepository {
        &self.campaigns
    }
}

//! Donation lifecycle integration tests
//!
//! Exercise the reconciliation state machine against an in-memory database
//! and scripted gateway fakes: callbacks settle donations, duplicates are
//! idempotent, and campaign aggregates stay equal to the sum of COMPLETED
//! donations.

use std::sync::Arc;

use async_trait::async_trait;
use donation_server::db::DbService;
use donation_server::db::models::{
    CampaignCreate, DonationCreate, DonationStatus, ManualDonationCreate, PaymentMethod,
};
use donation_server::db::repository::CampaignRepository;
use donation_server::gateway::{
    CallbackUrls, GatewayError, PaymentGateway, PaymentSession, SessionRequest, ValidatedPayment,
    demo_transaction_id, live_transaction_id,
};
use donation_server::reconcile::{
    IpnNotification, ReconciliationService, SuccessCallback, SuccessOutcome,
};

/// Gateway fake that always opens a demo session, mirroring the
/// unconfigured-credentials path.
struct DemoGateway;

#[async_trait]
impl PaymentGateway for DemoGateway {
    async fn initiate_session(
        &self,
        request: &SessionRequest,
        _urls: &CallbackUrls,
    ) -> Result<PaymentSession, GatewayError> {
        Ok(PaymentSession {
            redirect_url: format!("http://localhost:3000/payment-demo?donation_id={}", request.donation_id),
            session_key: None,
            transaction_id: demo_transaction_id(&request.donation_id),
            is_demo: true,
        })
    }

    async fn validate_payment(
        &self,
        _validation_id: &str,
        _transaction_id: &str,
        _amount: f64,
    ) -> Result<ValidatedPayment, GatewayError> {
        Err(GatewayError::Unconfigured)
    }
}

/// Gateway fake that opens live-looking sessions and follows a script for
/// validation.
struct LiveGateway {
    validation: Result<(), GatewayError>,
}

#[async_trait]
impl PaymentGateway for LiveGateway {
    async fn initiate_session(
        &self,
        request: &SessionRequest,
        _urls: &CallbackUrls,
    ) -> Result<PaymentSession, GatewayError> {
        Ok(PaymentSession {
            redirect_url: "https://sandbox.sslcommerz.com/pay".to_string(),
            session_key: Some("SESSION123".to_string()),
            transaction_id: live_transaction_id(&request.donation_id),
            is_demo: false,
        })
    }

    async fn validate_payment(
        &self,
        _validation_id: &str,
        transaction_id: &str,
        amount: f64,
    ) -> Result<ValidatedPayment, GatewayError> {
        match &self.validation {
            Ok(()) => Ok(ValidatedPayment {
                transaction_id: transaction_id.to_string(),
                amount,
                bank_tran_id: Some("BANK123".to_string()),
            }),
            Err(GatewayError::Validation(msg)) => Err(GatewayError::Validation(msg.clone())),
            Err(_) => Err(GatewayError::Request("connection refused".to_string())),
        }
    }
}

async fn setup(gateway: Arc<dyn PaymentGateway>) -> (DbService, ReconciliationService, String) {
    let db = DbService::new_in_memory()
        .await
        .expect("Failed to open in-memory database");
    let service = ReconciliationService::new(
        db.db.clone(),
        gateway,
        "http://localhost:3000".to_string(),
    );

    let campaigns = CampaignRepository::new(db.db.clone());
    let campaign = campaigns
        .create(CampaignCreate {
            title: "Winter Relief".to_string(),
            description: "Blankets and food for flood-affected families".to_string(),
            target_amount: 100_000.0,
            is_active: Some(true),
        })
        .await
        .expect("Failed to create campaign");
    let campaign_id = campaign
        .id
        .expect("Created campaign has no id")
        .id
        .to_string();

    (db, service, campaign_id)
}

fn donation_request(campaign_id: &str, amount: f64) -> DonationCreate {
    DonationCreate {
        campaign_id: campaign_id.to_string(),
        amount,
        donor_name: Some("Rahim".to_string()),
        donor_phone: Some("+8801700000000".to_string()),
        donor_email: Some("rahim@example.org".to_string()),
        payment_method: PaymentMethod::MobileBanking,
    }
}

async fn raised_amount(db: &DbService, campaign_id: &str) -> f64 {
    CampaignRepository::new(db.db.clone())
        .find_by_id(campaign_id)
        .await
        .expect("Failed to load campaign")
        .expect("Campaign disappeared")
        .raised_amount
}

fn pure_id(donation: &donation_server::db::models::Donation) -> String {
    donation
        .id
        .as_ref()
        .expect("Donation has no id")
        .id
        .to_string()
}

#[tokio::test]
async fn test_demo_donation_completes_and_raises_campaign_total() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (donation, session) = service
        .begin_donation(donation_request(&campaign_id, 500.0))
        .await
        .expect("Failed to begin donation");

    assert_eq!(donation.status, DonationStatus::Pending);
    assert!(session.is_demo);
    assert!(donation
        .transaction_id
        .as_deref()
        .unwrap()
        .starts_with("DEMO_"));
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);

    let outcome = service
        .record_success(SuccessCallback {
            donation_id: pure_id(&donation),
            validation_id: None,
            transaction_id: None,
            amount: None,
            bank_tran_id: None,
        })
        .await
        .expect("Success callback failed");

    let completed = match outcome {
        SuccessOutcome::Completed(d) => d,
        SuccessOutcome::Failed { .. } => panic!("Demo success callback should complete"),
    };
    assert_eq!(completed.status, DonationStatus::Completed);
    assert!(completed.bank_tran_id.is_some());
    assert_eq!(raised_amount(&db, &campaign_id).await, 500.0);
}

#[tokio::test]
async fn test_duplicate_success_callback_is_idempotent() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (donation, _) = service
        .begin_donation(donation_request(&campaign_id, 750.0))
        .await
        .expect("Failed to begin donation");
    let callback = SuccessCallback {
        donation_id: pure_id(&donation),
        validation_id: None,
        transaction_id: None,
        amount: None,
        bank_tran_id: None,
    };

    service
        .record_success(callback.clone())
        .await
        .expect("First success callback failed");
    service
        .record_success(callback.clone())
        .await
        .expect("Second success callback failed");
    service
        .record_success(callback)
        .await
        .expect("Third success callback failed");

    // The aggregate counted the donation exactly once
    assert_eq!(raised_amount(&db, &campaign_id).await, 750.0);
}

#[tokio::test]
async fn test_failure_then_late_success_is_ignored() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (donation, _) = service
        .begin_donation(donation_request(&campaign_id, 300.0))
        .await
        .expect("Failed to begin donation");
    let donation_id = pure_id(&donation);

    let failed = service
        .record_failure(&donation_id)
        .await
        .expect("Fail callback failed");
    assert_eq!(failed.status, DonationStatus::Failed);

    // Late success callback against a terminal donation changes nothing
    let outcome = service
        .record_success(SuccessCallback {
            donation_id: donation_id.clone(),
            validation_id: None,
            transaction_id: None,
            amount: None,
            bank_tran_id: None,
        })
        .await
        .expect("Late success callback errored");

    match outcome {
        SuccessOutcome::Completed(d) => assert_eq!(d.status, DonationStatus::Failed),
        SuccessOutcome::Failed { .. } => panic!("Guard should return the stored donation"),
    }
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);
}

#[tokio::test]
async fn test_cancellation_settles_without_raising() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (donation, _) = service
        .begin_donation(donation_request(&campaign_id, 200.0))
        .await
        .expect("Failed to begin donation");

    let cancelled = service
        .record_cancellation(&pure_id(&donation))
        .await
        .expect("Cancel callback failed");
    assert_eq!(cancelled.status, DonationStatus::Cancelled);
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);
}

#[tokio::test]
async fn test_live_validation_rejection_marks_donation_failed() {
    let gateway = Arc::new(LiveGateway {
        validation: Err(GatewayError::Validation("amount mismatch".to_string())),
    });
    let (db, service, campaign_id) = setup(gateway).await;

    let (donation, session) = service
        .begin_donation(donation_request(&campaign_id, 1000.0))
        .await
        .expect("Failed to begin donation");
    assert!(!session.is_demo);

    let outcome = service
        .record_success(SuccessCallback {
            donation_id: pure_id(&donation),
            validation_id: Some("VAL123".to_string()),
            transaction_id: session.transaction_id.clone().into(),
            amount: Some(1000.0),
            bank_tran_id: None,
        })
        .await
        .expect("Success callback errored");

    match outcome {
        SuccessOutcome::Failed { donation, reason } => {
            assert_eq!(donation.status, DonationStatus::Failed);
            assert_eq!(reason, "validation_failed");
        }
        SuccessOutcome::Completed(_) => panic!("Rejected validation must not complete"),
    }
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);
}

#[tokio::test]
async fn test_live_validation_success_completes() {
    let gateway = Arc::new(LiveGateway { validation: Ok(()) });
    let (db, service, campaign_id) = setup(gateway).await;

    let (donation, session) = service
        .begin_donation(donation_request(&campaign_id, 1200.0))
        .await
        .expect("Failed to begin donation");

    let outcome = service
        .record_success(SuccessCallback {
            donation_id: pure_id(&donation),
            validation_id: Some("VAL123".to_string()),
            transaction_id: Some(session.transaction_id.clone()),
            amount: Some(1200.0),
            bank_tran_id: None,
        })
        .await
        .expect("Success callback errored");

    match outcome {
        SuccessOutcome::Completed(d) => {
            assert_eq!(d.status, DonationStatus::Completed);
            assert_eq!(d.bank_tran_id.as_deref(), Some("BANK123"));
        }
        SuccessOutcome::Failed { .. } => panic!("Valid payment must complete"),
    }
    assert_eq!(raised_amount(&db, &campaign_id).await, 1200.0);
}

#[tokio::test]
async fn test_manual_donation_lands_completed() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let donation = service
        .create_manual(ManualDonationCreate {
            campaign_id: campaign_id.clone(),
            amount: 5000.0,
            donor_name: Some("Karim".to_string()),
            donor_phone: None,
            donor_email: None,
            payment_method: Some(PaymentMethod::Cash),
            notes: Some("Collected at Friday event".to_string()),
        })
        .await
        .expect("Failed to record manual donation");

    assert_eq!(donation.status, DonationStatus::Completed);
    assert!(donation
        .transaction_id
        .as_deref()
        .unwrap()
        .starts_with("MANUAL_"));
    assert_eq!(
        donation.bank_tran_id.as_deref(),
        Some("MANUAL: Collected at Friday event")
    );
    assert_eq!(raised_amount(&db, &campaign_id).await, 5000.0);
}

#[tokio::test]
async fn test_admin_downgrade_decrements_aggregate() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (donation, _) = service
        .begin_donation(donation_request(&campaign_id, 600.0))
        .await
        .expect("Failed to begin donation");
    let donation_id = pure_id(&donation);

    service
        .record_success(SuccessCallback {
            donation_id: donation_id.clone(),
            validation_id: None,
            transaction_id: None,
            amount: None,
            bank_tran_id: None,
        })
        .await
        .expect("Success callback failed");
    assert_eq!(raised_amount(&db, &campaign_id).await, 600.0);

    // Back-office correction moves it out of COMPLETED
    let failed = service
        .admin_update_status(&donation_id, DonationStatus::Failed, None)
        .await
        .expect("Admin status update failed");
    assert_eq!(failed.status, DonationStatus::Failed);
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);

    // And back in again counts it exactly once
    service
        .admin_update_status(&donation_id, DonationStatus::Completed, None)
        .await
        .expect("Admin status update failed");
    assert_eq!(raised_amount(&db, &campaign_id).await, 600.0);
}

#[tokio::test]
async fn test_donation_to_inactive_campaign_rejected() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let campaigns = CampaignRepository::new(db.db.clone());
    campaigns
        .update(
            &campaign_id,
            donation_server::db::models::CampaignUpdate {
                title: None,
                description: None,
                target_amount: None,
                is_active: Some(false),
            },
        )
        .await
        .expect("Failed to deactivate campaign");

    let result = service
        .begin_donation(donation_request(&campaign_id, 100.0))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_reconcile_repairs_drifted_aggregate() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (donation, _) = service
        .begin_donation(donation_request(&campaign_id, 900.0))
        .await
        .expect("Failed to begin donation");
    service
        .record_success(SuccessCallback {
            donation_id: pure_id(&donation),
            validation_id: None,
            transaction_id: None,
            amount: None,
            bank_tran_id: None,
        })
        .await
        .expect("Success callback failed");

    // Corrupt the stored aggregate directly
    db.db
        .query("UPDATE campaign SET raised_amount = 123456.0")
        .await
        .expect("Failed to corrupt aggregate");
    assert_eq!(raised_amount(&db, &campaign_id).await, 123456.0);

    let campaigns = CampaignRepository::new(db.db.clone());
    let repaired = campaigns
        .reconcile_raised_amount(&campaign_id)
        .await
        .expect("Reconcile failed");
    assert_eq!(repaired.raised_amount, 900.0);

    // Idempotent: running it again changes nothing
    let again = campaigns
        .reconcile_raised_amount(&campaign_id)
        .await
        .expect("Second reconcile failed");
    assert_eq!(again.raised_amount, 900.0);
}

#[tokio::test]
async fn test_forged_demo_transaction_id_does_not_skip_validation() {
    let gateway = Arc::new(LiveGateway {
        validation: Err(GatewayError::Validation("unknown transaction".to_string())),
    });
    let (db, service, campaign_id) = setup(gateway).await;

    let (donation, session) = service
        .begin_donation(donation_request(&campaign_id, 500.0))
        .await
        .expect("Failed to begin donation");
    assert!(!session.is_demo);

    // A caller-supplied DEMO_ transaction id must not bypass validation;
    // demo-ness comes from the id stored at session initiation
    let outcome = service
        .record_success(SuccessCallback {
            donation_id: pure_id(&donation),
            validation_id: Some("VAL123".to_string()),
            transaction_id: Some("DEMO_forged".to_string()),
            amount: Some(500.0),
            bank_tran_id: None,
        })
        .await
        .expect("Success callback errored");
    match outcome {
        SuccessOutcome::Failed { donation, reason } => {
            assert_eq!(donation.status, DonationStatus::Failed);
            assert_eq!(reason, "validation_failed");
        }
        SuccessOutcome::Completed(_) => panic!("Forged transaction id must not complete"),
    }
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);

    // Same forged claim without a validation id is rejected outright
    let (donation, _) = service
        .begin_donation(donation_request(&campaign_id, 400.0))
        .await
        .expect("Failed to begin donation");
    let result = service
        .record_success(SuccessCallback {
            donation_id: pure_id(&donation),
            validation_id: None,
            transaction_id: Some("DEMO_forged".to_string()),
            amount: None,
            bank_tran_id: None,
        })
        .await;
    assert!(result.is_err());
    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);
}

#[tokio::test]
async fn test_ipn_valid_completes_and_redelivery_is_idempotent() {
    let gateway = Arc::new(LiveGateway { validation: Ok(()) });
    let (db, service, campaign_id) = setup(gateway).await;

    let (donation, session) = service
        .begin_donation(donation_request(&campaign_id, 900.0))
        .await
        .expect("Failed to begin donation");
    let notification = IpnNotification {
        donation_id: pure_id(&donation),
        validation_id: Some("VAL123".to_string()),
        transaction_id: Some(session.transaction_id.clone()),
        amount: Some(900.0),
        bank_tran_id: None,
        status: "VALID".to_string(),
    };

    let settled = service
        .record_ipn(notification.clone())
        .await
        .expect("IPN processing failed");
    assert_eq!(settled.status, DonationStatus::Completed);
    assert_eq!(settled.bank_tran_id.as_deref(), Some("BANK123"));
    assert_eq!(raised_amount(&db, &campaign_id).await, 900.0);

    // Provider redelivery of the same notification counts nothing twice
    let again = service
        .record_ipn(notification)
        .await
        .expect("IPN redelivery failed");
    assert_eq!(again.status, DonationStatus::Completed);
    assert_eq!(raised_amount(&db, &campaign_id).await, 900.0);
}

#[tokio::test]
async fn test_ipn_cancelled_and_failed_statuses_settle_without_raising() {
    let (db, service, campaign_id) = setup(Arc::new(DemoGateway)).await;

    let (first, _) = service
        .begin_donation(donation_request(&campaign_id, 250.0))
        .await
        .expect("Failed to begin donation");
    let cancelled = service
        .record_ipn(IpnNotification {
            donation_id: pure_id(&first),
            validation_id: Some("VAL1".to_string()),
            transaction_id: first.transaction_id.clone(),
            amount: Some(250.0),
            bank_tran_id: None,
            status: "CANCELLED".to_string(),
        })
        .await
        .expect("Cancelled IPN failed");
    assert_eq!(cancelled.status, DonationStatus::Cancelled);

    let (second, _) = service
        .begin_donation(donation_request(&campaign_id, 350.0))
        .await
        .expect("Failed to begin donation");
    let failed = service
        .record_ipn(IpnNotification {
            donation_id: pure_id(&second),
            validation_id: Some("VAL2".to_string()),
            transaction_id: second.transaction_id.clone(),
            amount: Some(350.0),
            bank_tran_id: None,
            status: "FAILED".to_string(),
        })
        .await
        .expect("Failed IPN failed");
    assert_eq!(failed.status, DonationStatus::Failed);

    assert_eq!(raised_amount(&db, &campaign_id).await, 0.0);
}

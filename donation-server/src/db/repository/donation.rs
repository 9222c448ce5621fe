//! Donation Repository
//!
//! Owns donation rows and their status transitions. The transition path and
//! the campaign aggregate adjustment run inside one database transaction so
//! duplicate provider callbacks can never double-count a donation.

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{
    Donation, DonationCreate, DonationStatus, ManualDonationCreate, PaymentMethod,
};
use crate::utils::time;
use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use surrealdb::sql::Thing;

const TABLE: &str = "donation";
const CAMPAIGN_TABLE: &str = "campaign";

#[derive(Clone)]
pub struct DonationRepository {
    base: BaseRepository,
}

impl DonationRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn campaign_is_active(&self, campaign: &Thing) -> RepoResult<Option<bool>> {
        let mut result = self
            .base
            .db()
            .query("SELECT is_active FROM $campaign")
            .bind(("campaign", campaign.clone()))
            .await?;
        let active: Option<bool> = result.take((0, "is_active"))?;
        Ok(active)
    }

    /// Create a donation in PENDING via the public flow
    ///
    /// Fails with a validation error when the amount is not positive or the
    /// campaign is missing or inactive. No record is created in either case.
    pub async fn create(&self, data: DonationCreate) -> RepoResult<Donation> {
        if data.amount <= 0.0 {
            return Err(RepoError::Validation(
                "Donation amount must be greater than 0".to_string(),
            ));
        }

        let campaign = make_thing(
            CAMPAIGN_TABLE,
            strip_table_prefix(CAMPAIGN_TABLE, &data.campaign_id),
        );
        match self.campaign_is_active(&campaign).await? {
            Some(true) => {}
            Some(false) => {
                return Err(RepoError::Validation(format!(
                    "Campaign {} is not active",
                    data.campaign_id
                )));
            }
            None => {
                return Err(RepoError::Validation(format!(
                    "Campaign {} not found",
                    data.campaign_id
                )));
            }
        }

        let now = time::now_millis();
        let donation = Donation {
            id: None,
            campaign,
            amount: data.amount,
            donor_name: data.donor_name,
            donor_phone: data.donor_phone,
            donor_email: data.donor_email,
            payment_method: data.payment_method,
            status: DonationStatus::Pending,
            transaction_id: None,
            bank_tran_id: None,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Donation> = self.base.db().create(TABLE).content(donation).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create donation".to_string()))
    }

    /// Create a donation directly in COMPLETED (admin manual entry)
    ///
    /// The insert and the campaign aggregate increment run in one transaction;
    /// there is no gateway round trip.
    pub async fn create_manual(
        &self,
        data: ManualDonationCreate,
        transaction_id: String,
    ) -> RepoResult<Donation> {
        if data.amount <= 0.0 {
            return Err(RepoError::Validation(
                "Donation amount must be greater than 0".to_string(),
            ));
        }

        let campaign = make_thing(
            CAMPAIGN_TABLE,
            strip_table_prefix(CAMPAIGN_TABLE, &data.campaign_id),
        );
        if self.campaign_is_active(&campaign).await?.is_none() {
            return Err(RepoError::Validation(format!(
                "Campaign {} not found",
                data.campaign_id
            )));
        }

        let now = time::now_millis();
        let donation = Donation {
            id: None,
            campaign: campaign.clone(),
            amount: data.amount,
            donor_name: data.donor_name,
            donor_phone: data.donor_phone,
            donor_email: data.donor_email,
            payment_method: data.payment_method.unwrap_or(PaymentMethod::BankTransfer),
            status: DonationStatus::Completed,
            transaction_id: Some(transaction_id),
            bank_tran_id: data.notes.map(|n| format!("MANUAL: {n}")),
            created_at: now,
            updated_at: now,
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"
                BEGIN TRANSACTION;
                CREATE donation CONTENT $data;
                UPDATE $campaign SET raised_amount += $amount, updated_at = $now;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("data", donation))
            .bind(("campaign", campaign))
            .bind(("amount", data.amount))
            .bind(("now", now))
            .await?;

        let created: Vec<Donation> = result.take(0)?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("Failed to create manual donation".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Donation>> {
        let pure_id = strip_table_prefix(TABLE, id);
        let donation: Option<Donation> = self.base.db().select((TABLE, pure_id)).await?;
        Ok(donation)
    }

    /// Persist the gateway-assigned transaction id on a PENDING donation
    pub async fn set_transaction_id(&self, id: &str, transaction_id: &str) -> RepoResult<()> {
        let pure_id = strip_table_prefix(TABLE, id);
        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query("UPDATE $donation SET transaction_id = $tran_id, updated_at = $now")
            .bind(("donation", thing))
            .bind(("tran_id", transaction_id.to_string()))
            .bind(("now", time::now_millis()))
            .await?;
        Ok(())
    }

    /// Transition a donation's status, keeping the campaign aggregate in step
    ///
    /// The status comparison and the raised-amount adjustment execute as a
    /// single transaction: the increment fires only when the stored status
    /// actually moves into COMPLETED, the decrement only when it moves out.
    /// Setting the same status again is a no-op for the aggregate, which makes
    /// duplicate success callbacks idempotent.
    pub async fn transition_status(
        &self,
        id: &str,
        new_status: DonationStatus,
        transaction_id: Option<String>,
        bank_tran_id: Option<String>,
    ) -> RepoResult<Donation> {
        let pure_id = strip_table_prefix(TABLE, id);
        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Donation {id} not found")))?;

        #[derive(Serialize)]
        struct StatusPatch {
            status: DonationStatus,
            #[serde(skip_serializing_if = "Option::is_none")]
            transaction_id: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            bank_tran_id: Option<String>,
            updated_at: i64,
        }

        let patch = StatusPatch {
            status: new_status,
            transaction_id,
            bank_tran_id,
            updated_at: time::now_millis(),
        };

        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query(
                r#"
                BEGIN TRANSACTION;
                LET $don = (SELECT * FROM ONLY $donation);
                LET $camp = type::record($don.campaign);
                IF $don.status != $status {
                    IF $status = 'COMPLETED' {
                        UPDATE $camp SET raised_amount += $don.amount, updated_at = $now;
                    };
                    IF $don.status = 'COMPLETED' {
                        UPDATE $camp SET raised_amount -= $don.amount, updated_at = $now;
                    };
                };
                UPDATE $donation MERGE $patch;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("donation", thing))
            .bind(("status", new_status))
            .bind(("patch", patch))
            .bind(("now", time::now_millis()))
            .await?;

        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Donation {id} not found")))
    }

    /// Most recent donations for the admin ledger
    pub async fn find_recent(&self, limit: usize) -> RepoResult<Vec<Donation>> {
        let donations: Vec<Donation> = self
            .base
            .db()
            .query("SELECT * FROM donation ORDER BY created_at DESC LIMIT $limit")
            .bind(("limit", limit))
            .await?
            .take(0)?;
        Ok(donations)
    }

    /// COMPLETED donations created in `[from, to)` (reporting feed)
    pub async fn find_completed_between(&self, from: i64, to: i64) -> RepoResult<Vec<Donation>> {
        let donations: Vec<Donation> = self
            .base
            .db()
            .query(
                "SELECT * FROM donation \
                 WHERE status = 'COMPLETED' AND created_at >= $from AND created_at < $to \
                 ORDER BY created_at ASC",
            )
            .bind(("from", from))
            .bind(("to", to))
            .await?
            .take(0)?;
        Ok(donations)
    }

    /// All COMPLETED donations (dashboard totals)
    pub async fn find_completed(&self) -> RepoResult<Vec<Donation>> {
        let donations: Vec<Donation> = self
            .base
            .db()
            .query("SELECT * FROM donation WHERE status = 'COMPLETED' ORDER BY created_at ASC")
            .await?
            .take(0)?;
        Ok(donations)
    }
}

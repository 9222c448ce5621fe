//! Campaign Repository

use super::{BaseRepository, RepoError, RepoResult, make_thing, strip_table_prefix};
use crate::db::models::{Campaign, CampaignCreate, CampaignUpdate};
use crate::utils::time;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "campaign";

#[derive(Clone)]
pub struct CampaignRepository {
    base: BaseRepository,
}

impl CampaignRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// All campaigns, newest first (admin listing)
    pub async fn find_all(&self) -> RepoResult<Vec<Campaign>> {
        let campaigns: Vec<Campaign> = self
            .base
            .db()
            .query("SELECT * FROM campaign ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(campaigns)
    }

    /// Active campaigns only (public donor-facing listing)
    pub async fn find_active(&self) -> RepoResult<Vec<Campaign>> {
        let campaigns: Vec<Campaign> = self
            .base
            .db()
            .query("SELECT * FROM campaign WHERE is_active = true ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(campaigns)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Campaign>> {
        let pure_id = strip_table_prefix(TABLE, id);
        let campaign: Option<Campaign> = self.base.db().select((TABLE, pure_id)).await?;
        Ok(campaign)
    }

    /// Create a new campaign
    ///
    /// Title and description are required; target amount must be positive.
    pub async fn create(&self, data: CampaignCreate) -> RepoResult<Campaign> {
        if data.title.trim().is_empty() || data.description.trim().is_empty() {
            return Err(RepoError::Validation(
                "Title and description are required".to_string(),
            ));
        }
        if data.target_amount <= 0.0 {
            return Err(RepoError::Validation(
                "Target amount must be greater than 0".to_string(),
            ));
        }

        let now = time::now_millis();
        let campaign = Campaign {
            id: None,
            title: data.title,
            description: data.description,
            target_amount: data.target_amount,
            raised_amount: 0.0,
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        let created: Option<Campaign> = self.base.db().create(TABLE).content(campaign).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create campaign".to_string()))
    }

    /// Update a campaign
    ///
    /// `raised_amount` is deliberately not updatable here; it is owned by the
    /// reconciliation paths.
    pub async fn update(&self, id: &str, data: CampaignUpdate) -> RepoResult<Campaign> {
        let pure_id = strip_table_prefix(TABLE, id);
        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))?;

        if let Some(ref title) = data.title
            && title.trim().is_empty()
        {
            return Err(RepoError::Validation("Title is required".to_string()));
        }
        if let Some(ref description) = data.description
            && description.trim().is_empty()
        {
            return Err(RepoError::Validation("Description is required".to_string()));
        }
        if let Some(target) = data.target_amount
            && target <= 0.0
        {
            return Err(RepoError::Validation(
                "Target amount must be greater than 0".to_string(),
            ));
        }

        #[derive(Serialize)]
        struct CampaignUpdateDb {
            #[serde(skip_serializing_if = "Option::is_none")]
            title: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            target_amount: Option<f64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            is_active: Option<bool>,
            updated_at: i64,
        }

        let update_data = CampaignUpdateDb {
            title: data.title,
            description: data.description,
            target_amount: data.target_amount,
            is_active: data.is_active,
            updated_at: time::now_millis(),
        };

        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query("UPDATE $thing MERGE $data")
            .bind(("thing", thing))
            .bind(("data", update_data))
            .await?;

        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))
    }

    /// Number of donations referencing this campaign (any status)
    ///
    /// Donation rows store the link as a "campaign:id" string.
    pub async fn donation_count(&self, id: &str) -> RepoResult<i64> {
        let pure_id = strip_table_prefix(TABLE, id);
        let key = make_thing(TABLE, pure_id).to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT count() FROM donation WHERE campaign = $campaign GROUP ALL")
            .bind(("campaign", key))
            .await?;
        let count: Option<i64> = result.take((0, "count"))?;
        Ok(count.unwrap_or(0))
    }

    /// Hard delete a campaign
    ///
    /// Refused while any donation still references it.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let pure_id = strip_table_prefix(TABLE, id);
        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))?;

        let referencing = self.donation_count(pure_id).await?;
        if referencing > 0 {
            return Err(RepoError::Conflict(format!(
                "Cannot delete campaign with {referencing} associated donations"
            )));
        }

        let thing = make_thing(TABLE, pure_id);
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;

        Ok(true)
    }

    /// Recompute `raised_amount` from COMPLETED donations and overwrite it
    ///
    /// Single-statement repair for aggregate drift; idempotent, safe to run
    /// before any read that needs strong consistency.
    pub async fn reconcile_raised_amount(&self, id: &str) -> RepoResult<Campaign> {
        let pure_id = strip_table_prefix(TABLE, id);
        let thing = make_thing(TABLE, pure_id);
        let key = thing.to_string();
        self.base
            .db()
            .query(
                r#"
                UPDATE $campaign SET
                    raised_amount = math::sum(
                        SELECT VALUE amount FROM donation
                        WHERE campaign = $campaign_key AND status = 'COMPLETED'
                    ),
                    updated_at = $now
                "#,
            )
            .bind(("campaign", thing))
            .bind(("campaign_key", key))
            .bind(("now", time::now_millis()))
            .await?;

        self.find_by_id(pure_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Campaign {id} not found")))
    }

    /// Repair every campaign's raised amount
    pub async fn reconcile_all(&self) -> RepoResult<()> {
        let campaigns = self.find_all().await?;
        for campaign in campaigns {
            if let Some(id) = campaign.id {
                self.reconcile_raised_amount(&id.id.to_string()).await?;
            }
        }
        Ok(())
    }

    /// Completed-donation counts grouped by campaign, keyed by "campaign:id"
    pub async fn completed_donation_counts(&self) -> RepoResult<HashMap<String, i64>> {
        #[derive(Deserialize)]
        struct CountRow {
            campaign: String,
            count: i64,
        }

        let rows: Vec<CountRow> = self
            .base
            .db()
            .query(
                "SELECT campaign, count() AS count FROM donation \
                 WHERE status = 'COMPLETED' GROUP BY campaign",
            )
            .await?
            .take(0)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.campaign, row.count))
            .collect())
    }
}

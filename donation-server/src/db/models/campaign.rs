//! Campaign Model

use super::serde_thing;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

pub type CampaignId = Thing;

/// Fundraising campaign
///
/// `raised_amount` is a materialized total over COMPLETED donations. It is
/// mutated only through the reconciliation paths and can be repaired at any
/// time with `CampaignRepository::reconcile_raised_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default, with = "serde_thing::option")]
    pub id: Option<CampaignId>,
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    #[serde(default)]
    pub raised_amount: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Unix milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignCreate {
    pub title: String,
    pub description: String,
    pub target_amount: f64,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

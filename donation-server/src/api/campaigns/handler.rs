//! Campaign API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::{Campaign, CampaignCreate, CampaignUpdate};
use crate::db::repository::CampaignRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// Campaign row plus its completed-donation count (admin listing)
#[derive(Serialize)]
pub struct CampaignWithCount {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub donation_count: i64,
}

/// GET /api/campaigns - active campaigns for the public site
pub async fn list_active(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<Campaign>>>> {
    let repo = CampaignRepository::new(state.db.clone());
    let campaigns = repo.find_active().await?;
    Ok(ok(campaigns))
}

/// GET /api/campaigns/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Campaign>>> {
    let repo = CampaignRepository::new(state.db.clone());
    let campaign = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Campaign {id} not found")))?;
    Ok(ok(campaign))
}

/// GET /api/admin/campaigns - all campaigns with donation counts
///
/// Raised amounts are recomputed from COMPLETED donations before the read, so
/// the back office always sees repaired aggregates.
pub async fn list_all(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<Vec<CampaignWithCount>>>> {
    let repo = CampaignRepository::new(state.db.clone());
    repo.reconcile_all().await?;

    let campaigns = repo.find_all().await?;
    let counts = repo.completed_donation_counts().await?;

    let listed = campaigns
        .into_iter()
        .map(|campaign| {
            let donation_count = campaign
                .id
                .as_ref()
                .and_then(|id| counts.get(&id.to_string()))
                .copied()
                .unwrap_or(0);
            CampaignWithCount {
                campaign,
                donation_count,
            }
        })
        .collect();

    Ok(ok(listed))
}

/// POST /api/admin/campaigns
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CampaignCreate>,
) -> AppResult<Json<AppResponse<Campaign>>> {
    let repo = CampaignRepository::new(state.db.clone());
    let campaign = repo.create(payload).await?;
    Ok(ok(campaign))
}

/// PUT /api/admin/campaigns/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<CampaignUpdate>,
) -> AppResult<Json<AppResponse<Campaign>>> {
    let repo = CampaignRepository::new(state.db.clone());
    let campaign = repo.update(&id, payload).await?;
    Ok(ok(campaign))
}

/// DELETE /api/admin/campaigns/{id}
///
/// Refused with 409 while donations still reference the campaign.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    let repo = CampaignRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;
    Ok(ok_with_message(deleted, "Campaign deleted"))
}

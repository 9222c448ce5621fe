//! Donation API handlers

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::models::{Donation, DonationCreate, DonationStatus, ManualDonationCreate};
use crate::db::repository::CampaignRepository;
use crate::gateway::PaymentSession;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// Donation row plus its campaign title (read views)
#[derive(Serialize)]
pub struct DonationView {
    #[serde(flatten)]
    pub donation: Donation,
    pub campaign_title: String,
}

#[derive(Serialize)]
pub struct DonationBeginResponse {
    pub donation: Donation,
    pub payment: PaymentSession,
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: DonationStatus,
    pub transaction_id: Option<String>,
}

async fn campaign_titles(state: &ServerState) -> AppResult<HashMap<String, String>> {
    let repo = CampaignRepository::new(state.db.clone());
    let campaigns = repo.find_all().await?;
    Ok(campaigns
        .into_iter()
        .filter_map(|c| c.id.as_ref().map(|id| (id.to_string(), c.title.clone())))
        .collect())
}

fn with_title(donation: Donation, titles: &HashMap<String, String>) -> DonationView {
    let campaign_title = titles
        .get(&donation.campaign.to_string())
        .cloned()
        .unwrap_or_else(|| "Unknown campaign".to_string());
    DonationView {
        donation,
        campaign_title,
    }
}

/// POST /api/donations - start the public donation flow
///
/// Creates a PENDING donation and opens a payment session; the response
/// carries the redirect URL for the donor's browser.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DonationCreate>,
) -> AppResult<Json<AppResponse<DonationBeginResponse>>> {
    let (donation, payment) = state.reconciliation.begin_donation(payload).await?;
    Ok(ok(DonationBeginResponse { donation, payment }))
}

/// GET /api/donations/{id} - donation status (public)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<DonationView>>> {
    let donation = state
        .reconciliation
        .donations()
        .find_by_id(&id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Donation {id} not found")))?;

    let titles = campaign_titles(&state).await?;
    Ok(ok(with_title(donation, &titles)))
}

/// GET /api/admin/donations - most recent donations, any status
pub async fn list_recent(
    State(state): State<ServerState>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<AppResponse<Vec<DonationView>>>> {
    let limit = query.limit.unwrap_or(100).min(500);
    let donations = state
        .reconciliation
        .donations()
        .find_recent(limit)
        .await
        .map_err(AppError::from)?;

    let titles = campaign_titles(&state).await?;
    let views = donations
        .into_iter()
        .map(|d| with_title(d, &titles))
        .collect();
    Ok(ok(views))
}

/// POST /api/admin/donations/manual - record an offline donation
pub async fn create_manual(
    State(state): State<ServerState>,
    Json(payload): Json<ManualDonationCreate>,
) -> AppResult<Json<AppResponse<Donation>>> {
    let donation = state.reconciliation.create_manual(payload).await?;
    Ok(ok(donation))
}

/// PUT /api/admin/donations/{id} - direct status correction
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> AppResult<Json<AppResponse<Donation>>> {
    let donation = state
        .reconciliation
        .admin_update_status(&id, payload.status, payload.transaction_id)
        .await?;
    Ok(ok(donation))
}

//! Admin reporting handlers
//!
//! Thin layer over [`crate::reporting`]: load the donation rows, hand them to
//! the pure aggregation functions, wrap the result.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::{CampaignRepository, DonationRepository};
use crate::reporting::{self, AnalyticsReport, DashboardStats};
use crate::utils::{AppError, AppResponse, AppResult, ok, time};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    /// 7d | 30d | 90d | 1y (default 30d)
    pub range: Option<String>,
}

/// GET /api/admin/stats - headline dashboard numbers
pub async fn stats(
    State(state): State<ServerState>,
) -> AppResult<Json<AppResponse<DashboardStats>>> {
    let donations = DonationRepository::new(state.db.clone());
    let campaigns = CampaignRepository::new(state.db.clone());

    let completed = donations.find_completed().await.map_err(AppError::from)?;
    let all_campaigns = campaigns.find_all().await.map_err(AppError::from)?;

    Ok(ok(reporting::dashboard_stats(
        &completed,
        &all_campaigns,
        time::now_millis(),
    )))
}

/// GET /api/admin/analytics?range=30d - full analytics report
pub async fn analytics(
    State(state): State<ServerState>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<AppResponse<AnalyticsReport>>> {
    let range = query.range.as_deref().unwrap_or("30d");
    let now = time::now_millis();
    let window_len = time::range_millis(range);
    let (from, to) = (now - window_len, now + 1);

    let donations = DonationRepository::new(state.db.clone());
    let campaigns = CampaignRepository::new(state.db.clone());

    let window = donations
        .find_completed_between(from, to)
        .await
        .map_err(AppError::from)?;
    let previous_window = donations
        .find_completed_between(from - window_len, from)
        .await
        .map_err(AppError::from)?;
    let all_completed = donations.find_completed().await.map_err(AppError::from)?;
    let all_campaigns = campaigns.find_all().await.map_err(AppError::from)?;

    Ok(ok(reporting::analytics_report(
        range,
        &window,
        &previous_window,
        &all_completed,
        &all_campaigns,
        now,
    )))
}

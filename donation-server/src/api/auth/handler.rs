//! Admin auth handlers

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{CurrentAdmin, verify_password};
use crate::core::ServerState;
use crate::db::repository::AdminRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AdminInfo,
}

/// POST /api/admin/login
///
/// Wrong email and wrong password produce the same error.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AppResponse<LoginResponse>>> {
    let repo = AdminRepository::new(state.db.clone());
    let admin = repo
        .find_by_email(payload.email.trim())
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&payload.password, &admin.password_hash) {
        return Err(AppError::invalid_credentials());
    }

    let admin_id = admin
        .id
        .as_ref()
        .map(|t| t.id.to_string())
        .unwrap_or_default();
    let token = state
        .jwt_service
        .generate_token(&admin_id, &admin.email, &admin.name)
        .map_err(|e| AppError::Internal(format!("Failed to issue token: {e}")))?;

    info!(email = %admin.email, "Admin logged in");

    Ok(ok(LoginResponse {
        token,
        admin: AdminInfo {
            id: admin_id,
            email: admin.email,
            name: admin.name,
        },
    }))
}

/// GET /api/admin/me
pub async fn me(admin: CurrentAdmin) -> AppResult<Json<AppResponse<AdminInfo>>> {
    Ok(ok(AdminInfo {
        id: admin.id,
        email: admin.email,
        name: admin.name,
    }))
}

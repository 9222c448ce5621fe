//! Authentication middleware
//!
//! Bearer-token validation for admin routes, plus an extractor so handlers
//! can take [`CurrentAdmin`] as an argument directly.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::{CurrentAdmin, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

fn authenticate(
    jwt_service: &JwtService,
    auth_header: Option<&str>,
) -> Result<CurrentAdmin, AppError> {
    let header = auth_header.ok_or(AppError::Unauthorized)?;
    let token = JwtService::extract_from_header(header).ok_or(AppError::InvalidToken)?;

    match jwt_service.validate_token(token) {
        Ok(claims) => Ok(CurrentAdmin::from(claims)),
        Err(e) => {
            warn!(error = %e, "Admin token rejected");
            Err(AppError::InvalidToken)
        }
    }
}

/// Require an authenticated admin
///
/// Validates the `Authorization: Bearer <token>` header and injects
/// [`CurrentAdmin`] into the request extensions. Applied to the admin
/// sub-router as a layer.
pub async fn require_admin(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let admin = authenticate(&state.jwt_service, auth_header)?;
    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}

impl FromRequestParts<ServerState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Already validated by the middleware
        if let Some(admin) = parts.extensions.get::<CurrentAdmin>() {
            return Ok(admin.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let admin = authenticate(&state.jwt_service, auth_header)?;
        parts.extensions.insert(admin.clone());
        Ok(admin)
    }
}

//! Admin reporting API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Mounted behind the auth middleware
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/admin/stats", get(handler::stats))
        .route("/api/admin/analytics", get(handler::analytics))
}

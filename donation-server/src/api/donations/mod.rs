//! Donation API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Public donation routes (donor-facing)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/donations", public_routes())
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}", get(handler::get_by_id))
}

/// Admin donation routes; mounted behind the auth middleware
pub fn admin_router() -> Router<ServerState> {
    Router::new().nest("/api/admin/donations", admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_recent))
        .route("/manual", post(handler::create_manual))
        .route("/{id}", axum::routing::put(handler::update_status))
}

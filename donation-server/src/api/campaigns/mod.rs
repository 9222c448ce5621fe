//! Campaign API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Public campaign routes (donor-facing)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/campaigns", public_routes())
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_active))
        .route("/{id}", get(handler::get_by_id))
}

/// Admin campaign routes; mounted behind the auth middleware
pub fn admin_router() -> Router<ServerState> {
    Router::new().nest("/api/admin/campaigns", admin_routes())
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list_all).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}

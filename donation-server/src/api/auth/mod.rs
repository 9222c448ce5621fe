//! Admin auth API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/admin/login", post(handler::login))
        .route("/api/admin/me", get(handler::me))
}

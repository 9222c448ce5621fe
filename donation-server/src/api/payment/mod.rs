//! Payment callback API module
//!
//! The provider calls these endpoints with form-encoded bodies; the demo
//! payment page drives the same endpoints through plain links, so the
//! browser-facing routes accept GET as well.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/payment/success",
            post(handler::success).get(handler::success_get),
        )
        .route(
            "/api/payment/fail",
            post(handler::fail).get(handler::fail_get),
        )
        .route(
            "/api/payment/cancel",
            post(handler::cancel).get(handler::cancel_get),
        )
        .route("/api/payment/ipn", post(handler::ipn))
        .route("/payment-demo", get(handler::demo_page))
}

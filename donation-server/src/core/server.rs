//! HTTP server bootstrap
//!
//! Router assembly, tower middleware stack and graceful shutdown.

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::api;
use crate::auth::require_admin;
use crate::core::{Config, ServerState};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// All routes, no middleware and no state
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    let admin = Router::new()
        .merge(api::campaigns::admin_router())
        .merge(api::donations::admin_router())
        .merge(api::analytics::router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        // Public API
        .merge(api::health::router())
        .merge(api::auth::router())
        .merge(api::campaigns::router())
        .merge(api::donations::router())
        .merge(api::payment::router())
        // Admin API - authentication required
        .merge(admin)
}

/// Fully configured application with the tower middleware stack applied
pub fn build_app(state: &ServerState) -> Router {
    build_router(state)
        // CORS - the public pages may be served from another origin
        .layer(CorsLayer::permissive())
        // Gzip response compression
        .layer(CompressionLayer::new())
        // Request tracing (INFO level)
        .layer(TraceLayer::new_for_http())
        // Unique ID per request, propagated to the response
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .with_state(state.clone())
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (tests inject fakes this way)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> AppResult<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        let app = build_app(&state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!(
            environment = %self.config.environment,
            "Donation server listening on {addr}"
        );

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {e}")))
    }
}

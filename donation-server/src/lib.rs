//! Donation Server - campaign and donation management backend
//!
//! # Architecture overview
//!
//! - **Campaigns** (`db`, `api/campaigns`): CRUD over an embedded SurrealDB
//!   store, with `raised_amount` maintained as a derived aggregate
//! - **Donations** (`reconcile`, `api/donations`): PENDING records settled by
//!   gateway callbacks through an idempotent state machine
//! - **Payment gateway** (`gateway`): SSLCommerz adapter with a simulated
//!   payment page when no credentials are configured
//! - **Reporting** (`reporting`, `api/analytics`): dashboard stats and
//!   analytics computed from completed donations
//! - **Auth** (`auth`): JWT + Argon2 admin sessions
//!
//! # Module structure
//!
//! ```text
//! donation-server/src/
//! ├── core/          # config, state, server bootstrap
//! ├── auth/          # JWT sessions, password hashing
//! ├── gateway/       # payment provider adapter
//! ├── reconcile/     # donation lifecycle state machine
//! ├── reporting/     # aggregation for the admin dashboard
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # models and repositories
//! └── utils/         # errors, logging, time helpers
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod gateway;
pub mod reconcile;
pub mod reporting;
pub mod utils;

// Re-export common types
pub use auth::{CurrentAdmin, JwtService};
pub use core::{Config, Server, ServerState};
pub use gateway::{PaymentGateway, SslCommerzGateway};
pub use reconcile::ReconciliationService;
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load .env, create the working directory and initialize logging
pub fn setup_environment() -> std::io::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_logger_with_file(Some(&log_level), log_dir.to_str());

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____                   __  _
   / __ \____  ____  ____ _/ /_(_)___  ____
  / / / / __ \/ __ \/ __ `/ __/ / __ \/ __ \
 / /_/ / /_/ / / / / /_/ / /_/ / /_/ / / / /
/_____/\____/_/ /_/\__,_/\__/_/\____/_/ /_/
            Donation Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

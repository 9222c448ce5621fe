use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::gateway::{PaymentGateway, SslCommerzGateway};
use crate::reconcile::ReconciliationService;
use crate::utils::{AppError, AppResult};

/// Shared server state
///
/// Holds the embedded database handle and the long-lived services. Cloning is
/// shallow (Arc fields), so every request handler gets its own copy.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub reconciliation: ReconciliationService,
}

impl ServerState {
    pub fn new(
        config: Config,
        db: Surreal<Db>,
        jwt_service: Arc<JwtService>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let reconciliation =
            ReconciliationService::new(db.clone(), gateway.clone(), config.base_url.clone());
        Self {
            config,
            db,
            jwt_service,
            gateway,
            reconciliation,
        }
    }

    /// Initialize state from configuration
    ///
    /// Opens (or creates) the database under `work_dir/database/` and wires up
    /// the SSLCommerz adapter. First run also seeds the default admin account.
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db_dir = config.database_dir();
        std::fs::create_dir_all(&db_dir)
            .map_err(|e| AppError::Internal(format!("Failed to create work directory: {e}")))?;

        let db_service = DbService::new(&db_dir.join("donation.db")).await?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let gateway: Arc<dyn PaymentGateway> = Arc::new(SslCommerzGateway::new(
            config.gateway.clone(),
            config.base_url.clone(),
        ));

        Ok(Self::new(config.clone(), db_service.db, jwt_service, gateway))
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}

use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::gateway::GatewayConfig;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/donation-server | Working directory (database, logs) |
/// | HTTP_PORT | 3000 | HTTP listen port |
/// | BASE_URL | http://localhost:3000 | Public URL, used for gateway callbacks |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | JWT_SECRET | (generated) | Admin session signing key |
/// | SSLCOMMERZ_STORE_ID | (empty) | Gateway store id |
/// | SSLCOMMERZ_STORE_PASSWORD | (empty) | Gateway store password |
/// | SSLCOMMERZ_IS_LIVE | false | Use the production gateway host |
/// | ADMIN_EMAIL | admin@example.org | First-run admin account |
/// | ADMIN_PASSWORD | admin123 | First-run admin password |
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and log files
    pub work_dir: String,
    pub http_port: u16,
    /// Public base URL of this server; the gateway redirects donors back here
    pub base_url: String,
    pub environment: String,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/donation-server".into()),
            http_port,
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{http_port}")),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            jwt: JwtConfig::default(),
            gateway: GatewayConfig::from_env(),
        }
    }

    /// Override the paths and port, keeping everything else from the
    /// environment. Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.base_url = format!("http://localhost:{http_port}");
        config
    }

    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

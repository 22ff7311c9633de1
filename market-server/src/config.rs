//! Server configuration
//!
//! All settings come from environment variables with development defaults:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | DATABASE_PATH | market.db | SQLite database file |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | WORK_DIR | /var/lib/market | Blob storage root |
//! | JWT_SECRET | (dev placeholder) | HMAC secret for bearer tokens |
//! | ENVIRONMENT | development | development \| staging \| production |

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// HTTP API port
    pub http_port: u16,
    /// Working directory for blob storage
    pub work_dir: String,
    /// JWT secret for bearer-token verification
    pub jwt_secret: String,
    /// Environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(v) if !v.is_empty() => v,
            _ if environment == "development" => "dev-jwt-secret-not-for-production".into(),
            _ => return Err(format!("JWT_SECRET must be set in {environment} environment").into()),
        };

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "market.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/market".into()),
            jwt_secret,
            environment,
        })
    }
}

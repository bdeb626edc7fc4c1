use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Where hiring state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local store. Everything is lost on restart.
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret, which must always be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Seconds between job start sweeps (default: `3600`).
    pub job_sweep_interval_secs: u64,
    pub storage: StorageBackend,
    /// Required when `storage` is [`StorageBackend::Postgres`].
    pub database_url: Option<String>,
    /// Attempts at the durable notification write (default: `3`).
    pub notification_write_attempts: u32,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    /// | `JOB_SWEEP_INTERVAL_SECS`     | `3600`                  |
    /// | `STORAGE_BACKEND`             | `postgres`              |
    /// | `DATABASE_URL`                | -- (postgres only)      |
    /// | `NOTIFICATION_WRITE_ATTEMPTS` | `3`                     |
    /// | `LOG_FORMAT`                  | `pretty` (or `json`)    |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparseable values, and when the postgres backend is
    /// selected without `DATABASE_URL`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let job_sweep_interval_secs: u64 = std::env::var("JOB_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("JOB_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            job_sweep_interval_secs > 0,
            "JOB_SWEEP_INTERVAL_SECS must be positive"
        );

        let storage = std::env::var("STORAGE_BACKEND")
            .map(|v| StorageBackend::parse(&v).expect("STORAGE_BACKEND must be postgres or memory"))
            .unwrap_or(StorageBackend::Postgres);

        let database_url = std::env::var("DATABASE_URL").ok();
        if storage == StorageBackend::Postgres {
            assert!(
                database_url.is_some(),
                "DATABASE_URL must be set when STORAGE_BACKEND=postgres"
            );
        }

        let notification_write_attempts: u32 = std::env::var("NOTIFICATION_WRITE_ATTEMPTS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("NOTIFICATION_WRITE_ATTEMPTS must be a valid u32");

        let log_json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            job_sweep_interval_secs,
            storage,
            database_url,
            notification_write_attempts: notification_write_attempts.max(1),
            log_json,
        }
    }

    pub fn job_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.job_sweep_interval_secs)
    }
}

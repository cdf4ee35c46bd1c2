use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// Interval in seconds between WebSocket keep-alive pings (default: `30`).
    pub ws_heartbeat_secs: u64,
    /// TTL in minutes after which a live request with no pending offers is
    /// expired by the background sweeper. `0` disables expiry.
    pub request_expiry_minutes: i64,
    /// Optional webhook URL for operational milestone alerts.
    pub ops_alert_webhook_url: Option<String>,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `WS_HEARTBEAT_SECS`      | `30`                       |
    /// | `REQUEST_EXPIRY_MINUTES` | `0` (disabled)             |
    /// | `OPS_ALERT_WEBHOOK_URL`  | unset (disabled)           |
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

        let ws_heartbeat_secs: u64 = std::env::var("WS_HEARTBEAT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("WS_HEARTBEAT_SECS must be a valid u64");

        let request_expiry_minutes: i64 = std::env::var("REQUEST_EXPIRY_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("REQUEST_EXPIRY_MINUTES must be a valid i64");

        let ops_alert_webhook_url = std::env::var("OPS_ALERT_WEBHOOK_URL").ok();

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            ws_heartbeat_secs,
            request_expiry_minutes,
            ops_alert_webhook_url,
            jwt,
        }
    }
}

//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Redis connection URL (stock cache + distributed locks)
    pub redis_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for user authentication
    pub jwt_secret: String,
    /// Pending orders older than this are cancelled by the reconciler
    pub order_timeout_minutes: u64,
    /// Pending payments older than this are failed
    pub payment_timeout_minutes: u64,
    /// Reconciler sweep interval
    pub reconcile_interval_secs: u64,
    /// TTL on cache reservation records (orphan safety net)
    pub reservation_ttl_secs: u64,
    /// TTL on per-product stock locks (crash safety net)
    pub lock_ttl_secs: u64,
    /// Optional webhook for order/payment notifications
    pub notify_webhook_url: Option<String>,
    /// Push durable stock into the cache at startup
    pub sync_stock_on_startup: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development
    /// environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn env_u64(name: &str, default: u64) -> u64 {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            order_timeout_minutes: Self::env_u64("ORDER_TIMEOUT_MINUTES", 30),
            payment_timeout_minutes: Self::env_u64("PAYMENT_TIMEOUT_MINUTES", 120),
            reconcile_interval_secs: Self::env_u64("RECONCILE_INTERVAL_SECS", 300),
            reservation_ttl_secs: Self::env_u64("RESERVATION_TTL_SECS", 600),
            lock_ttl_secs: Self::env_u64("LOCK_TTL_SECS", 30),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            sync_stock_on_startup: std::env::var("SYNC_STOCK_ON_STARTUP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            environment,
        })
    }
}

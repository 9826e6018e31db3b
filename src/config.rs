use config::{Config, ConfigError, Environment, File};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Runtime configuration, assembled from built-in defaults, the optional
/// `config/default.toml` and `config/{environment}.toml` files, and `APP__`
/// environment variables (double underscore separator), in that order.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,

    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,

    /// Fraction of the subtotal charged as tax on every order.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Minutes added to the order creation time to produce the delivery
    /// estimate shown to the customer.
    #[serde(default = "default_estimated_delivery_minutes")]
    pub estimated_delivery_minutes: i64,

    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    #[serde(default = "default_feed_channel_capacity")]
    pub feed_channel_capacity: usize,

    /// Comma-separated list of allowed origins, or `*`.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_jwt_expiration() -> u64 {
    86_400
}

fn default_jwt_issuer() -> String {
    "quickbite-api".to_string()
}

fn default_jwt_audience() -> String {
    "quickbite-clients".to_string()
}

fn default_tax_rate() -> f64 {
    0.10
}

fn default_estimated_delivery_minutes() -> i64 {
    45
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_feed_channel_capacity() -> usize {
    64
}

fn default_cors_allowed_origins() -> String {
    "*".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_timeout_secs() -> u64 {
    10
}

fn default_auto_migrate() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum AppConfigError {
    #[error("configuration load error: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Programmatic constructor used by tests and tooling; file/env loading
    /// goes through [`load_config`].
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: default_host(),
            port: default_port(),
            environment: "test".to_string(),
            log_level: default_log_level(),
            log_json: false,
            jwt_secret: jwt_secret.into(),
            jwt_expiration: default_jwt_expiration(),
            jwt_issuer: default_jwt_issuer(),
            jwt_audience: default_jwt_audience(),
            tax_rate: default_tax_rate(),
            estimated_delivery_minutes: default_estimated_delivery_minutes(),
            event_channel_capacity: default_event_channel_capacity(),
            feed_channel_capacity: default_feed_channel_capacity(),
            cors_allowed_origins: default_cors_allowed_origins(),
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_timeout_secs(),
            db_acquire_timeout_secs: default_db_timeout_secs(),
            auto_migrate: default_auto_migrate(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Tax rate as an exact decimal; validated to lie in `[0, 1]` at load.
    pub fn tax_rate_decimal(&self) -> Decimal {
        Decimal::from_f64(self.tax_rate).unwrap_or_else(|| Decimal::new(10, 2))
    }

    pub fn validate(&self) -> Result<(), AppConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(AppConfigError::Invalid("database_url is empty".into()));
        }
        if self.jwt_secret.len() < 32 {
            return Err(AppConfigError::Invalid(
                "jwt_secret must be at least 32 characters".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(AppConfigError::Invalid(
                "tax_rate must lie between 0.0 and 1.0".into(),
            ));
        }
        if self.estimated_delivery_minutes <= 0 {
            return Err(AppConfigError::Invalid(
                "estimated_delivery_minutes must be positive".into(),
            ));
        }
        if self.db_min_connections > self.db_max_connections {
            return Err(AppConfigError::Invalid(
                "db_min_connections exceeds db_max_connections".into(),
            ));
        }
        Ok(())
    }
}

/// Load and validate configuration from files and environment.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let config = Config::builder()
        .set_default("environment", environment.clone())?
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{environment}")).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("quickbite_api={log_level},tower_http=info")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_config() -> AppConfig {
        AppConfig::new("sqlite::memory:", "0123456789abcdef0123456789abcdef-test")
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let mut cfg = valid_config();
        cfg.jwt_secret = "short".to_string();
        assert!(matches!(cfg.validate(), Err(AppConfigError::Invalid(_))));
    }

    #[test]
    fn out_of_range_tax_rate_is_rejected() {
        let mut cfg = valid_config();
        cfg.tax_rate = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tax_rate_converts_exactly() {
        let cfg = valid_config();
        assert_eq!(cfg.tax_rate_decimal(), dec!(0.10));
    }

    #[test]
    fn default_delivery_estimate_is_forty_five_minutes() {
        assert_eq!(valid_config().estimated_delivery_minutes, 45);
    }
}

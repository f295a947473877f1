use grocer_order::CheckoutTimeouts;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    pub services: ServicesConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub checkout: CheckoutConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Decimal,
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self { delivery_fee: default_delivery_fee() }
    }
}

fn default_delivery_fee() -> Decimal { grocer_cart::DEFAULT_DELIVERY_FEE }

#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutConfig {
    #[serde(default = "default_timeout_secs")]
    pub payment_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub notification_timeout_secs: u64,
    /// Shopper sessions idle this long are dropped
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            payment_timeout_secs: default_timeout_secs(),
            notification_timeout_secs: default_timeout_secs(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl CheckoutConfig {
    pub fn timeouts(&self) -> CheckoutTimeouts {
        CheckoutTimeouts {
            payment: Duration::from_secs(self.payment_timeout_secs),
            notification: Duration::from_secs(self.notification_timeout_secs),
        }
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

fn default_timeout_secs() -> u64 { 15 }

fn default_session_idle_secs() -> u64 { 30 * 60 }

/// Hosted edge functions fronting the payment and email providers
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub functions_url: String,
    pub anon_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 { 10 }

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub run_migrations: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `GROCER_SERVICES__ANON_KEY=...`
            .add_source(config::Environment::with_prefix("GROCER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

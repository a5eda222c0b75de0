//! Configuration loading
//!
//! Values come from `config/eventbar.toml` when present, then from
//! `EVENTBAR__*` environment variables (`EVENTBAR__API__BASE_URL`,
//! `EVENTBAR__COMMISSION__SALES_RATE`, ...). Everything has a default.

use std::str::FromStr;
use std::time::Duration;

use bigdecimal::BigDecimal;
use serde::Deserialize;

use crate::reconciliation::CommissionPolicy;
use crate::types::*;

/// Crate configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventBarConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub commission: CommissionConfig,
}

/// Back office connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Commission rates in percent
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommissionConfig {
    #[serde(default = "default_sales_rate")]
    pub sales_rate: BigDecimal,
    #[serde(default = "default_cashless_rate")]
    pub cashless_rate: BigDecimal,
}

fn default_sales_rate() -> BigDecimal {
    BigDecimal::from(8)
}

fn default_cashless_rate() -> BigDecimal {
    BigDecimal::from(4)
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            sales_rate: default_sales_rate(),
            cashless_rate: default_cashless_rate(),
        }
    }
}

impl CommissionConfig {
    /// Validated policy for the calculator
    pub fn policy(&self) -> EventBarResult<CommissionPolicy> {
        CommissionPolicy::new(self.sales_rate.clone(), self.cashless_rate.clone())
    }
}

impl EventBarConfig {
    /// Load from `config/eventbar.toml` and the environment
    pub fn load() -> EventBarResult<Self> {
        Self::load_from("config/eventbar")
    }

    /// Load from a given file (extension optional) and the environment
    pub fn load_from(path: &str) -> EventBarResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("EVENTBAR").separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Parse a TOML document, without the environment layer
    pub fn from_toml(source: &str) -> EventBarResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> EventBarResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(EventBarError::Config("api.base_url cannot be empty".to_string()));
        }
        if self.api.timeout_secs == 0 {
            return Err(EventBarError::Config(
                "api.timeout_secs must be positive".to_string(),
            ));
        }
        self.commission
            .policy()
            .map(|_| ())
            .map_err(|e| EventBarError::Config(e.to_string()))
    }

    /// Normalised back office URL
    pub fn base_url(&self) -> String {
        normalize_base_url(&self.api.base_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

/// Normalise a back office URL:
/// - ensure a scheme is present (http for localhost, https otherwise)
/// - strip trailing slashes and a trailing `/api` segment
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }
    while url.ends_with('/') {
        url.pop();
    }

    url
}

impl FromStr for EventBarConfig {
    type Err = EventBarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_toml(s)
    }
}

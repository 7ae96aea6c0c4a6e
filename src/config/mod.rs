//! # Harness configuration
//!
//! Named options recognised by the harness. Values come from defaults, an
//! optional JSON file, and `RESTCONTRACT_*` overrides, in that order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_BUDGET_MS: u64 = 2_000;

pub const ENV_BASE_URL: &str = "RESTCONTRACT_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "RESTCONTRACT_TIMEOUT_MS";
pub const ENV_BUDGET_MS: &str = "RESTCONTRACT_BUDGET_MS";

/// Caller-side retry policy for transport failures.
///
/// Never applied to non-idempotent methods or to timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    #[serde(default)]
    pub attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 0,
            delay_ms: default_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-call timeout; `0` disables it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_budget_ms")]
    pub default_budget_ms: u64,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_budget_ms() -> u64 {
    DEFAULT_BUDGET_MS
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            default_budget_ms: default_budget_ms(),
            retry: RetryPolicy::default(),
            user_agent: default_user_agent(),
        }
    }
}

impl HarnessConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("RESTCONTRACT_"))
            .collect();
        Self::default().with_env_overrides(&vars)
    }

    /// Apply `RESTCONTRACT_*` overrides from the given variable map.
    pub fn with_env_overrides(mut self, vars: &HashMap<String, String>) -> Result<Self> {
        if let Some(base_url) = non_empty(vars, ENV_BASE_URL) {
            self.base_url = base_url.to_string();
        }
        if let Some(raw) = non_empty(vars, ENV_TIMEOUT_MS) {
            self.timeout_ms = parse_ms(ENV_TIMEOUT_MS, raw)?;
        }
        if let Some(raw) = non_empty(vars, ENV_BUDGET_MS) {
            self.default_budget_ms = parse_ms(ENV_BUDGET_MS, raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;
        if self.default_budget_ms == 0 {
            return Err(HarnessError::InvalidConfig(
                "defaultBudgetMs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| HarnessError::InvalidUrl {
            input: self.base_url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HarnessError::InvalidUrl {
                input: self.base_url.clone(),
                message: "scheme must be http or https".to_string(),
            });
        }
        Ok(url)
    }
}

fn non_empty<'a>(vars: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    vars.get(key).map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn parse_ms(key: &str, raw: &str) -> Result<u64> {
    raw.parse().map_err(|_| {
        HarnessError::InvalidConfig(format!(
            "`{key}` must be a number of milliseconds, got `{raw}`"
        ))
    })
}

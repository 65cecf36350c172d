use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::{LendingError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

pub const ENV_BASE_URL: &str = "LOAN_DESK_BASE_URL";
pub const ENV_DEBOUNCE_MS: &str = "LOAN_DESK_DEBOUNCE_MS";
pub const ENV_TIMEOUT_SECS: &str = "LOAN_DESK_TIMEOUT_SECS";

/// frontend configuration, injected into the api client, resolver and coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// root of the lending api, without a trailing path
    pub base_url: String,
    /// quiet period before typed input becomes the active identifier
    pub debounce_ms: u64,
    /// per-request timeout; none leaves it to the transport
    pub request_timeout_secs: Option<u64>,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: None,
        }
    }
}

impl FrontendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = window.as_millis() as u64;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_secs = timeout.map(|t| t.as_secs());
        self
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// load from a json file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LendingError::InvalidConfiguration {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| LendingError::InvalidConfiguration {
            message: e.to_string(),
        })
    }

    /// apply overrides from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// apply overrides from an arbitrary lookup
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(ms) = lookup(ENV_DEBOUNCE_MS) {
            self.debounce_ms = parse_number(ENV_DEBOUNCE_MS, &ms)?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = Some(parse_number(ENV_TIMEOUT_SECS, &secs)?);
        }
        Ok(self)
    }

    /// validate the configuration before wiring components
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(LendingError::InvalidConfiguration {
                message: "base_url must not be empty".to_string(),
            });
        }
        let url = reqwest::Url::parse(base).map_err(|e| LendingError::InvalidConfiguration {
            message: format!("base_url {:?} is not a valid url: {}", base, e),
        })?;
        if url.cannot_be_a_base() {
            return Err(LendingError::InvalidConfiguration {
                message: format!("base_url {:?} cannot be used as a base", base),
            });
        }
        if self.debounce_ms == 0 {
            return Err(LendingError::InvalidConfiguration {
                message: "debounce window must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_secs == Some(0) {
            return Err(LendingError::InvalidConfiguration {
                message: "request timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| LendingError::InvalidConfiguration {
        message: format!("{} must be a whole number, got {:?}", key, raw),
    })
}

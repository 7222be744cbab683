use std::env;

use thiserror::Error;

pub const ENV_RUNTIME_PROFILE: &str = "CASEFILE_RUNTIME_PROFILE";
pub const ENV_EIP1193_PROXY_URL: &str = "CASEFILE_EIP1193_PROXY_URL";
pub const ENV_PROVIDER_TIMEOUT_MS: &str = "CASEFILE_PROVIDER_TIMEOUT_MS";
pub const ENV_REVOKE_ON_DISCONNECT: &str = "CASEFILE_REVOKE_ON_DISCONNECT";
pub const ENV_PROVIDER_ABSENT: &str = "CASEFILE_PROVIDER_ABSENT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    /// JSON-RPC endpoint speaking EIP-1193 methods (native builds only).
    pub eip1193_proxy_url: Option<String>,
    pub provider_timeout_ms: u64,
    pub revoke_on_disconnect: bool,
    /// Behave as if no wallet extension were installed.
    pub provider_absent: bool,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            provider_timeout_ms: 120_000,
            revoke_on_disconnect: false,
            provider_absent: false,
        }
    }
}

impl WalletAdapterConfig {
    /// Read the environment, falling back to defaults for malformed values.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            tracing::warn!("ignoring wallet adapter environment: {e}");
            Self::default()
        })
    }

    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(ENV_RUNTIME_PROFILE) {
            cfg.runtime_profile = match raw.trim().to_ascii_lowercase().as_str() {
                "" | "dev" | "development" => RuntimeProfile::Development,
                "prod" | "production" => RuntimeProfile::Production,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_RUNTIME_PROFILE,
                        value: raw,
                    })
                }
            };
        }
        cfg.eip1193_proxy_url = lookup(ENV_EIP1193_PROXY_URL)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        if let Some(raw) = lookup(ENV_PROVIDER_TIMEOUT_MS) {
            cfg.provider_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_PROVIDER_TIMEOUT_MS,
                        value: raw.clone(),
                    })?;
        }
        if let Some(raw) = lookup(ENV_REVOKE_ON_DISCONNECT) {
            cfg.revoke_on_disconnect = parse_flag(ENV_REVOKE_ON_DISCONNECT, raw)?;
        }
        if let Some(raw) = lookup(ENV_PROVIDER_ABSENT) {
            cfg.provider_absent = parse_flag(ENV_PROVIDER_ABSENT, raw)?;
        }
        Ok(cfg)
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }
}

fn parse_flag(key: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}

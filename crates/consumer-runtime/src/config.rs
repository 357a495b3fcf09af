//! # Consumer Configuration
//!
//! Runtime settings assembled from environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EC_VALIDATE_SIGNATURE` | `true` | Verify envelope signatures |
//! | `EC_SIGNATURE_DIGEST` | `sha1` | `sha1` or `sha256` |
//! | `EC_KEY_SERVICE_URL` | required to consume | Key service base URL |
//! | `EC_SWS_URL` | required to consume | Student web service base URL |
//! | `EC_GWS_URL` | required to consume | Group web service base URL |
//! | `EC_HTTP_TIMEOUT_SECS` | `10` | Per-request timeout |
//! | `EC_PRUNE_AFTER_DAYS` | `7` | Activity retention window |
//! | `EC_IMPORT_GROUPS` | empty | Comma-separated import group names |
//! | `EC_DEFAULT_CAMPUS` | `seattle` | Campus for sections that name none |
//!
//! Empty values count as unset.

use ec_01_message_extraction::ExtractionConfig;
use ec_02_activity_log::ActivityConfig;
use ec_03_event_dispatch::DispatchConfig;
use shared_crypto::SignatureDigest;
use std::env;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Upstream service base URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub key_service: Option<String>,
    pub sws: Option<String>,
    pub gws: Option<String>,
}

/// Base URLs the consume path cannot run without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredEndpoints<'a> {
    pub key_service: &'a str,
    pub sws: &'a str,
    pub gws: &'a str,
}

/// Complete consumer configuration.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub extraction: ExtractionConfig,
    pub activity: ActivityConfig,
    pub dispatch: DispatchConfig,
    pub endpoints: Endpoints,
    pub http_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            activity: ActivityConfig::default(),
            dispatch: DispatchConfig::default(),
            endpoints: Endpoints::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ConsumerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("EC_VALIDATE_SIGNATURE") {
            let enabled = parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
                var: "EC_VALIDATE_SIGNATURE",
                value: value.clone(),
                reason: "expected true or false".to_string(),
            })?;
            config.extraction = config.extraction.with_validate_signature(enabled);
        }

        if let Some(value) = get("EC_SIGNATURE_DIGEST") {
            let digest = value
                .parse::<SignatureDigest>()
                .map_err(|e| ConfigError::InvalidValue {
                    var: "EC_SIGNATURE_DIGEST",
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
            config.extraction = config.extraction.with_digest(digest);
        }

        if let Some(value) = get("EC_HTTP_TIMEOUT_SECS") {
            let secs = parse_positive("EC_HTTP_TIMEOUT_SECS", &value)?;
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(value) = get("EC_PRUNE_AFTER_DAYS") {
            let days = parse_positive("EC_PRUNE_AFTER_DAYS", &value)?;
            let days = u32::try_from(days).map_err(|e| ConfigError::InvalidValue {
                var: "EC_PRUNE_AFTER_DAYS",
                value: value.clone(),
                reason: e.to_string(),
            })?;
            config.activity = config.activity.with_prune_after_days(days);
        }

        if let Some(value) = get("EC_IMPORT_GROUPS") {
            config.dispatch = config.dispatch.with_import_groups(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty()),
            );
        }

        if let Some(value) = get("EC_DEFAULT_CAMPUS") {
            config.dispatch = config.dispatch.with_default_campus(value.trim().to_lowercase());
        }

        config.endpoints = Endpoints {
            key_service: get("EC_KEY_SERVICE_URL"),
            sws: get("EC_SWS_URL"),
            gws: get("EC_GWS_URL"),
        };

        Ok(config)
    }

    /// Every upstream base URL, or the first one missing.
    pub fn require_endpoints(&self) -> Result<RequiredEndpoints<'_>, ConfigError> {
        Ok(RequiredEndpoints {
            key_service: self
                .endpoints
                .key_service
                .as_deref()
                .ok_or(ConfigError::Missing("EC_KEY_SERVICE_URL"))?,
            sws: self
                .endpoints
                .sws
                .as_deref()
                .ok_or(ConfigError::Missing("EC_SWS_URL"))?,
            gws: self
                .endpoints
                .gws
                .as_deref()
                .ok_or(ConfigError::Missing("EC_GWS_URL"))?,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(_) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

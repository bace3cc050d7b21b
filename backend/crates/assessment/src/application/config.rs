//! Application Configuration
//!
//! Configuration for the webhook client and the generation use case.

use std::str::FromStr;
use std::time::Duration;

use platform::cache::CacheConfig;
use platform::rate_limit::BackoffConfig;
use thiserror::Error;

/// Default workflow endpoint for local development
pub const DEFAULT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/gerar-avaliacao";

/// Upper bound for every configured duration (one week)
pub const MAX_CONFIGURED_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_CONFIGURED_MS: u64 = MAX_CONFIGURED_SECS * 1000;

/// Invalid configuration value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {var}: {value:?} ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Webhook client configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Workflow endpoint used by the generation use case
    pub webhook_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// TTL for cached read-only responses
    pub cached_response_ttl: Duration,
    /// Values of the payload `action` field that are safe to cache
    pub cacheable_actions: Vec<String>,
    /// Sent as `version` in the request envelope
    pub client_version: String,
    /// Sent as `platform` in the request envelope
    pub platform_tag: String,
    /// `User-Agent` header and `metadata.userAgent`
    pub user_agent: String,
    /// Sent as `metadata.source`
    pub source: String,
    pub backoff: BackoffConfig,
    pub cache: CacheConfig,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            timeout: Duration::from_millis(10_000),
            cached_response_ttl: Duration::from_secs(120),
            cacheable_actions: vec!["get_templates".to_string(), "validate_only".to_string()],
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            platform_tag: "assessment-generator".to_string(),
            user_agent: format!("AssessmentGenerator/{}", env!("CARGO_PKG_VERSION")),
            source: "assessment-api".to_string(),
            backoff: BackoffConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl WebhookConfig {
    /// Load from process environment, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("WEBHOOK_URL").filter(|v| !v.trim().is_empty()) {
            config.webhook_url = url.trim().to_string();
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "WEBHOOK_TIMEOUT_MS")? {
            positive("WEBHOOK_TIMEOUT_MS", ms)?;
            config.timeout =
                Duration::from_millis(at_most("WEBHOOK_TIMEOUT_MS", ms, MAX_CONFIGURED_MS)?);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "WEBHOOK_RATE_LIMIT_BASE_MS")? {
            config.backoff.base_interval =
                Duration::from_millis(at_most("WEBHOOK_RATE_LIMIT_BASE_MS", ms, MAX_CONFIGURED_MS)?);
        }
        if let Some(threshold) = parse_var::<u32>(&lookup, "WEBHOOK_BLOCK_THRESHOLD")? {
            config.backoff.block_threshold =
                positive("WEBHOOK_BLOCK_THRESHOLD", threshold.into())? as u32;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "WEBHOOK_BLOCK_COOLDOWN_SECS")? {
            config.backoff.block_cooldown = Duration::from_secs(at_most(
                "WEBHOOK_BLOCK_COOLDOWN_SECS",
                secs,
                MAX_CONFIGURED_SECS,
            )?);
        }
        if let Some(size) = parse_var::<usize>(&lookup, "WEBHOOK_CACHE_MAX_SIZE")? {
            config.cache.max_size = positive("WEBHOOK_CACHE_MAX_SIZE", size as u64)? as usize;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "WEBHOOK_CACHE_TTL_SECS")? {
            config.cache.default_ttl =
                Duration::from_secs(at_most("WEBHOOK_CACHE_TTL_SECS", secs, MAX_CONFIGURED_SECS)?);
        }

        Ok(config)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    pub fn is_cacheable_action(&self, action: &str) -> bool {
        self.cacheable_actions.iter().any(|a| a == action)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn positive(var: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn at_most(var: &'static str, value: u64, max: u64) -> Result<u64, ConfigError> {
    if value > max {
        return Err(ConfigError {
            var,
            value: value.to_string(),
            reason: format!("must be at most {max}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WebhookConfig::default();
        assert_eq!(config.timeout_ms(), 10_000);
        assert_eq!(config.cached_response_ttl, Duration::from_secs(120));
        assert!(config.is_cacheable_action("get_templates"));
        assert!(config.is_cacheable_action("validate_only"));
        assert!(!config.is_cacheable_action("generate"));
        assert_eq!(config.backoff.base_interval_ms(), 2000);
        assert_eq!(config.cache.max_size, 100);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = WebhookConfig::from_lookup(lookup(&[
            ("WEBHOOK_URL", " https://hooks.example.com/gen "),
            ("WEBHOOK_TIMEOUT_MS", "2500"),
            ("WEBHOOK_RATE_LIMIT_BASE_MS", "500"),
            ("WEBHOOK_BLOCK_THRESHOLD", "5"),
            ("WEBHOOK_BLOCK_COOLDOWN_SECS", "30"),
            ("WEBHOOK_CACHE_MAX_SIZE", "10"),
            ("WEBHOOK_CACHE_TTL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.webhook_url, "https://hooks.example.com/gen");
        assert_eq!(config.timeout_ms(), 2500);
        assert_eq!(config.backoff.base_interval_ms(), 500);
        assert_eq!(config.backoff.block_threshold, 5);
        assert_eq!(config.backoff.block_cooldown_ms(), 30_000);
        assert_eq!(config.cache.max_size, 10);
        assert_eq!(config.cache.default_ttl_ms(), 60_000);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = WebhookConfig::from_lookup(lookup(&[("WEBHOOK_TIMEOUT_MS", "  ")])).unwrap();
        assert_eq!(config.timeout_ms(), 10_000);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = WebhookConfig::from_lookup(lookup(&[("WEBHOOK_TIMEOUT_MS", "soon")])).unwrap_err();
        assert_eq!(err.var, "WEBHOOK_TIMEOUT_MS");

        let err = WebhookConfig::from_lookup(lookup(&[("WEBHOOK_CACHE_MAX_SIZE", "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_out_of_range_durations_are_errors() {
        for var in ["WEBHOOK_BLOCK_COOLDOWN_SECS", "WEBHOOK_CACHE_TTL_SECS"] {
            let err = WebhookConfig::from_lookup(lookup(&[(var, "18446744073709551615")])).unwrap_err();
            assert_eq!(err.var, var);
            assert!(err.to_string().contains("must be at most"));
        }

        let err =
            WebhookConfig::from_lookup(lookup(&[("WEBHOOK_RATE_LIMIT_BASE_MS", "18446744073709551615")]))
                .unwrap_err();
        assert_eq!(err.var, "WEBHOOK_RATE_LIMIT_BASE_MS");
    }

    #[test]
    fn test_durations_at_the_cap_are_accepted() {
        let cap = MAX_CONFIGURED_SECS.to_string();
        let config = WebhookConfig::from_lookup(lookup(&[
            ("WEBHOOK_BLOCK_COOLDOWN_SECS", cap.as_str()),
            ("WEBHOOK_CACHE_TTL_SECS", cap.as_str()),
        ]))
        .unwrap();

        assert_eq!(config.backoff.block_cooldown, Duration::from_secs(MAX_CONFIGURED_SECS));
        assert_eq!(config.cache.default_ttl_ms(), 604_800_000);
    }
}

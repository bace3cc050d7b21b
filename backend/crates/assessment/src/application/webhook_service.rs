//! Webhook Service
//!
//! Client for the assessment-generation workflow endpoint.
//!
//! ## Request flow
//! 1. URL and payload validation
//! 2. Credential-looking keys are stripped from the payload
//! 3. Read-only actions are answered from the cache when possible
//! 4. Backoff check (fail fast, never sleeps)
//! 5. POST with the request envelope and a bounded timeout
//! 6. Status / content-type classification
//! 7. On success the backoff relaxes and read-only results are cached

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use kernel::id::RequestId;
use platform::cache::{CacheStats, TtlCache};
use platform::clock::{Clock, SystemClock};
use platform::rate_limit::{BackoffLimiter, RateLimitSnapshot};
use platform::sanitize::sanitize_map;
use reqwest::Url;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::application::config::WebhookConfig;
use crate::domain::transport::{TransportError, TransportResponse, WebhookTransport};
use crate::domain::value_objects::WebhookResponse;
use crate::error::{WebhookError, WebhookResult};

/// Action sent by [`WebhookService::fetch_templates`]
pub const TEMPLATES_ACTION: &str = "get_templates";

/// Limiter and cache state for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub webhook_url: String,
    pub rate_limit: RateLimitSnapshot,
    pub cache: CacheStats,
}

/// Webhook client owning its own limiter and cache
pub struct WebhookService<T>
where
    T: WebhookTransport,
{
    transport: Arc<T>,
    config: Arc<WebhookConfig>,
    clock: Arc<dyn Clock>,
    cache: Mutex<TtlCache<Value>>,
    limiter: Mutex<BackoffLimiter>,
}

impl<T> WebhookService<T>
where
    T: WebhookTransport,
{
    pub fn new(transport: Arc<T>, config: Arc<WebhookConfig>) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemClock))
    }

    pub fn with_clock(transport: Arc<T>, config: Arc<WebhookConfig>, clock: Arc<dyn Clock>) -> Self {
        let cache = TtlCache::new(config.cache.clone(), clock.clone());
        let limiter = BackoffLimiter::new(config.backoff.clone(), clock.clone());
        Self {
            transport,
            config,
            clock,
            cache: Mutex::new(cache),
            limiter: Mutex::new(limiter),
        }
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Current time according to the service clock
    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.clock.now_ms()).unwrap_or_else(Utc::now)
    }

    /// Send `payload` to `url`
    ///
    /// ## Errors
    /// - `InvalidUrl` / `InvalidPayload` before anything else happens
    /// - `RateLimited` / `Blocked` when the backoff check rejects the attempt
    /// - `Timeout`, `Connection`, `Server`, `NotFound`, `Throttled`, `Http`,
    ///   `InvalidResponseFormat` from the round trip itself
    pub async fn send_data(&self, url: &str, payload: Value) -> WebhookResult<WebhookResponse> {
        validate_url(url)?;
        let mut payload = validate_payload(payload)?;

        let stripped = sanitize_map(&mut payload);
        if stripped > 0 {
            tracing::warn!(stripped, "Removed sensitive keys from webhook payload");
        }

        let cache_key = self.cache_key_for(url, &payload);
        if let Some(key) = &cache_key {
            if let Some(body) = lock(&self.cache).get(key) {
                tracing::info!(cache_key = %key, "Webhook cache hit");
                return Ok(WebhookResponse {
                    success: true,
                    from_cache: true,
                    body,
                });
            }
        }

        lock(&self.limiter).check_and_record().map_err(|e| {
            tracing::warn!(error = %e, "Webhook request rejected by backoff");
            WebhookError::from(e)
        })?;

        let request_id = RequestId::new();
        let body = self.envelope(payload, request_id);
        let started = Instant::now();

        tracing::info!(request_id = %request_id, url = %url, "Sending webhook request");

        let response = self
            .transport
            .post_json(url, &body, self.config.timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout => WebhookError::Timeout {
                    timeout_ms: self.config.timeout_ms(),
                },
                TransportError::Connection(msg) => WebhookError::Connection(msg),
            });

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let body = match response.and_then(classify) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(request_id = %request_id, elapsed_ms, error = %e, "Webhook request failed");
                return Err(e);
            }
        };

        lock(&self.limiter).record_success();
        if let Some(key) = cache_key {
            lock(&self.cache).set_with_ttl(key, body.clone(), self.config.cached_response_ttl);
        }

        tracing::info!(request_id = %request_id, elapsed_ms, "Webhook request completed");

        Ok(WebhookResponse {
            success: true,
            from_cache: false,
            body,
        })
    }

    /// Read-only template listing (cacheable)
    pub async fn fetch_templates(&self) -> WebhookResult<WebhookResponse> {
        let url = self.config.webhook_url.clone();
        self.send_data(&url, json!({ "action": TEMPLATES_ACTION }))
            .await
    }

    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
        tracing::info!("Webhook cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.cache).stats()
    }

    pub fn service_status(&self) -> ServiceStatus {
        ServiceStatus {
            webhook_url: self.config.webhook_url.clone(),
            rate_limit: lock(&self.limiter).snapshot(),
            cache: self.cache_stats(),
        }
    }

    /// Zero the backoff counters and lift any block
    pub fn reset_request_count(&self) {
        lock(&self.limiter).reset();
        tracing::info!("Webhook request counters reset");
    }

    /// Cache key for read-only actions, `None` for everything else
    fn cache_key_for(&self, url: &str, payload: &Map<String, Value>) -> Option<String> {
        let action = payload.get("action").and_then(Value::as_str)?;
        self.config
            .is_cacheable_action(action)
            .then(|| cache_key(url, payload))
    }

    fn envelope(&self, mut payload: Map<String, Value>, request_id: RequestId) -> Value {
        let timestamp = self.now().to_rfc3339_opts(SecondsFormat::Millis, true);
        payload.insert("timestamp".into(), json!(timestamp));
        payload.insert("version".into(), json!(self.config.client_version));
        payload.insert("platform".into(), json!(self.config.platform_tag));
        payload.insert(
            "metadata".into(),
            json!({
                "userAgent": self.config.user_agent,
                "source": self.config.source,
                "requestId": request_id.to_string(),
            }),
        );
        Value::Object(payload)
    }
}

/// Deterministic key: `serde_json` maps serialize with sorted keys
pub fn cache_key(url: &str, payload: &Map<String, Value>) -> String {
    json!({ "url": url, "payload": payload }).to_string()
}

fn validate_url(url: &str) -> WebhookResult<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(WebhookError::InvalidUrl("URL is empty".to_string()));
    }
    let parsed = Url::parse(trimmed).map_err(|e| WebhookError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(WebhookError::InvalidUrl(format!(
            "unsupported scheme '{scheme}'"
        ))),
    }
}

fn validate_payload(payload: Value) -> WebhookResult<Map<String, Value>> {
    match payload {
        Value::Object(map) if !map.is_empty() => Ok(map),
        Value::Object(_) => Err(WebhookError::InvalidPayload(
            "payload is empty".to_string(),
        )),
        _ => Err(WebhookError::InvalidPayload(
            "payload must be a JSON object".to_string(),
        )),
    }
}

/// Map a wire response to its JSON body or a typed failure
fn classify(response: TransportResponse) -> WebhookResult<Value> {
    match response.status {
        500..=u16::MAX => return Err(WebhookError::Server { status: response.status }),
        404 => return Err(WebhookError::NotFound),
        429 => return Err(WebhookError::Throttled),
        _ if !response.is_success() => {
            return Err(WebhookError::Http { status: response.status });
        }
        _ => {}
    }

    if !response.is_json() {
        let content_type = response.content_type.as_deref().unwrap_or("none");
        return Err(WebhookError::InvalidResponseFormat(format!(
            "expected JSON, got content-type '{content_type}'"
        )));
    }

    serde_json::from_str(&response.body)
        .map_err(|e| WebhookError::InvalidResponseFormat(e.to_string()))
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//! Rate Limiting Infrastructure
//!
//! Client-side exponential backoff with a hard block.
//!
//! ## Policy
//! - Each attempt must wait `base_interval * 2^min(request_count, max_exponent)`
//!   after the previous one, otherwise it is rejected immediately (no sleeping).
//! - Once `block_threshold` attempts are outstanding, the limiter blocks every
//!   attempt for `block_cooldown`, then starts over from zero.
//! - A successful round trip gives one attempt back via [`BackoffLimiter::record_success`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::clock::{Clock, duration_ms};

/// Backoff configuration
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Minimum spacing between attempts before any backoff is applied
    pub base_interval: Duration,
    /// Cap on the doubling exponent (3 bounds the multiplier at 8x)
    pub max_exponent: u32,
    /// Outstanding attempts that trip the hard block
    pub block_threshold: u32,
    /// How long the hard block lasts
    pub block_cooldown: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(2000),
            max_exponent: 3,
            block_threshold: 3,
            block_cooldown: Duration::from_secs(60),
        }
    }
}

impl BackoffConfig {
    pub fn base_interval_ms(&self) -> i64 {
        duration_ms(self.base_interval)
    }

    pub fn block_cooldown_ms(&self) -> i64 {
        duration_ms(self.block_cooldown)
    }
}

/// Why an attempt was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// Attempt came before the backoff window elapsed
    #[error("Too many requests. Wait {} seconds before trying again", ceil_secs(*.retry_after_ms))]
    TooSoon { retry_after_ms: i64 },

    /// Hard block is active
    #[error("Service temporarily blocked. Try again in {} seconds", ceil_secs(*.retry_after_ms))]
    Blocked { retry_after_ms: i64 },
}

impl RateLimitError {
    pub fn retry_after_ms(&self) -> i64 {
        match self {
            RateLimitError::TooSoon { retry_after_ms } | RateLimitError::Blocked { retry_after_ms } => {
                *retry_after_ms
            }
        }
    }

    /// Wait time rounded up to whole seconds
    pub fn retry_after_secs(&self) -> i64 {
        ceil_secs(self.retry_after_ms())
    }
}

fn ceil_secs(ms: i64) -> i64 {
    (ms.max(0) + 999) / 1000
}

/// Limiter state for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitSnapshot {
    pub request_count: u32,
    pub last_request_ms: Option<i64>,
    pub is_blocked: bool,
    pub blocked_until_ms: Option<i64>,
    /// Milliseconds until the next attempt would pass the backoff check
    pub next_allowed_in_ms: i64,
}

/// Exponential backoff limiter
pub struct BackoffLimiter {
    config: BackoffConfig,
    clock: Arc<dyn Clock>,
    request_count: u32,
    last_request_ms: Option<i64>,
    blocked_until_ms: Option<i64>,
}

impl BackoffLimiter {
    pub fn new(config: BackoffConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            request_count: 0,
            last_request_ms: None,
            blocked_until_ms: None,
        }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Required spacing after `request_count` outstanding attempts
    pub fn required_delay(&self, request_count: u32) -> Duration {
        let exponent = request_count.min(self.config.max_exponent);
        self.config.base_interval.saturating_mul(2u32.saturating_pow(exponent))
    }

    /// Admit or reject an attempt, recording it when admitted
    pub fn check_and_record(&mut self) -> Result<(), RateLimitError> {
        let now_ms = self.clock.now_ms();

        if let Some(until_ms) = self.blocked_until_ms {
            if now_ms < until_ms {
                return Err(RateLimitError::Blocked {
                    retry_after_ms: until_ms - now_ms,
                });
            }
            tracing::info!("Rate limit cooldown elapsed, counters reset");
            self.reset();
        }

        if self.request_count >= self.config.block_threshold {
            let until_ms = now_ms.saturating_add(self.config.block_cooldown_ms());
            self.blocked_until_ms = Some(until_ms);
            tracing::warn!(
                request_count = self.request_count,
                cooldown_ms = self.config.block_cooldown_ms(),
                "Request threshold reached, blocking"
            );
            return Err(RateLimitError::Blocked {
                retry_after_ms: until_ms - now_ms,
            });
        }

        let remaining_ms = self.remaining_backoff_ms(now_ms);
        if remaining_ms > 0 {
            return Err(RateLimitError::TooSoon {
                retry_after_ms: remaining_ms,
            });
        }

        self.request_count += 1;
        self.last_request_ms = Some(now_ms);
        Ok(())
    }

    /// Relax backoff by one step after a successful round trip
    pub fn record_success(&mut self) {
        self.request_count = self.request_count.saturating_sub(1);
    }

    /// Zero all counters and lift any block
    pub fn reset(&mut self) {
        self.request_count = 0;
        self.last_request_ms = None;
        self.blocked_until_ms = None;
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        let now_ms = self.clock.now_ms();
        let blocked_until_ms = self.blocked_until_ms.filter(|until| now_ms < *until);
        let next_allowed_in_ms = match blocked_until_ms {
            Some(until_ms) => until_ms - now_ms,
            None => self.remaining_backoff_ms(now_ms),
        };

        RateLimitSnapshot {
            request_count: self.request_count,
            last_request_ms: self.last_request_ms,
            is_blocked: blocked_until_ms.is_some(),
            blocked_until_ms,
            next_allowed_in_ms,
        }
    }

    fn remaining_backoff_ms(&self, now_ms: i64) -> i64 {
        let Some(last_ms) = self.last_request_ms else {
            return 0;
        };
        let required_ms = duration_ms(self.required_delay(self.request_count));
        (required_ms - (now_ms - last_ms)).max(0)
    }
}

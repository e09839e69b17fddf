//! Rate Limiter
//!
//! Per-host token bucket for explorer calls. Tokens refill continuously
//! at `rate` per `period`; a denied acquire reports how long to wait.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Limit applied to one host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointConfig {
    pub rate: u32,
    pub period: Duration,
    /// Tokens available to a fresh or idle host
    pub burst: u32,
}

impl EndpointConfig {
    pub fn per_second(rate: u32) -> Self {
        Self {
            rate,
            period: Duration::from_secs(1),
            burst: rate,
        }
    }

    fn refill_interval(&self) -> Duration {
        if self.rate == 0 {
            return self.period;
        }
        self.period / self.rate
    }
}

struct Bucket {
    tokens: f64,
    updated: Instant,
}

pub struct RateLimiter {
    default_config: EndpointConfig,
    endpoint_configs: HashMap<String, EndpointConfig>,
    buckets: HashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(default_config: EndpointConfig) -> Self {
        Self {
            default_config,
            endpoint_configs: HashMap::new(),
            buckets: HashMap::new(),
        }
    }

    /// Override the limit for `host`, resetting its bucket
    pub fn configure_endpoint(&mut self, host: &str, config: EndpointConfig) {
        self.endpoint_configs.insert(host.to_string(), config);
        self.buckets.remove(host);
    }

    /// Apply `config` to `host` unless it already has exactly that limit.
    /// An existing bucket keeps its remaining tokens.
    pub fn ensure_endpoint(&mut self, host: &str, config: EndpointConfig) {
        if self.endpoint_configs.get(host) != Some(&config) {
            self.configure_endpoint(host, config);
        }
    }

    fn config_for(&self, host: &str) -> EndpointConfig {
        self.endpoint_configs
            .get(host)
            .copied()
            .unwrap_or(self.default_config)
    }

    /// Take one token for `host`, or return the time until one is available
    pub fn try_acquire(&mut self, host: &str) -> Result<(), Duration> {
        self.try_acquire_at(host, Instant::now())
    }

    fn try_acquire_at(&mut self, host: &str, now: Instant) -> Result<(), Duration> {
        let config = self.config_for(host);
        let capacity = f64::from(config.burst.max(1));

        let bucket = self.buckets.entry(host.to_string()).or_insert(Bucket {
            tokens: capacity,
            updated: now,
        });

        let interval = config.refill_interval();
        if !interval.is_zero() {
            let elapsed = now.saturating_duration_since(bucket.updated);
            let refilled = elapsed.as_secs_f64() / interval.as_secs_f64();
            bucket.tokens = (bucket.tokens + refilled).min(capacity);
        }
        bucket.updated = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(());
        }
        if config.rate == 0 {
            return Err(config.period);
        }
        Err(interval.mul_f64(1.0 - bucket.tokens))
    }
}

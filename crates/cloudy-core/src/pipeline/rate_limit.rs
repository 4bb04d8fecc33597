//! Backoff applied after each live vendor call.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::PipelineConfig;

/// Scheduling hook the orchestrator awaits after every live call
/// (never after cache hits).
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn after_call(&self, vendor: &str);
}

/// Sleeps a fixed delay, with optional per-vendor overrides.
#[derive(Debug, Clone, Default)]
pub struct FixedDelay {
    default: Duration,
    overrides: BTreeMap<String, Duration>,
}

impl FixedDelay {
    pub fn new(default: Duration) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            default: Duration::from_millis(config.rate_limit_ms),
            overrides: config
                .vendor_delays_ms
                .iter()
                .map(|(vendor, ms)| (vendor.clone(), Duration::from_millis(*ms)))
                .collect(),
        }
    }

    /// Delay applied after a call to `vendor`.
    pub fn delay_for(&self, vendor: &str) -> Duration {
        self.overrides.get(vendor).copied().unwrap_or(self.default)
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn after_call(&self, vendor: &str) {
        let delay = self.delay_for(vendor);
        if !delay.is_zero() {
            tracing::trace!(vendor, "Rate limit backoff {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_overrides() {
        let mut config = PipelineConfig::default();
        config.vendor_delays_ms.insert("cloudsight".to_string(), 5000);
        let limiter = FixedDelay::from_config(&config);
        assert_eq!(limiter.delay_for("cloudsight"), Duration::from_secs(5));
        assert_eq!(limiter.delay_for("google"), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_after_call_sleeps_for_delay() {
        let limiter = FixedDelay::new(Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        limiter.after_call("google").await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}

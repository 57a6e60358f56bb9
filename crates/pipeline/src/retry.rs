//! Publish retry policy
//!
//! Each attempt is bounded by a timeout. Transient failures are retried
//! with exponential backoff (`delay * 2`, capped at `max_delay`); permanent
//! ones are returned immediately.

use std::time::Duration;

use relay_config::PipelineConfig;
use relay_protocol::SyslogEvent;
use relay_sinks::{PublishError, PublishReceipt, Publisher};

/// Timeout and backoff settings for publishing one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound for a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            retries: config.retry_attempts,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
            attempt_timeout: config.publish_timeout,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry(attempt_timeout: Duration) -> Self {
        Self {
            retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            attempt_timeout,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let mut delay = self.base_delay;
        for _ in 1..retry {
            delay = std::cmp::min(delay * 2, self.max_delay);
        }
        std::cmp::min(delay, self.max_delay)
    }
}

/// Final publish failure with the number of attempts made
#[derive(Debug)]
pub struct Undelivered {
    pub error: PublishError,
    pub attempts: u32,
}

/// Publish `event`, retrying transient failures according to `policy`
pub async fn publish_with_retry(
    publisher: &dyn Publisher,
    topic: &str,
    event: &SyslogEvent,
    policy: &RetryPolicy,
) -> Result<PublishReceipt, Undelivered> {
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            tracing::warn!(
                publisher = publisher.name(),
                retry = attempt,
                max_retries = policy.retries,
                delay_ms = delay.as_millis() as u64,
                "retrying publish"
            );
            tokio::time::sleep(delay).await;
        }
        attempt += 1;

        let result =
            match tokio::time::timeout(policy.attempt_timeout, publisher.publish(topic, event))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(PublishError::Timeout(policy.attempt_timeout)),
            };

        match result {
            Ok(receipt) => return Ok(receipt),
            Err(e) if e.is_transient() && attempt <= policy.retries => {
                tracing::warn!(
                    publisher = publisher.name(),
                    error = %e,
                    attempt = attempt,
                    "publish failed, will retry"
                );
            }
            Err(error) => {
                return Err(Undelivered {
                    error,
                    attempts: attempt,
                });
            }
        }
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Exponential backoff retry without an attempt limit, bounded by a cancellation token

use crate::constants::backoff::{
    INITIAL_INTERVAL_MILLIS, MAX_INTERVAL_SECS, MULTIPLIER, RANDOMIZATION_FACTOR,
};
use crate::error::{Error, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub multiplier: f64,
    /// Each delay is drawn from `interval * (1 ± randomization_factor)`
    pub randomization_factor: f64,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(INITIAL_INTERVAL_MILLIS),
            multiplier: MULTIPLIER,
            randomization_factor: RANDOMIZATION_FACTOR,
            max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        }
    }
}

impl RetryPolicy {
    /// Interval following `current`, capped at `max_interval`
    pub fn next_interval(&self, current: Duration) -> Duration {
        std::cmp::min(
            self.max_interval,
            Duration::from_secs_f64(current.as_secs_f64() * self.multiplier),
        )
    }

    fn jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor <= 0.0 {
            return interval;
        }
        let delta = interval.as_secs_f64() * self.randomization_factor;
        let low = interval.as_secs_f64() - delta;
        let high = interval.as_secs_f64() + delta;
        Duration::from_secs_f64(rand::thread_rng().gen_range(low..=high).max(0.0))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or `token` is cancelled. Cancellation interrupts both the operation and
    /// the delay and yields `Error::Cancelled`.
    pub async fn retry<T, F, Fut>(
        &self,
        token: &CancellationToken,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut interval = self.initial_interval;
        let mut attempt: u32 = 0;

        loop {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }

            attempt += 1;
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Cancelled),
                result = operation() => result,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            let delay = self.jitter(interval);
            warn!(
                "{} failed (attempt {}): {}. Retrying in {:?}...",
                operation_name, attempt, err, delay
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            interval = self.next_interval(interval);
        }
    }
}

// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded retry with backoff for read-modify-write cycles.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::constants::retry::{FACTOR, INITIAL_DELAY_MS, JITTER, STEPS};
use crate::error::ApplyError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub steps: u32,
    pub initial_delay: Duration,
    pub factor: f64,
    pub jitter: f64,
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            steps: STEPS,
            initial_delay: Duration::from_millis(INITIAL_DELAY_MS),
            factor: FACTOR,
            jitter: JITTER,
            max_delay: None,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt
    pub fn none() -> Self {
        Self {
            steps: 1,
            ..Self::default()
        }
    }

    /// Delay slept after the given (zero based) failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.factor.powi(attempt as i32);
        let base = match self.max_delay {
            Some(max) => base.min(max.as_secs_f64()),
            None => base,
        };
        let jitter = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(0.0..=self.jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64(base * (1.0 + jitter))
    }

    /// Run `attempt` until it succeeds, fails permanently, runs out of steps
    /// or `cancel` fires. Every call of `attempt` must re-read any state it
    /// modifies.
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut attempt: F) -> Result<T, ApplyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApplyError>>,
    {
        let steps = self.steps.max(1);
        let mut tries = 0;

        loop {
            tries += 1;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApplyError::Cancelled),
                result = attempt() => result,
            };

            let source = match result {
                Ok(value) => return Ok(value),
                Err(ApplyError::Api { source, .. }) if is_retryable(&source) && tries < steps => source,
                Err(ApplyError::Api { source, .. }) => {
                    return Err(ApplyError::Api {
                        attempts: tries,
                        source,
                    })
                }
                Err(err) => return Err(err),
            };

            let delay = self.delay(tries - 1);
            debug!(
                "Attempt {}/{} failed with retryable error: {}, retrying in {:?}",
                tries, steps, source, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ApplyError::Cancelled),
                _ = sleep(delay) => {}
            }
        }
    }
}

/// Conflicts, throttling, server-side and transport errors are worth retrying
pub fn is_retryable(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(resp) => matches!(resp.code, 409 | 429 | 500 | 502 | 503 | 504),
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        _ => false,
    }
}

/// Await `fut` unless `cancel` fires first
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, ApplyError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ApplyError::Cancelled),
        value = fut => Ok(value),
    }
}

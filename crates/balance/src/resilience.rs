//! Resilience envelope for remote calls.
//!
//! Three composable policies, outermost to innermost: retry with
//! exponential backoff and jitter, circuit breaker, per-attempt timeout.
//! The envelope carries no business knowledge; callers only ever see
//! success or a [`GatewayError`], never retry counts or breaker state.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::GatewayError;

/// Policy values for the envelope.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// First backoff delay; doubles on each further attempt.
    pub backoff_base: Duration,
    /// Upper bound of the random jitter added to each backoff delay.
    pub max_jitter: Duration,
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// How long an open circuit fails fast before resetting.
    pub break_duration: Duration,
    /// Per-attempt ceiling; exceeding it counts as a transient failure.
    pub call_timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
            failure_threshold: 5,
            break_duration: Duration::from_secs(30),
            call_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BreakerState {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
}

/// Retry + circuit breaker + timeout wrapper for async operations.
#[derive(Clone)]
pub struct ResilienceEnvelope {
    config: ResilienceConfig,
    breaker: Arc<Mutex<BreakerState>>,
}

impl ResilienceEnvelope {
    /// Creates an envelope with the given policy values.
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            breaker: Arc::new(Mutex::new(BreakerState::Closed {
                consecutive_failures: 0,
            })),
        }
    }

    /// Runs `op` under the full policy stack.
    ///
    /// `what` names the call in log lines and failure messages.
    pub async fn execute<T, F, Fut>(&self, what: &str, op: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 1;
        loop {
            match self.try_once(what, &op).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.config.max_attempts {
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        call = what,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "balance call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_once<T, F, Fut>(&self, what: &str, op: &F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        if self.circuit_is_open() {
            return Err(GatewayError::External(format!(
                "{what} failed: circuit open"
            )));
        }

        match tokio::time::timeout(self.config.call_timeout, op()).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(err)) => {
                self.record_failure(what);
                Err(err)
            }
            Err(_) => {
                self.record_failure(what);
                Err(GatewayError::External(format!(
                    "{what} timed out after {:?}",
                    self.config.call_timeout
                )))
            }
        }
    }

    /// base * 2^(attempt-1) plus random jitter, so synchronized callers
    /// spread out instead of retrying in lockstep.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.config.backoff_base * (1 << (attempt - 1));
        let jitter_ms = self.config.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return exponential;
        }
        exponential + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    fn circuit_is_open(&self) -> bool {
        let mut state = self.breaker.lock().unwrap();
        match *state {
            BreakerState::Open { until } => {
                if Instant::now() < until {
                    true
                } else {
                    // Break duration elapsed: reset and allow traffic again.
                    *state = BreakerState::Closed {
                        consecutive_failures: 0,
                    };
                    false
                }
            }
            BreakerState::Closed { .. } => false,
        }
    }

    fn record_success(&self) {
        let mut state = self.breaker.lock().unwrap();
        *state = BreakerState::Closed {
            consecutive_failures: 0,
        };
    }

    fn record_failure(&self, what: &str) {
        let mut state = self.breaker.lock().unwrap();
        if let BreakerState::Closed {
            consecutive_failures,
        } = *state
        {
            let failures = consecutive_failures + 1;
            if failures >= self.config.failure_threshold {
                tracing::warn!(
                    call = what,
                    failures,
                    break_secs = self.config.break_duration.as_secs(),
                    "circuit opened"
                );
                *state = BreakerState::Open {
                    until: Instant::now() + self.config.break_duration,
                };
            } else {
                *state = BreakerState::Closed {
                    consecutive_failures: failures,
                };
            }
        }
    }
}

//! Retry policy and the per-item attempt state machine.
//!
//! Delay before attempt k (k >= 2) is `base * 2^(k-2)`, jittered by ±25 %
//! and capped. The token bucket is honored anew on every attempt because the
//! retried operation goes back through the rate-limited client.

use std::time::Duration;

use rand::Rng;

use crate::cancel::CancelFlag;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(1),
            cap: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Backoff before the given attempt number (2-based; attempt 1 has no
    /// delay). Jitter keeps synchronized workers from thundering together.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(2).min(16);
        let nominal = self.base.as_secs_f64() * f64::from(1u32 << exp);
        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_secs_f64((nominal * jitter).min(self.cap.as_secs_f64()))
    }
}

/// Explicit per-item lifecycle so fault-injection tests can assert attempt
/// counts instead of guessing from timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    Idle,
    InFlight { attempt: u32 },
    Retrying { next_attempt: u32 },
    Succeeded { attempts: u32 },
    Failed { attempts: u32 },
}

/// Run `op` under the retry policy. Returns the final result together with
/// the number of attempts actually made.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancelFlag,
    mut op: F,
) -> (Result<T>, u32)
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;
        if let Err(err) = cancel.check() {
            return (Err(err), attempt - 1);
        }
        let delay = policy.delay_before(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
            if let Err(err) = cancel.check() {
                return (Err(err), attempt - 1);
            }
        }

        match op(attempt).await {
            Ok(value) => return (Ok(value), attempt),
            Err(err) => {
                if !err.is_retriable() || attempt >= policy.max_attempts {
                    return (Err(err), attempt);
                }
                tracing::debug!(attempt, error = %err, "retrying after failure");
            }
        }
    }
}

impl ItemState {
    /// Terminal state for a finished item.
    pub fn finished(success: bool, attempts: u32) -> Self {
        if success {
            Self::Succeeded { attempts }
        } else {
            Self::Failed { attempts }
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Idle => 0,
            Self::InFlight { attempt } => *attempt,
            Self::Retrying { next_attempt } => next_attempt.saturating_sub(1),
            Self::Succeeded { attempts } | Self::Failed { attempts } => *attempts,
        }
    }
}

//! Process-wide token bucket.
//!
//! NCBI allows 3 requests per second without an API key and 10 with one.
//! Capacity equals the rate, tokens replenish continuously, and every remote
//! call in the process must take one token before touching the network.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::cancel::CancelFlag;
use crate::error::Result;

#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<Bucket>,
    rate: f64,
    capacity: f64,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(rate_per_second: u32) -> Self {
        let rate = f64::from(rate_per_second.max(1));
        Self {
            state: Mutex::new(Bucket {
                tokens: rate,
                last_refill: Instant::now(),
            }),
            rate,
            capacity: rate,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate as u32
    }

    /// Take one token, sleeping until one is available. Cancellation is
    /// observed on every wake-up.
    pub async fn acquire(&self, cancel: &CancelFlag) -> Result<()> {
        loop {
            cancel.check()?;
            let wait = {
                let mut bucket = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.capacity);
                bucket.last_refill = now;
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return Ok(());
                }
                Duration::from_secs_f64((1.0 - bucket.tokens) / self.rate)
            };
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn burst_up_to_capacity_is_immediate() {
        let limiter = RateLimiter::new(3);
        let cancel = CancelFlag::new();
        let start = StdInstant::now();
        for _ in 0..3 {
            limiter.acquire(&cancel).await.unwrap();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn sustained_rate_is_enforced() {
        let limiter = RateLimiter::new(5);
        let cancel = CancelFlag::new();
        let start = StdInstant::now();
        // 5 immediate + 5 replenished at 5/s: the last one lands near t=1s.
        for _ in 0..10 {
            limiter.acquire(&cancel).await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn rate_holds_across_many_workers() {
        let limiter = Arc::new(RateLimiter::new(4));
        let cancel = CancelFlag::new();
        let start = StdInstant::now();
        let mut handles = Vec::new();
        for _ in 0..12 {
            let limiter = Arc::clone(&limiter);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire(&cancel).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // 12 acquisitions at 4/s with burst 4: at least ~2s.
        assert!(start.elapsed() >= Duration::from_millis(1800));
    }

    #[tokio::test]
    async fn cancellation_aborts_waiters() {
        let limiter = Arc::new(RateLimiter::new(1));
        let cancel = CancelFlag::new();
        limiter.acquire(&cancel).await.unwrap();

        let waiter_limiter = Arc::clone(&limiter);
        let waiter_cancel = cancel.clone();
        let waiter = tokio::spawn(async move {
            // Drain the refill too, then this call must block.
            waiter_limiter.acquire(&waiter_cancel).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        // Either it got the refilled token before the cancel landed, or it
        // observed the cancellation; it must not hang.
        if let Err(err) = result {
            assert!(matches!(err, crate::error::ClientError::Cancelled));
        }
    }
}

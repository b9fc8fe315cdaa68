use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Process-wide spacing of outgoing Talana requests.
///
/// Every caller reserves the next free slot under the lock and then sleeps until that
/// slot without holding it, so preparing unrelated requests is never serialized.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_allowed: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Reserves a slot and waits for it. Returns the reserved instant.
    pub async fn acquire(&self) -> Instant {
        let slot = self.reserve();
        let now = Instant::now();
        if slot > now {
            tracing::trace!("Rate limiter: waiting {:?} for next Talana slot", slot - now);
            tokio::time::sleep_until(slot).await;
        }
        slot
    }

    /// Atomically takes `max(watermark, now)` and moves the watermark one interval ahead.
    fn reserve(&self) -> Instant {
        let mut next = self
            .next_allowed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let slot = match *next {
            Some(watermark) if watermark > now => watermark,
            _ => now,
        };
        *next = Some(slot + self.min_interval);
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_request_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_concurrent_slots_are_spaced() {
        let interval = Duration::from_millis(40);
        let limiter = Arc::new(RateLimiter::new(interval));

        let mut handles = vec![];
        for _ in 0..5 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                let slot = limiter.acquire().await;
                (slot, Instant::now())
            }));
        }

        let mut slots = vec![];
        for handle in handles {
            let (slot, released_at) = handle.await.unwrap();
            // Nobody runs before its slot
            assert!(released_at >= slot);
            slots.push(slot);
        }
        slots.sort();
        for pair in slots.windows(2) {
            assert!(pair[1] - pair[0] >= interval);
        }
    }

    #[tokio::test]
    async fn test_idle_limiter_restarts_from_now() {
        let limiter = RateLimiter::new(Duration::from_millis(10));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let before = Instant::now();
        let slot = limiter.acquire().await;
        assert!(slot >= before);
        assert!(slot - before < Duration::from_millis(10));
    }
}

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::error::AppError;

/// In-process token bucket guarding the login endpoint.
///
/// Each client key (the submitted email) gets its own bucket. A login attempt
/// consumes one token; an empty bucket rejects the attempt before any
/// credential check runs, so the limit applies independently of whether the
/// password is correct. Tokens refill continuously at `capacity / window`
/// per second.
///
/// Capacity and window are policy knobs supplied from `Config`, not
/// hard-coded constants.
pub struct LoginRateLimiter {
    capacity: u32,
    refill_rate: f64,
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32) -> Self {
        TokenBucket {
            tokens: capacity as f64,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, rate: f64, capacity: u32) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity as f64);
        self.last_refill = now;
    }

    fn try_consume(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl LoginRateLimiter {
    pub fn new(capacity: u32, window_secs: u64) -> Self {
        LoginRateLimiter {
            capacity,
            refill_rate: capacity as f64 / window_secs.max(1) as f64,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Consumes one attempt for `key`, or fails with `AppError::RateLimited`
    /// when the bucket is drained.
    pub fn check(&self, key: &str) -> Result<(), AppError> {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.refill(self.refill_rate, self.capacity);
        if bucket.try_consume() {
            Ok(())
        } else {
            log::warn!("login rate limit exceeded for {}", key);
            Err(AppError::RateLimited(
                "Too many login attempts, try again later".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_allows_up_to_capacity_then_rejects() {
        let limiter = LoginRateLimiter::new(5, 300);
        for _ in 0..5 {
            assert!(limiter.check("user@example.com").is_ok());
        }
        // Sixth attempt within the window is rejected regardless of credentials
        match limiter.check("user@example.com") {
            Err(AppError::RateLimited(_)) => {}
            other => panic!("expected RateLimited, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_buckets_are_per_key() {
        let limiter = LoginRateLimiter::new(1, 300);
        assert!(limiter.check("a@example.com").is_ok());
        assert!(limiter.check("a@example.com").is_err());
        // A different key has its own bucket
        assert!(limiter.check("b@example.com").is_ok());
    }

    #[test]
    fn test_bucket_refills_over_time() {
        // Capacity 2, window 1s -> 2 tokens/sec
        let limiter = LoginRateLimiter::new(2, 1);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_err());

        std::thread::sleep(Duration::from_millis(600));
        assert!(limiter.check("k").is_ok());
    }

    #[test]
    fn test_refill_capped_at_capacity() {
        let mut bucket = TokenBucket::new(3);
        bucket.tokens = 2.5;
        bucket.last_refill = Instant::now() - Duration::from_secs(100);
        bucket.refill(1.0, 3);
        assert_eq!(bucket.tokens, 3.0);
    }
}

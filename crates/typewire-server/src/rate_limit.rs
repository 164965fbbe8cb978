use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

use tokio::sync::Mutex;

/// Per-IP token bucket for rate limiting.
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// IP-based rate limiter using the token bucket algorithm, applied at the
/// WebSocket-upgrade boundary (this server has no REST surface to protect,
/// but unbounded connection *attempts* from one address are the same kind of
/// abuse the teacher's `rate_limit.rs` guards against).
pub struct IpRateLimiter {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
    max_tokens: f64,
    refill_rate: f64, // tokens per second
}

impl IpRateLimiter {
    pub fn new(max_tokens: f64, refill_rate: f64) -> Self {
        Self { buckets: Mutex::new(HashMap::new()), max_tokens, refill_rate }
    }

    /// Returns `true` if the connection attempt is allowed, `false` if
    /// rate-limited.
    pub async fn check_rate_limit(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets.entry(ip).or_insert_with(|| TokenBucket { tokens: self.max_tokens, last_refill: now });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Removes stale entries that haven't been touched in `max_age`.
    pub async fn cleanup(&self, max_age: std::time::Duration) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < max_age);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_requests_within_limit() {
        let limiter = IpRateLimiter::new(5.0, 5.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        for _ in 0..5 {
            assert!(limiter.check_rate_limit(ip).await);
        }
    }

    #[tokio::test]
    async fn rejects_requests_over_limit() {
        let limiter = IpRateLimiter::new(3.0, 0.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(limiter.check_rate_limit(ip).await);
        assert!(limiter.check_rate_limit(ip).await);
        assert!(limiter.check_rate_limit(ip).await);
        assert!(!limiter.check_rate_limit(ip).await);
    }

    #[tokio::test]
    async fn separate_buckets_per_ip() {
        let limiter = IpRateLimiter::new(1.0, 0.0);
        let ip1: IpAddr = "10.0.0.1".parse().unwrap();
        let ip2: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.check_rate_limit(ip1).await);
        assert!(!limiter.check_rate_limit(ip1).await);
        assert!(limiter.check_rate_limit(ip2).await);
        assert!(!limiter.check_rate_limit(ip2).await);
    }

    #[tokio::test]
    async fn cleanup_removes_stale_entries() {
        let limiter = IpRateLimiter::new(5.0, 5.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        limiter.check_rate_limit(ip).await;
        limiter.cleanup(std::time::Duration::ZERO).await;
        assert!(limiter.buckets.lock().await.is_empty());
    }
}

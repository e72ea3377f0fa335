use std::time::Duration;

use tokio::time::Interval;

/// A token bucket limiting throughput to a configured rate.
///
/// Refills `rate / 10` bytes every 100ms rather than computing throughput
/// as total-bytes-over-total-elapsed-time: that approach (used by the
/// system this one replaces) divides by a small denominator early on and
/// throttles far harder than the configured limit until the stream has
/// been running for a while. A fixed-tick refill keeps long-term
/// throughput at the limit without the cold-start penalty.
pub struct RateLimiter {
    tokens: u64,
    capacity: u64,
    refill_per_tick: u64,
    interval: Interval,
}

impl RateLimiter {
    /// Builds a limiter allowing `kbps` kilobytes per second, with a burst
    /// capacity of one second's worth of traffic.
    pub fn new(kbps: u32) -> Self {
        let capacity = u64::from(kbps) * 1024;
        Self {
            tokens: capacity,
            capacity,
            refill_per_tick: (capacity / 10).max(1),
            interval: tokio::time::interval(Duration::from_millis(100)),
        }
    }

    /// Waits until `n` bytes' worth of budget is available and spends it.
    pub async fn acquire(&mut self, mut n: u64) {
        while n > 0 {
            if self.tokens == 0 {
                self.interval.tick().await;
                self.tokens = (self.tokens + self.refill_per_tick).min(self.capacity);
                continue;
            }

            let take = n.min(self.tokens);
            self.tokens -= take;
            n -= take;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn burst_up_to_capacity_is_immediate() {
        let mut limiter = RateLimiter::new(10); // 10KB/s, 10KB burst capacity
        let start = Instant::now();
        limiter.acquire(10 * 1024).await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_bucket_waits_for_a_refill_tick() {
        let mut limiter = RateLimiter::new(10);
        limiter.acquire(10 * 1024).await;

        let acquire = limiter.acquire(1024);
        tokio::pin!(acquire);

        tokio::select! {
            _ = &mut acquire => panic!("acquired before a refill tick elapsed"),
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
        }

        tokio::time::advance(Duration::from_millis(60)).await;
        acquire.await;
    }
}

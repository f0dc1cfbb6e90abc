//! Minimum-interval rate limiter for exchange requests.
//!
//! Every request waits until at least `min_interval` has passed since the previous
//! one started. The first request goes out immediately.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Spaces consecutive requests by a fixed minimum interval.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Block until a request may go out, then mark it as sent.
    ///
    /// Returns how long the caller was held back.
    pub fn acquire(&self) -> Duration {
        let mut last = self.last_request.lock().unwrap_or_else(|e| e.into_inner());
        let delay = match *last {
            None => Duration::ZERO,
            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        *last = Some(Instant::now());
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_is_not_delayed() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert_eq!(limiter.acquire(), Duration::ZERO);
    }

    #[test]
    fn second_request_waits_out_the_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        limiter.acquire();

        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn no_wait_after_interval_has_passed() {
        let limiter = RateLimiter::new(Duration::from_millis(5));
        limiter.acquire();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(limiter.acquire(), Duration::ZERO);
    }
}

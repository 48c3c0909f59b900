use std::{collections::VecDeque, time::Duration};

use tokio::time::{sleep, Instant};

use crate::config::RateLimitConfig;

/// Single-caller sliding-window limiter.
///
/// Keeps the dispatch times that fall inside the trailing window and blocks
/// in [`RateLimiter::admit`] until another dispatch fits under the ceiling
/// and the minimum spacing since the previous dispatch has elapsed.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    min_spacing: Duration,
    safety_margin: Duration,
    dispatched: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests_per_window.max(1),
            window: config.window,
            min_spacing: config.min_spacing,
            safety_margin: config.safety_margin,
            dispatched: VecDeque::new(),
        }
    }

    pub async fn admit(&mut self) {
        loop {
            let now = Instant::now();
            self.evict(now);
            if self.dispatched.len() < self.max_requests {
                break;
            }
            let Some(&oldest) = self.dispatched.front() else {
                break;
            };
            let wait = (oldest + self.window + self.safety_margin).saturating_duration_since(now);
            tracing::info!(
                target: "limiter",
                in_window = self.dispatched.len(),
                wait_ms = wait.as_millis() as u64,
                "request ceiling reached, waiting"
            );
            sleep(wait).await;
        }

        if let Some(&last) = self.dispatched.back() {
            let elapsed = Instant::now().saturating_duration_since(last);
            if elapsed < self.min_spacing {
                sleep(self.min_spacing - elapsed).await;
            }
        }

        self.dispatched.push_back(Instant::now());
    }

    fn evict(&mut self, now: Instant) {
        while let Some(&front) = self.dispatched.front() {
            if now.saturating_duration_since(front) >= self.window {
                self.dispatched.pop_front();
            } else {
                break;
            }
        }
    }
}

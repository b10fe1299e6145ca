//! Sliding-window request limiter.
//!
//! Each [`RateLimiter`] owns its own window; the caller holds the instance
//! and passes it into the request path.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::AppError;

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    /// Accepted request times, oldest first.
    hits: VecDeque<Instant>,
}

impl RateLimiter {
    /// At most `limit` requests per 60 seconds.
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, DEFAULT_WINDOW)
    }

    pub fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window, hits: VecDeque::new() }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Admit a request now.
    pub fn check(&mut self) -> Result<(), AppError> {
        self.check_at(Instant::now())
    }

    /// Admit a request at `now`: evict hits older than the window, reject if
    /// the window is full, otherwise record `now`. Rejections are not recorded.
    pub fn check_at(&mut self, now: Instant) -> Result<(), AppError> {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
        if self.hits.len() >= self.limit {
            return Err(AppError::RateLimitExceeded {
                limit: self.limit,
                window_secs: self.window.as_secs(),
            });
        }
        self.hits.push_back(now);
        Ok(())
    }

    /// Requests still counted in the window as of `now`.
    pub fn in_window(&self, now: Instant) -> usize {
        self.hits
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < self.window)
            .count()
    }
}

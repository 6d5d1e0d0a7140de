//! Global request rate limiting.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Sliding window of accepted request instants.
#[derive(Debug)]
struct SlidingWindow {
    timestamps: VecDeque<Instant>,
    window_size: Duration,
    max_requests: u32,
}

impl SlidingWindow {
    fn new(max_requests: u32, window_size: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests as usize + 1),
            window_size,
            max_requests,
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window_size) else {
            return;
        };
        while self.timestamps.front().is_some_and(|t| *t < cutoff) {
            self.timestamps.pop_front();
        }
    }

    fn try_request(&mut self) -> bool {
        let now = Instant::now();
        self.evict_expired(now);

        if (self.timestamps.len() as u32) < self.max_requests {
            self.timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    fn current_count(&mut self) -> u32 {
        self.evict_expired(Instant::now());
        self.timestamps.len() as u32
    }
}

/// Limits the total request rate across all clients.
///
/// A limit of zero disables limiting.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Mutex<SlidingWindow>,
}

impl RateLimiter {
    /// Allows `requests_per_second` requests in any one-second window.
    #[must_use]
    pub fn new(requests_per_second: u32) -> Self {
        Self::with_window(requests_per_second, Duration::from_secs(1))
    }

    /// Allows `max_requests` requests in any `window_size` window.
    #[must_use]
    pub fn with_window(max_requests: u32, window_size: Duration) -> Self {
        Self {
            max_requests,
            window: Mutex::new(SlidingWindow::new(max_requests, window_size)),
        }
    }

    /// Records a request if the budget allows it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RateLimited`] when the window is full.
    pub fn check(&self) -> Result<(), ApiError> {
        if self.max_requests == 0 {
            return Ok(());
        }
        if self.window.lock().try_request() {
            Ok(())
        } else {
            Err(ApiError::RateLimited(self.max_requests))
        }
    }

    /// Returns how many requests were accepted in the current window.
    #[must_use]
    pub fn current_count(&self) -> u32 {
        self.window.lock().current_count()
    }

    /// Returns the configured budget.
    #[must_use]
    pub const fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

/// Middleware rejecting requests over the global budget with 429.
pub async fn limit_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.limiter().check() {
        debug!(uri = %request.uri(), "request rejected by rate limiter");
        return e.into_response();
    }
    next.run(request).await
}

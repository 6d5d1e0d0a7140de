//! Shared state for the HTTP server.

use std::sync::Arc;
use std::time::Instant;

use logfind_core::LogService;

use crate::rate_limit::RateLimiter;

/// State shared by every request handler.
#[derive(Debug)]
pub struct AppState {
    /// Query facade.
    service: Arc<LogService>,
    /// Global request limiter.
    limiter: RateLimiter,
    /// Server start time.
    start_time: Instant,
}

impl AppState {
    /// Creates state around `service`, accepting `rate_limit` requests per
    /// second (zero disables limiting).
    #[must_use]
    pub fn new(service: Arc<LogService>, rate_limit: u32) -> Self {
        Self {
            service,
            limiter: RateLimiter::new(rate_limit),
            start_time: Instant::now(),
        }
    }

    /// Returns the query facade.
    #[must_use]
    pub fn service(&self) -> &Arc<LogService> {
        &self.service
    }

    /// Returns the request limiter.
    #[must_use]
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Get server uptime in seconds.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logfind_core::{EngineConfig, LogRepository};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_state_accessors() {
        let dir = TempDir::new().expect("tempdir");
        let repo = LogRepository::new(&EngineConfig::new(dir.path())).expect("repository");
        let service = Arc::new(LogService::new(Arc::new(repo), Duration::from_secs(60)));

        let state = AppState::new(Arc::clone(&service), 10);

        assert_eq!(state.service().file_count(), 0);
        assert_eq!(state.limiter().max_requests(), 10);
        assert_eq!(state.uptime_secs(), 0);
    }
}

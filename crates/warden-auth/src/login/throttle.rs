//! Per-client sliding-window attempt limiter.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::warn;

use warden_core::clock::Clock;
use warden_core::error::{AppError, ErrorKind};

/// Distinct clients tracked before the limiter refuses to evaluate.
const DEFAULT_MAX_CLIENTS: usize = 100_000;

/// Counts login attempts per client IP over a one-minute window.
///
/// Fails closed: when the client table is saturated with live entries the
/// attempt is refused with `ServiceUnavailable` rather than let through.
#[derive(Debug)]
pub struct LoginThrottle {
    attempts: DashMap<String, VecDeque<DateTime<Utc>>>,
    limit: usize,
    max_clients: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl LoginThrottle {
    /// Allow `per_minute` attempts per client. Zero disables the limiter.
    pub fn new(per_minute: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            attempts: DashMap::new(),
            limit: per_minute as usize,
            max_clients: DEFAULT_MAX_CLIENTS,
            window: Duration::minutes(1),
            clock,
        }
    }

    /// Override the tracked-client cap.
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients;
        self
    }

    /// Record an attempt from `client`, refusing it if over the limit.
    pub fn check(&self, client: Option<&str>) -> Result<(), AppError> {
        if self.limit == 0 {
            return Ok(());
        }
        let now = self.clock.now();
        let key = client.unwrap_or("unknown").to_string();

        if !self.attempts.contains_key(&key) && self.attempts.len() >= self.max_clients {
            self.evict_idle(now);
            if self.attempts.len() >= self.max_clients {
                warn!("Login throttle saturated; refusing attempt");
                return Err(AppError::service_unavailable(
                    "Login is temporarily unavailable",
                ));
            }
        }

        let mut window = self.attempts.entry(key).or_default();
        while window.front().is_some_and(|at| *at <= now - self.window) {
            window.pop_front();
        }
        if window.len() >= self.limit {
            return Err(AppError::new(
                ErrorKind::RateLimited,
                "Too many login attempts",
            ));
        }
        window.push_back(now);
        Ok(())
    }

    /// Drop clients with no attempt inside the window.
    pub fn evict_idle(&self, now: DateTime<Utc>) {
        let horizon = now - self.window;
        self.attempts
            .retain(|_, window| window.back().is_some_and(|at| *at > horizon));
    }
}

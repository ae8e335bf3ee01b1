use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ApiError;

const DEFAULT_MAX_ATTEMPTS: usize = 20;
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Per-IP sliding-window limiter for the credential endpoints. Login and
/// register are the only routes where an unauthenticated caller can make
/// the server do bcrypt work, so they get a brute-force throttle.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<DashMap<IpAddr, Vec<Instant>>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            window,
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let cutoff = now - self.window;

        let mut entry = self.attempts.entry(ip).or_default();
        entry.retain(|&attempted_at| attempted_at > cutoff);

        if entry.len() >= self.max_attempts {
            return false;
        }

        entry.push(now);
        true
    }

    /// Drops entries whose whole window has elapsed. Called periodically
    /// from a background task so idle IPs do not accumulate.
    pub fn prune(&self) {
        let cutoff = Instant::now() - self.window;

        self.attempts.retain(|_, attempts| {
            attempts.retain(|&attempted_at| attempted_at > cutoff);
            !attempts.is_empty()
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW)
    }
}

pub async fn rate_limit_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .ok_or(ApiError::RateLimited)?;

    let limiter = req
        .app_data::<actix_web::web::Data<RateLimiter>>()
        .ok_or_else(|| ApiError::Internal("Rate limiter not available".to_string()))?;

    if !limiter.check(ip) {
        log::warn!("Rate limit exceeded for IP: {}", ip);
        return Err(ApiError::RateLimited.into());
    }

    next.call(req).await
}

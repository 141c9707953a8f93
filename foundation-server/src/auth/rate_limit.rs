//! Per-IP fixed-window rate limiting for OTP, registration and login routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::state::AppState;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

/// Requests allowed per window for one route group
#[derive(Debug, Clone, Copy)]
pub struct Limit {
    pub max_requests: u32,
    pub window: Duration,
}

impl Limit {
    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

pub const OTP_LIMIT: Limit = Limit::per_minute(5);
pub const REGISTER_LIMIT: Limit = Limit::per_minute(3);
pub const LOGIN_LIMIT: Limit = Limit::per_minute(5);

const STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route group -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, route: &'static str, ip: &str, limit: Limit) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= limit.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= limit.max_requests
    }

    /// Drop entries whose window started more than 5 minutes ago
    pub async fn cleanup(&self) {
        self.cleanup_older_than(STALE_AFTER).await;
    }

    async fn cleanup_older_than(&self, max_age: Duration) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < max_age);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }
}

/// Client IP: first X-Forwarded-For entry, then the peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &AppState,
    route: &'static str,
    limit: Limit,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = extract_ip(&request);
    if !state.rate_limiter.check(route, &ip, limit).await {
        tracing::warn!(route, ip = %ip, "Rate limit exceeded");
        return Err(AppError::new(ErrorCode::TooManyRequests).into_response());
    }
    Ok(next.run(request).await)
}

/// OTP issuance: 5 requests/minute per IP
pub async fn otp_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, "otp", OTP_LIMIT, request, next).await
}

/// Registration: 3 requests/minute per IP
pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, "register", REGISTER_LIMIT, request, next).await
}

/// Login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, "login", LOGIN_LIMIT, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new();
        let limit = Limit::per_minute(2);
        assert!(limiter.check("otp", "1.2.3.4", limit).await);
        assert!(limiter.check("otp", "1.2.3.4", limit).await);
        assert!(!limiter.check("otp", "1.2.3.4", limit).await);
        // Other IPs and routes are counted separately
        assert!(limiter.check("otp", "5.6.7.8", limit).await);
        assert!(limiter.check("login", "1.2.3.4", limit).await);
    }

    #[tokio::test]
    async fn window_resets() {
        let limiter = RateLimiter::new();
        let limit = Limit {
            max_requests: 1,
            window: Duration::from_millis(20),
        };
        assert!(limiter.check("otp", "ip", limit).await);
        assert!(!limiter.check("otp", "ip", limit).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check("otp", "ip", limit).await);
    }

    #[tokio::test]
    async fn cleanup_drops_stale_entries() {
        let limiter = RateLimiter::new();
        limiter.check("otp", "ip", OTP_LIMIT).await;
        limiter.cleanup().await;
        assert_eq!(limiter.inner.lock().await.len(), 1);

        tokio::time::sleep(Duration::from_millis(5)).await;
        limiter.cleanup_older_than(Duration::from_millis(1)).await;
        assert!(limiter.inner.lock().await.is_empty());
    }
}

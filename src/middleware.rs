//! Request gates in front of the API
//!
//! - `auth_middleware`: optional shared API key
//! - `Owner`: caller identity forwarded by the upstream identity provider
//! - `ClientIp` / `rate_limit_middleware`: per-client request quotas

use std::net::SocketAddr;
use std::num::NonZeroU32;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the authenticated user id
pub const OWNER_HEADER: &str = "x-user-id";

/// Number of tracked clients above which stale limiter entries are pruned
const PRUNE_THRESHOLD: usize = 10_000;

/// Middleware to check for Authorization header
///
/// If an API key is configured, the request must carry an `Authorization`
/// header with exactly that value. Without a configured key the check is
/// skipped.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(api_key) = &state.config.api_key {
        let provided = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok());

        if provided != Some(api_key.as_str()) {
            return Err(AppError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

/// Identity of the caller, as asserted by the identity provider
///
/// Trusted without further validation. A missing or blank header is rejected
/// with `401`.
#[derive(Debug, Clone)]
pub struct Owner(pub String);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|owner| !owner.is_empty())
            .map(|owner| Owner(owner.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}

/// Best-known client address, empty if nothing is available
///
/// The first `X-Forwarded-For` hop wins over the socket peer address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// Rate limit bucket for this client
    ///
    /// Requests with no known address share the `"unknown"` bucket.
    pub fn limit_key(&self) -> &str {
        if self.0.is_empty() {
            "unknown"
        } else {
            &self.0
        }
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(client_ip(parts)))
    }
}

fn client_ip(parts: &Parts) -> String {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

/// Keyed fixed-quota limiter with its own counter store
pub struct RateLimit {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl RateLimit {
    /// Allows `requests` per minute per key; zero is treated as one
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    pub fn check(&self, key: &str) -> Result<(), AppError> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        self.limiter
            .check_key(&key.to_string())
            .map_err(|_| AppError::RateLimited)
    }
}

/// Rejects API requests once the caller's per-minute quota is spent
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    client_ip: ClientIp,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.api_limit.check(client_ip.limit_key())?;

    Ok(next.run(request).await)
}

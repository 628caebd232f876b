use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Fixed-window counter per client IP. The window resets strictly on elapsed
/// wall-clock time; there is no sliding behavior.
pub struct FixedWindowLimiter {
    max: u32,
    window: Duration,
    message: &'static str,
    hits: Mutex<HashMap<IpAddr, (u32, Instant)>>,
}

impl FixedWindowLimiter {
    pub fn new(max: u32, window: Duration, message: &'static str) -> Self {
        Self {
            max,
            window,
            message,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, ip: IpAddr) -> Result<(), ApiError> {
        let mut hits = self.hits.lock().await;
        let now = Instant::now();
        let entry = hits.entry(ip).or_insert((0, now));

        if now.duration_since(entry.1) >= self.window {
            *entry = (0, now);
        }
        if entry.0 >= self.max {
            warn!(%ip, "rate limit exceeded");
            return Err(ApiError::RateLimited(self.message));
        }
        entry.0 += 1;
        Ok(())
    }
}

/// The three independent budgets of the API, shared across requests.
#[derive(Clone)]
pub struct RateLimiters {
    pub general: Arc<FixedWindowLimiter>,
    pub auth: Arc<FixedWindowLimiter>,
    pub upload: Arc<FixedWindowLimiter>,
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self {
            general: Arc::new(FixedWindowLimiter::new(
                100,
                WINDOW,
                "Too many requests from this IP, please try again later.",
            )),
            auth: Arc::new(FixedWindowLimiter::new(
                5,
                WINDOW,
                "Too many authentication attempts, please try again later.",
            )),
            upload: Arc::new(FixedWindowLimiter::new(
                10,
                WINDOW,
                "Too many upload requests, please try again later.",
            )),
        }
    }
}

pub async fn general_guard(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.limiters.general.check(addr.ip()).await?;
    Ok(next.run(req).await)
}

pub async fn auth_guard(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.limiters.auth.check(addr.ip()).await?;
    Ok(next.run(req).await)
}

pub async fn upload_guard(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.limiters.upload.check(addr.ip()).await?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[tokio::test]
    async fn sixth_auth_request_is_rejected() {
        let limiter = FixedWindowLimiter::new(5, WINDOW, "too many");
        for _ in 0..5 {
            limiter.check(ip(1)).await.unwrap();
        }
        assert!(matches!(
            limiter.check(ip(1)).await,
            Err(ApiError::RateLimited(_))
        ));
    }

    #[tokio::test]
    async fn budgets_are_tracked_per_ip() {
        let limiter = FixedWindowLimiter::new(1, WINDOW, "too many");
        limiter.check(ip(1)).await.unwrap();
        assert!(limiter.check(ip(1)).await.is_err());
        // a different client is unaffected
        limiter.check(ip(2)).await.unwrap();
    }

    #[tokio::test]
    async fn window_resets_on_elapsed_time() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(20), "too many");
        limiter.check(ip(1)).await.unwrap();
        assert!(limiter.check(ip(1)).await.is_err());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.check(ip(1)).await.is_ok());
    }
}

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;

/// Fixed-window request counter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterInner>>,
    max_requests: u32,
    window: Duration,
}

struct Window {
    started: Instant,
    count: u32,
}

struct RateLimiterInner {
    windows: HashMap<String, Window>,
    last_cleanup: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimiterInner {
                windows: HashMap::new(),
                last_cleanup: Instant::now(),
            })),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Count one request for `key`; `false` once the window's budget is spent.
    pub async fn check(&self, key: &str) -> bool {
        let mut inner = self.state.lock().await;
        let now = Instant::now();

        if now.duration_since(inner.last_cleanup) > self.window {
            inner
                .windows
                .retain(|_, w| now.duration_since(w.started) < self.window);
            inner.last_cleanup = now;
        }

        let window = inner.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

fn client_key(req: &Request<Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            req.headers()
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "global".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);
    if !limiter.check(&key).await {
        tracing::warn!(client = %key, path = %req.uri().path(), "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(serde_json::json!({
                "error": "rate_limited",
                "message": "Too many requests. Please try again later."
            })),
        )
            .into_response();
    }

    next.run(req).await
}

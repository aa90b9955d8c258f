use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};
use tokio::task::JoinHandle;

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Middleware state: the limiter plus how the client IP is resolved.
#[derive(Clone)]
pub struct IpRateLimit {
    pub limiter: IpRateLimiter,
    /// Key on the first `x-forwarded-for` hop. Only safe behind a proxy that
    /// overwrites the header; otherwise the socket peer is used.
    pub trust_forwarded_for: bool,
}

impl IpRateLimit {
    pub fn new(attempts: u32, window_seconds: u64, trust_forwarded_for: bool) -> Self {
        Self {
            limiter: create_ip_rate_limiter(attempts, window_seconds),
            trust_forwarded_for,
        }
    }
}

/// Allow `attempts` requests per `window_seconds` for each IP, with the whole
/// allowance available as a burst.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = NonZeroU32::new(attempts.max(1)).unwrap_or(NonZeroU32::MIN);
    let period = Duration::from_millis((window_seconds.max(1) * 1000) / attempts.get() as u64);
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(attempts))
        .allow_burst(attempts);

    Arc::new(RateLimiter::dashmap(quota))
}

/// Periodically drop keys whose allowance has fully refilled so the keyed
/// state does not grow with every address ever seen.
pub fn spawn_pruning(limiters: Vec<IpRateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            for limiter in &limiters {
                limiter.retain_recent();
                limiter.shrink_to_fit();
            }
            tracing::debug!(limiters = limiters.len(), "Pruned rate limiter state");
        }
    })
}

fn client_ip(request: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    let peer_ip = || {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    };

    if !trust_forwarded_for {
        return peer_ip();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
        .or_else(peer_ip)
}

/// Middleware for IP-based rate limiting
pub async fn ip_rate_limit_middleware(
    State(rate_limit): State<IpRateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match client_ip(&request, rate_limit.trust_forwarded_for) {
        Some(ip) => match rate_limit.limiter.check_key(&ip) {
            Ok(_) => Ok(next.run(request).await),
            Err(negative) => {
                let wait_time = negative.wait_time_from(DefaultClock::default().now());
                tracing::warn!(ip = %ip, "Rate limit exceeded");
                Err(AppError::TooManyRequests(
                    "too many requests from this IP, try again later".to_string(),
                    Some(wait_time.as_secs().max(1)),
                ))
            }
        },
        None => {
            tracing::warn!("Could not determine IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
    };
    use tower::ServiceExt;

    fn app(rate_limit: IpRateLimit) -> Router {
        Router::new()
            .route("/limited", get(|| async { "ok" }))
            .layer(from_fn_with_state(rate_limit, ip_rate_limit_middleware))
    }

    fn request_from(peer: &str, forwarded_for: &str) -> HttpRequest<Body> {
        let mut request = HttpRequest::builder()
            .uri("/limited")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = format!("{}:40000", peer).parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[tokio::test]
    async fn rejects_after_burst_is_spent() {
        let app = app(IpRateLimit::new(2, 60, true));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request_from("192.0.2.1", "10.0.0.1"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(request_from("192.0.2.1", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // Other callers keep their own allowance.
        let response = app
            .oneshot(request_from("192.0.2.1", "10.0.0.2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn rotating_forwarded_for_does_not_reset_allowance() {
        let app = app(IpRateLimit::new(2, 60, false));

        let mut accepted = 0;
        for i in 0..6 {
            let response = app
                .clone()
                .oneshot(request_from("192.0.2.1", &format!("10.0.0.{}", i)))
                .await
                .unwrap();
            if response.status() == StatusCode::OK {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 2);

        let response = app
            .oneshot(request_from("192.0.2.2", "10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn pruning_keeps_exhausted_keys() {
        let rate_limit = IpRateLimit::new(1, 60, false);
        let app = app(rate_limit.clone());
        let handle = spawn_pruning(vec![rate_limit.limiter.clone()], Duration::from_millis(5));

        let response = app
            .clone()
            .oneshot(request_from("192.0.2.1", "-"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let response = app
            .oneshot(request_from("192.0.2.1", "-"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        handle.abort();
    }
}

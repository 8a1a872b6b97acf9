// Rate limiting for login attempts
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::{
    error::{ErrorMessage, HttpError},
    AppState,
};

// In-memory sliding window; counts are per process
#[derive(Clone, Debug)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn is_allowed(&self, key: &str) -> bool {
        let mut requests = match self.requests.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();

        // Drop timestamps outside the window and forget clients with none left
        requests.retain(|_, timestamps| {
            timestamps.retain(|&timestamp| now.duration_since(timestamp) < self.window);
            !timestamps.is_empty()
        });

        let entry = requests.entry(key.to_string()).or_default();
        if entry.len() < self.max_requests {
            entry.push(now);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        match self.requests.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

fn forwarded_client(request: &Request) -> Option<String> {
    request
        .headers()
        .get("x-forwarded-for")
        .or_else(|| request.headers().get("x-real-ip"))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

/// The socket peer address; forwarded headers count only behind a trusted proxy.
fn get_client_id(request: &Request, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(forwarded) = forwarded_client(request) {
            return forwarded;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn login_rate_limit(
    Extension(app_state): Extension<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let client_id = get_client_id(&request, app_state.env.trust_proxy_headers);

    if !app_state.login_limiter.is_allowed(&format!("login:{}", client_id)) {
        tracing::warn!("login rate limit hit for {}", client_id);
        return Err(HttpError::too_many_requests(ErrorMessage::TooManyAttempts.to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn limits_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.is_allowed("a"));
        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        // other clients are unaffected
        assert!(limiter.is_allowed("b"));
    }

    #[test]
    fn window_expires() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.is_allowed("a"));
        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.is_allowed("a"));
    }

    #[test]
    fn idle_clients_are_forgotten() {
        let limiter = RateLimiter::new(5, Duration::from_millis(10));
        for n in 1..=6 {
            assert!(limiter.is_allowed(&format!("login:1.1.1.{}", n)));
        }
        assert_eq!(limiter.tracked_clients(), 6);

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.is_allowed("login:2.2.2.2"));
        assert_eq!(limiter.tracked_clients(), 1);
    }

    fn request_from(peer: &str, forwarded: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(forwarded) = forwarded {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        request
    }

    #[test]
    fn forwarded_headers_are_ignored_without_a_trusted_proxy() {
        for n in 1..=6 {
            let request = request_from("198.51.100.4:50000", Some(&format!("1.1.1.{}", n)));
            assert_eq!(get_client_id(&request, false), "198.51.100.4");
        }

        let anonymous = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(get_client_id(&anonymous, false), "unknown");
    }

    #[test]
    fn trusted_proxy_uses_first_forwarded_address() {
        let request = request_from("10.0.0.1:443", Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(get_client_id(&request, true), "203.0.113.7");

        let direct = request_from("10.0.0.1:443", None);
        assert_eq!(get_client_id(&direct, true), "10.0.0.1");
    }
}

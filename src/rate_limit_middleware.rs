// rate_limit_middleware.rs
use axum::{
    extract::{ConnectInfo, Extension, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use tracing::{debug, warn};

use crate::common::error::ErrorResponse;
use crate::rate_limit::{RateLimitResult, RateLimiter};

/// Extract the client address: forwarding headers first, then the socket.
fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // First address in the chain is the original client
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return Some(first_ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    connect_info.map(|info| info.0.ip().to_string())
}

/// Rate limiting middleware, applied to the whole router.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let key = extract_client_ip(request.headers(), connect_info.as_ref())
        .unwrap_or_else(|| "unknown".to_string());
    let path = request.uri().path().to_string();

    match limiter.check(&key).await {
        RateLimitResult::Allowed => {
            debug!(client = %key, path = %path, "Request allowed by rate limiter");
            Ok(next.run(request).await)
        }
        RateLimitResult::Limited { retry_after } => {
            warn!(
                client = %key,
                path = %path,
                retry_after = retry_after,
                "Request blocked by rate limiter"
            );

            let body = ErrorResponse {
                error: "rate limit exceeded, try again later".to_string(),
            };
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

            if let Ok(retry_header) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("retry-after", retry_header);
            }

            Err(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x_forwarded_for_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );
        headers.insert("x-real-ip", "198.51.100.9".parse().unwrap());

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_x_real_ip_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_socket_address_fallback() {
        let headers = HeaderMap::new();
        let addr: SocketAddr = "192.0.2.7:4242".parse().unwrap();
        let connect_info = ConnectInfo(addr);

        let ip = extract_client_ip(&headers, Some(&connect_info));
        assert_eq!(ip, Some("192.0.2.7".to_string()));
    }

    #[test]
    fn test_no_address_available() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, None), None);
    }
}

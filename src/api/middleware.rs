//! Request pipeline stages
//!
//! Per-route rate limiting and cache gates, plus the router-wide response
//! timing and error redaction stages.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Path, Request, State},
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER},
        HeaderName, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::cache::{CacheGate, CacheLookup};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::limiter::{RateLimitDecision, RateLimitRule, RateLimiter};

// == Header Names ==
pub const X_CACHE_STATUS: HeaderName = HeaderName::from_static("x-cache-status");
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
pub const X_RESPONSE_TIME: HeaderName = HeaderName::from_static("x-response-time");

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Largest error body the redaction stage will buffer.
const MAX_ERROR_BODY: usize = 64 * 1024;

// == Client Identity ==
/// Identifies the caller for rate limiting.
///
/// Prefers the first entry of `X-Forwarded-For`, then the socket peer
/// address, then `"unknown"`. The forwarded header is set by the client or
/// any proxy in between and can be forged; limits keyed on it are only as
/// trustworthy as the proxy that sets it.
pub fn client_identity(req: &Request) -> String {
    req.headers()
        .get(X_FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
        .map(str::to_owned)
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

// == Rate Limiting ==
/// State for one route's rate limiting stage.
#[derive(Clone)]
pub struct RouteLimit {
    limiter: RateLimiter,
    rule: RateLimitRule,
}

impl RouteLimit {
    pub fn new(limiter: RateLimiter, rule: RateLimitRule) -> Self {
        Self { limiter, rule }
    }
}

/// Counts the request and either denies it or passes it on.
///
/// Limit metadata headers go on the response either way. A store failure
/// fails the request rather than allowing or blocking it.
pub async fn rate_limit(State(route): State<RouteLimit>, req: Request, next: Next) -> Response {
    let identity = client_identity(&req);

    let decision = match route.limiter.check(&identity, &route.rule).await {
        Ok(decision) => decision,
        Err(err) => return AppError::from(err).into_response(),
    };

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        let mut denied = AppError::RateLimitExceeded {
            limit: decision.limit,
            current: decision.current,
            reset_secs: decision.reset_secs,
        }
        .into_response();
        denied
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(decision.reset_secs));
        denied
    };

    insert_limit_headers(&mut response, &decision);
    response
}

fn insert_limit_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(decision.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(decision.reset_secs));
}

// == Cache Gates ==
/// State for a gate over a fixed cache key.
#[derive(Clone)]
pub struct NamedCache {
    gate: CacheGate,
    key: &'static str,
}

impl NamedCache {
    pub fn new(gate: CacheGate, key: &'static str) -> Self {
        Self { gate, key }
    }
}

/// Serves `{"<key>": <snapshot>}` on a hit, otherwise runs the handler.
pub async fn named_cache_gate(
    State(route): State<NamedCache>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let lookup = route.gate.check_named(route.key).await?;
    let status = lookup.status();

    let mut response = match lookup {
        CacheLookup::Hit(snapshot) => {
            let field = Value::from(route.key).to_string();
            raw_json(format!("{{{}:{}}}", field, snapshot))
        }
        CacheLookup::Miss => next.run(req).await,
    };

    response
        .headers_mut()
        .insert(X_CACHE_STATUS, HeaderValue::from_static(status.as_str()));
    Ok(response)
}

/// Wraps already-serialized JSON in a response without re-encoding it.
fn raw_json(body: String) -> Response {
    (
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

/// Derives a cache key from the matched path parameters.
pub type KeyDeriver = fn(&HashMap<String, String>) -> Option<String>;

/// State for a gate whose key comes from the request path.
#[derive(Clone)]
pub struct ParametricCache {
    gate: CacheGate,
    derive: KeyDeriver,
}

impl ParametricCache {
    pub fn new(gate: CacheGate, derive: KeyDeriver) -> Self {
        Self { gate, derive }
    }
}

/// Serves the stored snapshot itself on a hit, otherwise runs the handler.
pub async fn parametric_cache_gate(
    State(route): State<ParametricCache>,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let (_, lookup) = route.gate.check_parametric(route.derive, &params).await?;
    let status = lookup.status();

    let mut response = match lookup {
        CacheLookup::Hit(snapshot) => raw_json(snapshot),
        CacheLookup::Miss => next.run(req).await,
    };

    response
        .headers_mut()
        .insert(X_CACHE_STATUS, HeaderValue::from_static(status.as_str()));
    Ok(response)
}

// == Response Timing ==
/// Adds `X-Response-Time` and logs one timing line per request.
pub async fn response_time(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let mut response = next.run(req).await;

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if let Ok(value) = HeaderValue::from_str(&format!("{:.2}ms", elapsed_ms)) {
        response.headers_mut().insert(X_RESPONSE_TIME, value);
    }
    info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        "Request timing: {:.2}ms",
        elapsed_ms
    );

    response
}

// == Error Redaction ==
/// Replaces the message of 5xx bodies with a generic one outside
/// development, keeping the machine-readable error kind.
pub async fn redact_server_errors(
    State(config): State<Arc<Config>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    if config.development || !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let kind = match to_bytes(body, MAX_ERROR_BODY).await {
        Ok(bytes) => serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned)),
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            None
        }
    };

    let body = json!({
        "error": kind.unwrap_or_else(|| "internal_error".to_string()),
        "message": "Internal server error",
    });

    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(forwarded: Option<&str>, peer: Option<SocketAddr>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/products");
        if let Some(value) = forwarded {
            builder = builder.header(X_FORWARDED_FOR, value);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        if let Some(addr) = peer {
            req.extensions_mut().insert(ConnectInfo(addr));
        }
        req
    }

    #[test]
    fn test_identity_prefers_forwarded_header() {
        let req = request_with(
            Some("203.0.113.7, 10.0.0.1"),
            Some("127.0.0.1:5000".parse().unwrap()),
        );
        assert_eq!(client_identity(&req), "203.0.113.7");
    }

    #[test]
    fn test_identity_falls_back_to_peer_address() {
        let req = request_with(None, Some("192.168.1.20:41000".parse().unwrap()));
        assert_eq!(client_identity(&req), "192.168.1.20");
    }

    #[test]
    fn test_identity_skips_empty_forwarded_entries() {
        let req = request_with(Some(" , 198.51.100.4"), None);
        assert_eq!(client_identity(&req), "198.51.100.4");
    }

    #[tokio::test]
    async fn test_raw_json_is_served_verbatim() {
        let body = r#"{"products":[{"name":"b","id":1}]}"#;
        let response = raw_json(body.to_string());

        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let bytes = to_bytes(response.into_body(), MAX_ERROR_BODY).await.unwrap();
        assert_eq!(&bytes[..], body.as_bytes());
    }

    #[test]
    fn test_identity_unknown_without_any_source() {
        let req = request_with(None, None);
        assert_eq!(client_identity(&req), "unknown");
    }
}

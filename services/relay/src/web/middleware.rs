//! services/relay/src/web/middleware.rs
//!
//! Request diagnostics for every route.

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags each request with an id and logs the exchange once the response is ready.
///
/// Cookie values are never logged, only whether the browser sent any.
pub async fn trace_exchange(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let has_cookie = req.headers().contains_key(header::COOKIE);
    let started = Instant::now();

    let span = info_span!("request", %request_id, %method, %path);
    let mut response = next.run(req).instrument(span.clone()).await;

    let set_cookies = response.headers().get_all(header::SET_COOKIE).iter().count();
    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            has_cookie,
            set_cookies,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        )
    });

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

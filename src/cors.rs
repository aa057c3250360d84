//! CORS headers for every response the relay produces.
//!
//! Preflight responses echo the caller's `Origin`, while every other response carries a literal
//! wildcard origin.
use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap, HeaderValue, Method, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_TYPE, ORIGIN,
        },
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE: &str = "86400";
const WILDCARD: &str = "*";
const APPLICATION_JSON: &str = "application/json";

/// Builds the response to a CORS preflight (`OPTIONS`) request.
pub fn preflight_response(request_headers: &HeaderMap) -> Response {
    let origin = request_headers
        .get(ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(WILDCARD));

    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, origin),
            (
                ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ),
            (
                ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ),
            (ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE)),
        ],
        Body::empty(),
    )
        .into_response()
}

/// Sets the standard JSON and CORS headers, replacing any previous values.
pub fn apply_standard_headers(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(WILDCARD));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Middleware answering every `OPTIONS` request as a preflight, whatever the path.
pub async fn handle_preflight(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        debug!("Answering CORS preflight for {}", req.uri().path());
        return preflight_response(req.headers());
    }
    next.run(req).await
}

/// Response mapper attaching the standard headers to routed responses.
pub async fn standard_headers(mut response: Response) -> Response {
    apply_standard_headers(response.headers_mut());
    response
}

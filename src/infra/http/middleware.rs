use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use metrics::histogram;
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

const METRIC_HTTP_REQUEST_MS: &str = "itemdir_http_request_ms";

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Adopts the caller's `x-request-id` when it is usable, otherwise mints one,
/// and echoes it on the response.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let span = info_span!(
        target: "itemdir::http",
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Records latency for every request and logs failures with the attached
/// [`ErrorReport`]: 5xx at `error`, 4xx at `warn`.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    let elapsed = start.elapsed();

    histogram!(
        METRIC_HTTP_REQUEST_MS,
        "method" => method.to_string(),
        "status" => status_class(status.as_u16()),
    )
    .record(elapsed.as_secs_f64() * 1000.0);

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        warn!(
            target = "itemdir::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            "request failed without a diagnostic report"
        );
        return response;
    };

    let detail = report.messages.first().map(String::as_str).unwrap_or("");
    if status.is_server_error() {
        error!(
            target = "itemdir::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms = elapsed.as_millis() as u64,
            source = report.source,
            detail = %detail,
            chain = ?report.messages,
            "request failed"
        );
    } else {
        warn!(
            target = "itemdir::http::response",
            status = status.as_u16(),
            method = %method,
            path = %path,
            source = report.source,
            detail = %detail,
            "request rejected"
        );
    }

    response
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        _ => "5xx",
    }
}

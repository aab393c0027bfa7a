use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ApiError;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Logs one line per request. Handlers that fail attach their `ApiError` to
/// the response (see `ApiError::into_response`), which decides the level.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let start = Instant::now();

    let span = info_span!(
        "http.request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let mut response = next.run(req).instrument(span).await;

    let status = response.status();
    let elapsed = start.elapsed();

    match response.extensions().get::<ApiError>() {
        Some(ApiError::ServerError(detail)) => error!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            detail = %detail,
            "Failed to process request"
        ),
        Some(err) => warn!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %err,
            "Rejected request"
        ),
        None => info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

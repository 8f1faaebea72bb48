//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Bodies longer than this many characters are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level with the
/// `Authorization` header redacted.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let Some(body_bytes) = read_body(body).await else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    log_body(
        &format!(
            "Received request: {} {}\nheaders: {:#?}",
            parts.method,
            parts.uri,
            redact_headers(&parts.headers)
        ),
        &body_bytes,
    );

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let Some(body_bytes) = read_body(body).await else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    log_body(
        &format!(
            "Sending response: {}\nheaders: {:#?}",
            parts.status, parts.headers
        ),
        &body_bytes,
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

async fn read_body(body: Body) -> Option<Bytes> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .inspect_err(|error| tracing::error!("Could not read body: {error}"))
        .ok()
}

/// Copy `headers` with the bearer token hidden.
fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static("********"));
    }

    headers
}

fn log_body(message: &str, body: &[u8]) {
    let body = String::from_utf8_lossy(body);

    match truncate(&body, LOG_BODY_LENGTH_LIMIT) {
        Some(truncated) => {
            tracing::info!("{message}\nbody: {truncated}...");
            tracing::debug!("Full body: {body:?}");
        }
        None => tracing::info!("{message}\nbody: {body:?}"),
    }
}

/// The first `limit` characters of `text`, or `None` if `text` is not longer than `limit`.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    text.char_indices()
        .nth(limit)
        .map(|(byte_index, _)| &text[..byte_index])
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

    use super::{redact_headers, truncate};

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
        headers.insert("x-request-id", HeaderValue::from_static("42"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted[AUTHORIZATION], "********");
        assert_eq!(redacted["x-request-id"], "42");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), Some("hé"));
        assert_eq!(truncate("hello", 5), None);
        assert_eq!(truncate("", 0), None);
    }
}

//! Preview handler
//!
//! Mounted as the router fallback: every path that is not an API route is
//! treated as `/{width}/{height}/{origin}`.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tracing::warn;
use url::Url;

use crate::services::{Preview, PreviewRequest};
use crate::web::AppState;

/// Response header carrying the resolved origin URL of a freshly fetched preview
pub const ORIGIN_HEADER: HeaderName = HeaderName::from_static("origin");

/// Headers not copied when mirroring an origin error response
const NON_MIRRORED_HEADERS: [HeaderName; 4] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    header::CONTENT_ENCODING,
];

pub async fn preview(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let request = PreviewRequest {
        path_and_query,
        method,
        headers,
        body,
    };

    match state.preview.preview(request).await {
        Ok(Preview::Cached { jpeg }) => jpeg_response(jpeg, None),
        Ok(Preview::Fetched { jpeg, origin_url }) => jpeg_response(jpeg, Some(&origin_url)),
        Ok(Preview::OriginFailure {
            status,
            headers,
            body,
        }) => mirror_response(status, headers, body),
        Err(e) => e.into_response(),
    }
}

fn jpeg_response(jpeg: Bytes, origin_url: Option<&Url>) -> Response {
    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"))],
        jpeg,
    )
        .into_response();

    if let Some(origin_url) = origin_url {
        match HeaderValue::from_str(origin_url.as_str()) {
            Ok(value) => {
                response.headers_mut().insert(ORIGIN_HEADER, value);
            }
            Err(e) => warn!("Origin URL is not a valid header value: {}", e),
        }
    }

    response
}

fn mirror_response(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Response {
    for name in NON_MIRRORED_HEADERS {
        headers.remove(&name);
    }

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_response_headers() {
        let url = Url::parse("http://example.com/a.jpg").unwrap();

        let fetched = jpeg_response(Bytes::from_static(b"jpeg"), Some(&url));
        assert_eq!(fetched.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(fetched.headers()[ORIGIN_HEADER], "http://example.com/a.jpg");

        let cached = jpeg_response(Bytes::from_static(b"jpeg"), None);
        assert!(cached.headers().get(ORIGIN_HEADER).is_none());
    }

    #[test]
    fn test_mirror_response_drops_framing_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("999"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        headers.insert("x-origin", HeaderValue::from_static("yes"));

        let response =
            mirror_response(StatusCode::FORBIDDEN, headers, Bytes::from_static(b"denied"));

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()["x-origin"], "yes");
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    }
}

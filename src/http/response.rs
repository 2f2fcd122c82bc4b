//! Responses produced by request handlers.
//!
//! # Responsibilities
//! - Simple owned response type handlers return from `on_request`
//! - Plain-text error replies (`Content-Type: text/plain`, `Connection: close`)
//! - Conversion into a hyper response for the wire

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};

/// An HTTP response returned by a handler.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    /// Empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// `200 OK` with a plain-text body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::text(StatusCode::OK, body)
    }

    /// Plain-text response with the given status.
    pub fn text(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::new(status)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body(body)
    }

    /// Add or replace a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl From<HttpResponse> for Response<Body> {
    fn from(value: HttpResponse) -> Self {
        let mut response = Response::new(Body::from(value.body));
        *response.status_mut() = value.status;
        *response.headers_mut() = value.headers;
        response
    }
}

/// Build a plain-text error reply that closes the connection.
///
/// This is the minimal shape older embedded HTTP libraries used for their
/// `send_error` helper: `Content-Type: text/plain`, `Connection: close`, and
/// the reason text as the body.
pub fn error_reply(status: StatusCode, reason: &str) -> HttpResponse {
    HttpResponse::new(status)
        .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_header(header::CONNECTION, HeaderValue::from_static("close"))
        .with_body(reason.to_owned())
}

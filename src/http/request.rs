//! Borrowed view of an inbound HTTP request.
//!
//! # Design Decisions
//! - Every field borrows from the transport's buffers, so a handler cannot
//!   keep the request after its callback returns
//! - The body is fully buffered before the view is built

use axum::http::{HeaderMap, Method, Version};

/// An inbound request as seen by `RequestHandler::on_request`.
#[derive(Debug, Clone, Copy)]
pub struct HttpRequest<'a> {
    method: &'a Method,
    target: &'a str,
    version: Version,
    headers: &'a HeaderMap,
    body: &'a [u8],
}

impl<'a> HttpRequest<'a> {
    /// Build a request view over borrowed parts.
    pub fn new(
        method: &'a Method,
        target: &'a str,
        version: Version,
        headers: &'a HeaderMap,
        body: &'a [u8],
    ) -> Self {
        Self {
            method,
            target,
            version,
            headers,
            body,
        }
    }

    /// Request method.
    pub fn method(&self) -> &'a Method {
        self.method
    }

    /// Request target as sent on the request line (path plus query).
    pub fn target(&self) -> &'a str {
        self.target
    }

    /// Path component of the target.
    pub fn path(&self) -> &'a str {
        self.target
            .split_once('?')
            .map_or(self.target, |(path, _)| path)
    }

    /// Query component of the target, without the `?`.
    pub fn query(&self) -> Option<&'a str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }
}

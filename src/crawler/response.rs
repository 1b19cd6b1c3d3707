//! Buffered HTTP response handed to response and element hooks

use crate::crawler::Request;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::borrow::Cow;
use std::io::Cursor;

/// A fetched response with its body fully in memory
///
/// The body is buffered once, before any hook runs, so every hook (and every
/// element callback) can read it from the start. Non-2xx statuses are
/// delivered like any other response.
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    request: Request,
}

impl Response {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes, request: Request) -> Self {
        Self {
            status,
            headers,
            body,
            request,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request that produced this response
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Shared handle to the body bytes
    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    /// A fresh reader positioned at the start of the body
    pub fn body_reader(&self) -> Cursor<Bytes> {
        Cursor::new(self.body.clone())
    }

    /// The body decoded as UTF-8, with invalid sequences replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Value of the `Content-Type` header, when present and readable
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("url", &self.request.url().as_str())
            .field("body_len", &self.body.len())
            .finish()
    }
}

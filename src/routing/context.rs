//! Per-request state.
//!
//! # Responsibilities
//! - Carry the normalized path, method, and decoded query pairs through the
//!   route scan
//! - Accumulate the response (status, headers, body) so handlers can run on
//!   any thread and the serving task writes it out once at the end
//!
//! # Design Decisions
//! - Fully owned data: a context can be moved across the main-thread
//!   rendezvous and back
//! - `/` is aliased to `/index.html` at construction

use axum::body::Body;
use axum::http::{header, Method, Response, StatusCode};
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

/// Mutable per-request record handed to route handlers.
pub struct RequestContext {
    pub method: Method,
    /// Percent-decoded path, `/` aliased to `/index.html`.
    pub path: String,
    /// Decoded query pairs in order of appearance.
    pub query: Vec<(String, String)>,
    /// Groups captured by the matched pattern.
    pub captures: Vec<String>,
    /// Scan cursor into the route table.
    pub cursor: usize,
    pub response: ResponseSink,
}

impl RequestContext {
    pub fn new(method: Method, raw_path: &str, raw_query: Option<&str>) -> Self {
        let mut path = percent_decode_str(raw_path)
            .decode_utf8_lossy()
            .into_owned();
        if path == "/" {
            path = "/index.html".to_string();
        }
        let query = raw_query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            method,
            path,
            query,
            captures: Vec::new(),
            cursor: 0,
            response: ResponseSink::new(),
        }
    }

    /// First query parameter with the given name, already URL-decoded.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Response accumulator, written out exactly once per request.
pub struct ResponseSink {
    status: StatusCode,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// 200 with a plain-text body.
    pub fn write_text(&mut self, text: impl Into<String>) {
        self.status = StatusCode::OK;
        self.content_type = Some("text/plain".to_string());
        self.body = text.into().into_bytes();
    }

    /// 200 with raw bytes and an explicit content type.
    pub fn write_bytes(&mut self, bytes: Vec<u8>, content_type: &str) {
        self.status = StatusCode::OK;
        self.content_type = Some(content_type.to_string());
        self.body = bytes;
    }

    /// Finalize as a failure status with a plain-text description.
    pub fn fail(&mut self, status: StatusCode, description: impl Into<String>) {
        self.status = status;
        self.content_type = Some("text/plain".to_string());
        self.body = description.into().into_bytes();
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convert into the wire response.
    pub fn into_response(self) -> Response<Body> {
        let mut builder = Response::builder().status(self.status);
        if let Some(content_type) = &self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Body::from(self.body)).unwrap_or_else(|_| {
            let mut fallback = Response::new(Body::empty());
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

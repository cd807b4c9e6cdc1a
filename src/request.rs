//! The HTTP request collaborator contract (`spec.md` §3, §6).
//!
//! `Request` is the seam between this crate and whatever HTTP message type
//! a caller already has. The core only ever reads method/target/headers/
//! body and appends new headers — it never reorders or rewrites what's
//! already there.

use crate::stream::Stream;

/// A mutable HTTP request the signer can read from and append headers to.
pub trait Request {
    /// Upper-case HTTP method token (`GET`, `PUT`, ...). Copied verbatim —
    /// the core does not normalize it.
    fn method(&self) -> &str;

    /// The request target: path, optionally followed by `?query`.
    fn target(&self) -> &str;

    /// All headers in insertion order, allowing repeated names.
    fn headers_in_order(&self) -> &[(String, String)];

    /// Append a header. Must not deduplicate against existing headers of
    /// the same name — callers are expected not to pre-populate the names
    /// this crate is about to write (`Authorization`, `X-Amz-Date`,
    /// `X-Amz-Security-Token`).
    fn add_header(&mut self, name: &str, value: &str);

    /// Take the body stream out of the request, if any, leaving `None`
    /// behind. Used by the payload hasher to install a tee in its place.
    fn take_body(&mut self) -> Option<Box<dyn Stream>>;

    /// Install a (possibly new) body stream.
    fn set_body(&mut self, body: Box<dyn Stream>);
}

/// A minimal, owned [`Request`] implementation for tests and for callers
/// who don't already have an HTTP request type of their own.
pub struct OwnedRequest {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: Option<Box<dyn Stream>>,
}

impl OwnedRequest {
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Box<dyn Stream>) -> Self {
        self.body = Some(body);
        self
    }
}

impl Request for OwnedRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn headers_in_order(&self) -> &[(String, String)] {
        &self.headers
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn take_body(&mut self) -> Option<Box<dyn Stream>> {
        self.body.take()
    }

    fn set_body(&mut self, body: Box<dyn Stream>) {
        self.body = Some(body);
    }
}

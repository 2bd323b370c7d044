//! The response-emission collaborator.
//!
//! The dispatcher never writes to a transport. It talks to a host-supplied
//! [`Responder`], and only for its two special-cased emissions: 404 when no
//! route matches and 429 when the rate gate refuses. Everything else —
//! bodies, success statuses, redirects — is the action's own business
//! through whatever collaborators it captured.
//!
//! [`Buffered`] is the in-memory implementation: tests read it back, simple
//! hosts flush it after dispatch returns.

use http::StatusCode;

/// Host-controlled response emission.
pub trait Responder {
    fn set_status(&mut self, status: StatusCode);
    fn header(&mut self, name: &str, value: &str);
    fn write(&mut self, bytes: &[u8]);
    /// Drops any buffered body. The dispatcher calls this after a HEAD
    /// dispatch — headers stand, the body must not be transmitted.
    fn truncate_body(&mut self);
}

/// A [`Responder`] that buffers everything in memory.
pub struct Buffered {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Buffered {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl Default for Buffered {
    fn default() -> Self {
        Self::new()
    }
}

impl Responder for Buffered {
    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    fn truncate_body(&mut self) {
        self.body.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_status_headers_and_body() {
        let mut out = Buffered::new();
        out.set_status(StatusCode::CREATED);
        out.header("location", "/users/99");
        out.write(b"created");
        assert_eq!(out.status(), StatusCode::CREATED);
        assert_eq!(out.header_value("Location"), Some("/users/99"));
        assert_eq!(out.body(), b"created");
    }

    #[test]
    fn truncate_keeps_headers() {
        let mut out = Buffered::new();
        out.header("content-type", "text/plain");
        out.write(b"body");
        out.truncate_body();
        assert!(out.body().is_empty());
        assert_eq!(out.header_value("content-type"), Some("text/plain"));
    }
}

//! HTTP exchange types shared by the dispatcher and its transports.
//!
//! # Design
//! Requests and responses are plain data. The dispatcher builds `HttpRequest`
//! values and interprets `HttpResponse` values; a `Transport` performs the
//! actual round-trip. Keeping the exchange as data makes the two-hop protocol
//! testable against a scripted transport with no sockets involved.
//!
//! Bodies are `Vec<u8>` because data-plane operations carry arbitrary file
//! content, not JSON.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute: scheme, authority, path and the encoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// First value of the named header. Header names compare case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Canonical reason phrase for the status, or `"Unknown"`.
    pub fn reason(&self) -> &'static str {
        ::http::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: vec![("Location".to_string(), "http://dn:50075/x".to_string())],
            body: Vec::new(),
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(307);
        assert_eq!(resp.header("location"), Some("http://dn:50075/x"));
        assert_eq!(resp.header("LOCATION"), Some("http://dn:50075/x"));
        assert_eq!(resp.header("content-type"), None);
    }

    #[test]
    fn status_classes() {
        assert!(response(200).is_success());
        assert!(response(201).is_success());
        assert!(response(307).is_redirect());
        assert!(!response(404).is_success());
        assert!(!response(404).is_redirect());
    }

    #[test]
    fn reason_phrases() {
        assert_eq!(response(404).reason(), "Not Found");
        assert_eq!(response(307).reason(), "Temporary Redirect");
        assert_eq!(response(599).reason(), "Unknown");
    }
}

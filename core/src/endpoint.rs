//! Base address of the coordinator node.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Path prefix every gateway resource lives under.
pub const API_PREFIX: &str = "/webhdfs/v1";

/// Characters escaped inside a filesystem path. `/` stays literal.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// `host` as written in a URL authority: IPv6 literals get brackets.
pub fn authority_host(host: &str) -> Cow<'_, str> {
    if host.contains(':') && !host.starts_with('[') {
        Cow::Owned(format!("[{host}]"))
    } else {
        Cow::Borrowed(host)
    }
}

/// Immutable coordinator address. The base URL is computed once in `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    base_path: String,
    base_url: String,
}

impl Endpoint {
    pub fn new(host: &str, port: u16) -> Self {
        let base_url = format!("http://{}:{port}{API_PREFIX}", authority_host(host));
        Self {
            host: host.to_string(),
            port,
            base_path: API_PREFIX.to_string(),
            base_url,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// `http://host:port/webhdfs/v1`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL followed by the encoded filesystem path, without a query.
    pub fn url_for(&self, path: &str) -> String {
        let encoded = utf8_percent_encode(path, PATH_SEGMENT);
        if path.starts_with('/') {
            format!("{}{encoded}", self.base_url)
        } else {
            format!("{}/{encoded}", self.base_url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_round_trips_through_uri_parsing() {
        for (host, port) in [("localhost", 50070), ("gw.example.com", 14000), ("10.0.0.7", 1)] {
            let endpoint = Endpoint::new(host, port);
            let uri: ::http::Uri = endpoint.base_url().parse().unwrap();
            assert_eq!(uri.scheme_str(), Some("http"));
            assert_eq!(uri.host(), Some(host));
            assert_eq!(uri.port_u16(), Some(port));
            assert_eq!(uri.path(), API_PREFIX);
        }
    }

    #[test]
    fn ipv6_host_is_bracketed() {
        for host in ["::1", "[::1]"] {
            let endpoint = Endpoint::new(host, 50070);
            assert_eq!(endpoint.base_url(), "http://[::1]:50070/webhdfs/v1");
            let uri: ::http::Uri = endpoint.base_url().parse().unwrap();
            assert_eq!(uri.host(), Some("[::1]"));
            assert_eq!(uri.port_u16(), Some(50070));
            assert_eq!(uri.path(), API_PREFIX);
        }
        assert_eq!(authority_host("gw.example.com"), "gw.example.com");
    }

    #[test]
    fn url_for_appends_path() {
        let endpoint = Endpoint::new("localhost", 50070);
        assert_eq!(
            endpoint.url_for("/data/a.txt"),
            "http://localhost:50070/webhdfs/v1/data/a.txt"
        );
        assert_eq!(endpoint.url_for("/"), "http://localhost:50070/webhdfs/v1/");
    }

    #[test]
    fn url_for_adds_missing_leading_slash() {
        let endpoint = Endpoint::new("localhost", 50070);
        assert_eq!(endpoint.url_for("data"), "http://localhost:50070/webhdfs/v1/data");
    }

    #[test]
    fn url_for_escapes_reserved_characters() {
        let endpoint = Endpoint::new("localhost", 50070);
        assert_eq!(
            endpoint.url_for("/my dir/a?b#c%"),
            "http://localhost:50070/webhdfs/v1/my%20dir/a%3Fb%23c%25"
        );
    }
}

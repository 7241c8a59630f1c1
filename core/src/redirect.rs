//! Worker-node address resolution for two-hop operations.
//!
//! The coordinator answers data-plane operations with a temporary redirect
//! whose `Location` names a worker node, often by a cluster-internal host
//! name. The caller picks how that address is turned into the second-hop URL.

use std::fmt;
use std::str::FromStr;

use ::http::Uri;
use serde::{Deserialize, Serialize};

use crate::endpoint::authority_host;

/// Strategy for turning a redirect `Location` into the worker-hop URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectPolicy {
    /// Keep the redirect's port, path and query; use the configured
    /// coordinator host. For clusters reached through one external name.
    #[default]
    SubstituteHost,
    /// Follow the redirect exactly as given.
    Verbatim,
}

impl fmt::Display for RedirectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RedirectPolicy::SubstituteHost => "substitute-host",
            RedirectPolicy::Verbatim => "verbatim",
        })
    }
}

impl FromStr for RedirectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "substitute-host" => Ok(RedirectPolicy::SubstituteHost),
            "verbatim" => Ok(RedirectPolicy::Verbatim),
            other => Err(format!(
                "unknown redirect policy {other:?} (expected substitute-host or verbatim)"
            )),
        }
    }
}

/// Components of a `Location` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Path plus `?query`, exactly as it appeared in the header.
    pub path_and_query: String,
}

impl RedirectTarget {
    pub fn parse(location: &str) -> Result<Self, String> {
        let uri: Uri = location
            .parse()
            .map_err(|e| format!("unparsable Location {location:?}: {e}"))?;
        let scheme = uri
            .scheme_str()
            .ok_or_else(|| format!("Location {location:?} is not absolute"))?
            .to_ascii_lowercase();
        let host = uri
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| format!("Location {location:?} has no host"))?
            .to_string();
        let port = match (uri.port_u16(), scheme.as_str()) {
            (Some(port), _) => port,
            (None, "http") => 80,
            (None, "https") => 443,
            (None, other) => return Err(format!("unsupported scheme {other:?} in Location")),
        };
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        Ok(Self {
            scheme,
            host,
            port,
            path_and_query,
        })
    }

    /// The same target reached through `host`.
    pub fn with_host(&self, host: &str) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme,
            authority_host(host),
            self.port,
            self.path_and_query
        )
    }
}

/// Resolve the second-hop URL for `location` under `policy`.
pub fn resolve(location: &str, configured_host: &str, policy: RedirectPolicy) -> Result<String, String> {
    let target = RedirectTarget::parse(location)?;
    Ok(match policy {
        RedirectPolicy::Verbatim => location.to_string(),
        RedirectPolicy::SubstituteHost => target.with_host(configured_host),
    })
}

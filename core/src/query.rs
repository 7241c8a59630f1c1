//! Query-string assembly and the gateway's parameter encodings.
//!
//! Parameters keep insertion order: `op` first, then `user.name` when a
//! principal is configured, then operation parameters in the order the
//! operation pushes them. The server ignores order; tests do not.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except RFC 3986 unreserved characters is escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Three-digit zero-padded octal, e.g. `0o755` -> `"755"`, `0o4` -> `"004"`.
pub fn octal_permission(mode: u32) -> String {
    format!("{mode:03o}")
}

pub fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Ordered `key=value` pairs for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// Seed a query with `op=<opcode>` and, when set, `user.name=<principal>`.
    pub fn for_op(opcode: &str, principal: Option<&str>) -> Self {
        let mut query = Self::default();
        query.push("op", opcode);
        query.push_opt("user.name", principal);
        query
    }

    pub fn push(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    pub fn push_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.push(key, bool_param(value))
    }

    /// `None` leaves the key out; `Some(0)` is sent as `0`.
    pub fn push_u64_opt(&mut self, key: &str, value: Option<u64>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value.to_string());
        }
        self
    }

    pub fn push_permission(&mut self, key: &str, mode: Option<u32>) -> &mut Self {
        if let Some(mode) = mode {
            self.push(key, octal_permission(mode));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// `k1=v1&k2=v2`, values percent-encoded.
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

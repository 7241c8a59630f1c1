//! Client construction parameters.

use serde::{Deserialize, Serialize};

use crate::redirect::RedirectPolicy;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 50070;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Coordinator host. Also the host substituted into worker redirects.
    pub host: String,
    pub port: u16,
    /// Principal sent as `user.name` on every request.
    pub user: Option<String>,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub timeout_secs: Option<u64>,
    pub redirect_policy: RedirectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: None,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            redirect_policy: RedirectPolicy::SubstituteHost,
        }
    }
}

//! Error taxonomy for gateway operations.
//!
//! # Design
//! Every failure the client can produce is a `WebHdfsError`. The variants
//! carry the operation context (opcode, path, hop) needed for a precise
//! message, and `kind()` folds them into the four classes callers act on:
//! bad arguments, unreachable node, unhappy server, missing local file.
//!
//! The mapping helpers (`check_status`, `connection`) are the only places
//! that turn transport results into errors.

use std::path::PathBuf;

use serde::Deserialize;

use crate::http::HttpResponse;
use crate::op::OpCode;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = WebHdfsError> = std::result::Result<T, E>;

/// Coarse classification of a `WebHdfsError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Protocol,
    LocalResource,
}

/// Structured exception the gateway returns in error bodies:
/// `{"RemoteException":{"exception":..,"javaClassName":..,"message":..}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteException {
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub java_class_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RemoteException {
    /// Decode an error body, returning `None` if it is not a remote exception.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "RemoteException")]
            remote_exception: RemoteException,
        }
        serde_json::from_slice::<Envelope>(body)
            .ok()
            .map(|e| e.remote_exception)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebHdfsError {
    /// Caller arguments cannot form a valid request.
    #[error("invalid arguments for {opcode}: {message}")]
    Configuration { opcode: OpCode, message: String },

    /// The node could not be reached or the exchange broke off.
    #[error("{opcode} {path} (hop {hop}): cannot connect to {url}: {source}")]
    Connection {
        opcode: OpCode,
        path: String,
        hop: u8,
        url: String,
        #[source]
        source: BoxError,
    },

    /// The server completed the exchange with a non-success status.
    #[error("{opcode} {path} (hop {hop}): HTTP {status} {reason}{}", remote_suffix(.remote))]
    Status {
        opcode: OpCode,
        path: String,
        hop: u8,
        status: u16,
        reason: String,
        remote: Option<RemoteException>,
    },

    /// A redirect to a worker node was expected but missing or unusable.
    #[error("{opcode} {path}: bad redirect (HTTP {status}): {message}")]
    Redirect {
        opcode: OpCode,
        path: String,
        status: u16,
        message: String,
    },

    /// The response body did not have the expected structure.
    #[error("{opcode} {path}: cannot decode response: {message}")]
    Decode {
        opcode: OpCode,
        path: String,
        message: String,
    },

    /// A local file needed for the operation is missing or unreadable.
    #[error("local file {}: {message}", .path.display())]
    LocalResource {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

fn remote_suffix(remote: &Option<RemoteException>) -> String {
    match remote {
        Some(RemoteException {
            message: Some(message),
            ..
        }) => format!(": {message}"),
        Some(RemoteException {
            exception: Some(exception),
            ..
        }) => format!(": {exception}"),
        _ => String::new(),
    }
}

impl WebHdfsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WebHdfsError::Configuration { .. } => ErrorKind::Configuration,
            WebHdfsError::Connection { .. } => ErrorKind::Connection,
            WebHdfsError::Status { .. }
            | WebHdfsError::Redirect { .. }
            | WebHdfsError::Decode { .. } => ErrorKind::Protocol,
            WebHdfsError::LocalResource { .. } => ErrorKind::LocalResource,
        }
    }

    /// HTTP status of the failed exchange, if one completed.
    pub fn status(&self) -> Option<u16> {
        match self {
            WebHdfsError::Status { status, .. } | WebHdfsError::Redirect { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// The server's structured exception, if it sent one.
    pub fn remote_exception(&self) -> Option<&RemoteException> {
        match self {
            WebHdfsError::Status { remote, .. } => remote.as_ref(),
            _ => None,
        }
    }

    /// True when a worker-hop failure may have left the coordinator-side
    /// effect (a created file, a lease) in place.
    pub fn maybe_partially_applied(&self) -> bool {
        match self {
            WebHdfsError::Connection { hop, .. } | WebHdfsError::Status { hop, .. } => *hop == 2,
            _ => false,
        }
    }
}

/// Map a non-success response to `WebHdfsError::Status`.
pub(crate) fn check_status(
    response: &HttpResponse,
    opcode: OpCode,
    path: &str,
    hop: u8,
) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    Err(WebHdfsError::Status {
        opcode,
        path: path.to_string(),
        hop,
        status: response.status,
        reason: response.reason().to_string(),
        remote: RemoteException::from_body(&response.body),
    })
}

pub(crate) fn connection(
    source: BoxError,
    opcode: OpCode,
    path: &str,
    hop: u8,
    url: &str,
) -> WebHdfsError {
    WebHdfsError::Connection {
        opcode,
        path: path.to_string(),
        hop,
        url: url.to_string(),
        source,
    }
}

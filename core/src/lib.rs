//! Blocking client for a WebHDFS-style REST gateway.
//!
//! # Overview
//! Metadata operations (listing, stat, permissions, home directory, rename,
//! delete) are answered by the coordinator in one exchange. Data-plane
//! operations (open, create, append) and checksums are redirected by the
//! coordinator to a worker node; the client resolves the worker's address
//! and performs the second exchange itself.
//!
//! # Design
//! - `Endpoint` is computed once per client and never mutated.
//! - Every call builds its own `Operation` (opcode, path, ordered query) and
//!   runs it through `WebHdfsClient::dispatch`; no state is kept between calls.
//! - The network sits behind the `Transport` trait. `UreqTransport` is the
//!   default; tests substitute scripted transports.
//! - Failures are `WebHdfsError` values classified by `ErrorKind`. The
//!   client never retries, prints, or exits.
//!
//! # Instrumentation
//! The dispatcher and `UreqTransport` emit `tracing` events at `debug` and
//! `trace` level only (request URL, resolved worker URL, response status).
//! They are opt-in diagnostics: nothing is written anywhere unless the
//! embedding application installs a subscriber and enables those levels.
//! Failures are never reported through events, only through returned errors.

pub mod client;
pub mod config;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod op;
pub mod query;
pub mod redirect;
pub mod transport;
pub mod types;

pub use client::{AppendOptions, CreateOptions, Credentials, ReadOptions, WebHdfsClient};
pub use config::ClientConfig;
pub use endpoint::Endpoint;
pub use error::{BoxError, ErrorKind, RemoteException, Result, WebHdfsError};
pub use crate::http::{HttpMethod, HttpRequest, HttpResponse};
pub use op::{OpCode, Operation, ResponseShape};
pub use redirect::{RedirectPolicy, RedirectTarget};
pub use transport::{Transport, UreqTransport};
pub use types::{FileChecksum, FileStatus, FileType};

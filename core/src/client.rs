//! The gateway client and its operation dispatcher.
//!
//! # Design
//! `WebHdfsClient` holds an immutable endpoint, the optional principal, the
//! default redirect policy and a `Transport`. Nothing else survives a call:
//! each operation builds an `Operation`, dispatches it in one or two HTTP
//! exchanges and decodes the final body. No result is cached and no call
//! is retried.
//!
//! Two-hop operations (OPEN, CREATE, APPEND, GETFILECHECKSUM) expect a
//! redirect from the coordinator. The transport never follows it; the
//! dispatcher resolves the worker URL under a `RedirectPolicy` and issues
//! the second request itself. A failure on the second hop may leave the
//! coordinator-side effect in place (see `WebHdfsError::maybe_partially_applied`).

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::decode::{decode_json, decode_or_default, DecodeError};
use crate::endpoint::Endpoint;
use crate::error::{check_status, connection, Result, WebHdfsError};
use crate::http::{HttpRequest, HttpResponse};
use crate::op::{OpCode, Operation, ResponseShape};
use crate::redirect::{self, RedirectPolicy};
use crate::transport::{Transport, UreqTransport};
use crate::types::{FileChecksum, FileStatus};

/// Identity attached to every request as `user.name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub principal: Option<String>,
}

impl Credentials {
    pub fn new(principal: Option<&str>) -> Self {
        Self {
            principal: principal.map(str::to_string),
        }
    }
}

/// Optional parameters for `read`. `None` leaves the parameter out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub offset: Option<u64>,
    pub length: Option<u64>,
    pub buffer_size: Option<u64>,
}

/// Optional parameters for `create`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub overwrite: bool,
    pub block_size: Option<u64>,
    pub replication: Option<u64>,
    pub permission: Option<u32>,
    pub buffer_size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppendOptions {
    pub buffer_size: Option<u64>,
}

/// Client for one gateway coordinator.
#[derive(Debug, Clone)]
pub struct WebHdfsClient<T = UreqTransport> {
    endpoint: Endpoint,
    credentials: Credentials,
    redirect_policy: RedirectPolicy,
    transport: T,
}

impl WebHdfsClient<UreqTransport> {
    /// Client for `host:port` with no principal and the default transport.
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_transport(
            Endpoint::new(host, port),
            Credentials::default(),
            UreqTransport::default(),
        )
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout_secs.map(Duration::from_secs));
        Self::with_transport(
            Endpoint::new(&config.host, config.port),
            Credentials::new(config.user.as_deref()),
            transport,
        )
        .with_redirect_policy(config.redirect_policy)
    }
}

impl<T: Transport> WebHdfsClient<T> {
    pub fn with_transport(endpoint: Endpoint, credentials: Credentials, transport: T) -> Self {
        Self {
            endpoint,
            credentials,
            redirect_policy: RedirectPolicy::default(),
            transport,
        }
    }

    /// Replace the redirect policy used by the semantic operations.
    pub fn with_redirect_policy(mut self, policy: RedirectPolicy) -> Self {
        self.redirect_policy = policy;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.redirect_policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// A fresh operation carrying this client's principal.
    pub fn operation(&self, opcode: OpCode, path: &str) -> Operation {
        Operation::new(opcode, path, self.credentials.principal.as_deref())
    }

    /// The coordinator request for `op`. Never carries a body: payloads
    /// travel on the worker hop only.
    pub fn build_request(&self, op: &Operation) -> HttpRequest {
        HttpRequest {
            method: op.opcode.method(),
            url: format!("{}?{}", self.endpoint.url_for(&op.path), op.query.encode()),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Execute `op`, following the coordinator's redirect for two-hop
    /// operations under `policy`. Returns the final successful response.
    pub fn dispatch(&self, op: Operation, policy: RedirectPolicy) -> Result<HttpResponse> {
        let opcode = op.opcode;
        let request = self.build_request(&op);
        debug!(op = %opcode, path = %op.path, url = %request.url, "dispatching");
        let response = self.exchange(&request, opcode, &op.path, 1)?;

        if !opcode.is_two_hop() {
            check_status(&response, opcode, &op.path, 1)?;
            return Ok(response);
        }

        if !response.is_redirect() {
            check_status(&response, opcode, &op.path, 1)?;
            return Err(bad_redirect(&op, &response, "expected a redirect to a worker node"));
        }
        let location = response
            .header("location")
            .ok_or_else(|| bad_redirect(&op, &response, "missing Location header"))?;
        let url = redirect::resolve(location, self.endpoint.host(), policy)
            .map_err(|message| bad_redirect(&op, &response, &message))?;
        debug!(op = %opcode, %location, %url, %policy, "following redirect");

        let headers = if op.body.is_some() {
            vec![(
                "content-type".to_string(),
                "application/octet-stream".to_string(),
            )]
        } else {
            Vec::new()
        };
        let request = HttpRequest {
            method: opcode.method(),
            url,
            headers,
            body: op.body,
        };
        let response = self.exchange(&request, opcode, &op.path, 2)?;
        check_status(&response, opcode, &op.path, 2)?;
        Ok(response)
    }

    /// Dispatch with the client's policy and decode the JSON document at the
    /// operation's key path. An empty body yields an empty object.
    pub fn dispatch_json(&self, op: Operation) -> Result<serde_json::Value> {
        let (opcode, path) = (op.opcode, op.path.clone());
        let response = self.dispatch(op, self.redirect_policy)?;
        decode_json(&response.body, keys(opcode)).map_err(|e| decode_error(opcode, &path, e))
    }

    /// List a directory. A path naming a file yields that file's entry alone.
    pub fn list_dir(&self, path: &str) -> Result<Vec<FileStatus>> {
        self.call_or_default(self.operation(OpCode::ListStatus, path))
    }

    /// Status of `path`. `None` when the gateway answers with an empty body.
    pub fn stat(&self, path: &str) -> Result<Option<FileStatus>> {
        self.call_or_default(self.operation(OpCode::GetFileStatus, path))
    }

    /// Checksum of `path`, read from the worker. `None` for an empty body.
    pub fn checksum(&self, path: &str) -> Result<Option<FileChecksum>> {
        self.call_or_default(self.operation(OpCode::GetFileChecksum, path))
    }

    /// Home directory of the principal. `None` for an empty body.
    pub fn home_dir(&self) -> Result<Option<String>> {
        self.call_or_default(self.operation(OpCode::GetHomeDirectory, "/"))
    }

    pub fn set_permission(&self, path: &str, mode: u32) -> Result<()> {
        let mut op = self.operation(OpCode::SetPermission, path);
        op.query.push_permission("permission", Some(mode));
        self.dispatch(op, self.redirect_policy).map(drop)
    }

    /// Change owner and/or group. Empty strings count as unset; at least one
    /// must be given, which is checked before anything is sent.
    pub fn set_owner(&self, path: &str, owner: Option<&str>, group: Option<&str>) -> Result<()> {
        let owner = owner.filter(|s| !s.is_empty());
        let group = group.filter(|s| !s.is_empty());
        if owner.is_none() && group.is_none() {
            return Err(WebHdfsError::Configuration {
                opcode: OpCode::SetOwner,
                message: "need to specify at least one of owner or group".to_string(),
            });
        }
        let mut op = self.operation(OpCode::SetOwner, path);
        op.query.push_opt("owner", owner).push_opt("group", group);
        self.dispatch(op, self.redirect_policy).map(drop)
    }

    /// File content, buffered whole.
    pub fn read(&self, path: &str, options: &ReadOptions) -> Result<Vec<u8>> {
        let mut op = self.operation(OpCode::Open, path);
        op.query
            .push_u64_opt("offset", options.offset)
            .push_u64_opt("length", options.length)
            .push_u64_opt("buffersize", options.buffer_size);
        Ok(self.dispatch(op, self.redirect_policy)?.body)
    }

    pub fn create(&self, path: &str, data: Vec<u8>, options: &CreateOptions) -> Result<()> {
        let mut op = self.operation(OpCode::Create, path);
        op.query
            .push_bool("overwrite", options.overwrite)
            .push_u64_opt("blocksize", options.block_size)
            .push_u64_opt("replication", options.replication)
            .push_permission("permission", options.permission)
            .push_u64_opt("buffersize", options.buffer_size);
        self.dispatch(op.with_body(data), self.redirect_policy).map(drop)
    }

    /// Upload a local file. Fails with a local-resource error, before any
    /// request, if `local` is not a readable file.
    pub fn create_from_file(&self, local: &Path, path: &str, options: &CreateOptions) -> Result<()> {
        let data = read_local(local)?;
        self.create(path, data, options)
    }

    pub fn append(&self, path: &str, data: Vec<u8>, options: &AppendOptions) -> Result<()> {
        let mut op = self.operation(OpCode::Append, path);
        op.query.push_u64_opt("buffersize", options.buffer_size);
        self.dispatch(op.with_body(data), self.redirect_policy).map(drop)
    }

    pub fn append_from_file(&self, local: &Path, path: &str, options: &AppendOptions) -> Result<()> {
        let data = read_local(local)?;
        self.append(path, data, options)
    }

    pub fn mkdirs(&self, path: &str, permission: Option<u32>) -> Result<bool> {
        let mut op = self.operation(OpCode::Mkdirs, path);
        op.query.push_permission("permission", permission);
        self.call_or_default(op)
    }

    pub fn rename(&self, path: &str, destination: &str) -> Result<bool> {
        let mut op = self.operation(OpCode::Rename, path);
        op.query.push("destination", destination);
        self.call_or_default(op)
    }

    pub fn delete(&self, path: &str, recursive: bool) -> Result<bool> {
        let mut op = self.operation(OpCode::Delete, path);
        op.query.push_bool("recursive", recursive);
        self.call_or_default(op)
    }

    fn call_or_default<V: DeserializeOwned + Default>(&self, op: Operation) -> Result<V> {
        let (opcode, path) = (op.opcode, op.path.clone());
        let response = self.dispatch(op, self.redirect_policy)?;
        decode_or_default(&response.body, keys(opcode))
            .map_err(|e| decode_error(opcode, &path, e))
    }

    fn exchange(
        &self,
        request: &HttpRequest,
        opcode: OpCode,
        path: &str,
        hop: u8,
    ) -> Result<HttpResponse> {
        self.transport
            .execute(request)
            .map_err(|source| connection(source, opcode, path, hop, &request.url))
    }
}

fn bad_redirect(op: &Operation, response: &HttpResponse, message: &str) -> WebHdfsError {
    WebHdfsError::Redirect {
        opcode: op.opcode,
        path: op.path.clone(),
        status: response.status,
        message: message.to_string(),
    }
}

fn keys(opcode: OpCode) -> &'static [&'static str] {
    match opcode.response_shape() {
        ResponseShape::Json(keys) => keys,
        ResponseShape::Raw | ResponseShape::Empty => &[],
    }
}

fn decode_error(opcode: OpCode, path: &str, err: DecodeError) -> WebHdfsError {
    WebHdfsError::Decode {
        opcode,
        path: path.to_string(),
        message: err.to_string(),
    }
}

fn read_local(local: &Path) -> Result<Vec<u8>> {
    if !local.is_file() {
        return Err(WebHdfsError::LocalResource {
            path: local.to_path_buf(),
            message: "not found or not a regular file".to_string(),
            source: None,
        });
    }
    std::fs::read(local).map_err(|e| WebHdfsError::LocalResource {
        path: local.to_path_buf(),
        message: "cannot read".to_string(),
        source: Some(e),
    })
}

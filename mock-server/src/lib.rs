//! In-memory WebHDFS gateway for tests and local runs.
//!
//! Two routers share one `Namespace`:
//! - the coordinator answers metadata operations directly and redirects
//!   OPEN, CREATE, APPEND and GETFILECHECKSUM with `307 Temporary Redirect`;
//! - the worker serves and stores file bytes and computes checksums.
//!
//! Redirects name the worker by `advertised_host`, which may be an address
//! only meaningful "inside the cluster". That is what clients must cope with.

pub mod namespace;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::{net::TcpListener, sync::RwLock};

use crate::namespace::{normalize, FsError, Namespace, NewFile};

pub const API_PREFIX: &str = "/webhdfs/v1";

/// User reported for requests that carry no `user.name`.
pub const ANONYMOUS_USER: &str = "dr.who";

const PATH_ESCAPE: &AsciiSet = &CONTROLS.add(b' ').add(b'#').add(b'%').add(b'?');
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub type Db = Arc<RwLock<Namespace>>;

/// State shared by the coordinator and worker routers.
#[derive(Clone)]
pub struct Gateway {
    pub db: Db,
    /// `host:port` written into redirect `Location` headers.
    pub worker_authority: String,
}

impl Gateway {
    pub fn new(worker_authority: &str) -> Self {
        Self {
            db: Arc::new(RwLock::new(Namespace::default())),
            worker_authority: worker_authority.to_string(),
        }
    }
}

type Params = HashMap<String, String>;

pub fn coordinator_app(gateway: Gateway) -> Router {
    Router::new()
        .route("/webhdfs/v1/", any(coordinator_root))
        .route("/webhdfs/v1/{*path}", any(coordinator_op))
        .with_state(gateway)
}

pub fn worker_app(gateway: Gateway) -> Router {
    Router::new()
        .route("/webhdfs/v1/{*path}", any(worker_op))
        .with_state(gateway)
}

/// Serve both roles until either listener fails. Redirects point at
/// `advertised_host` and the worker listener's port.
pub async fn run(
    coordinator_listener: TcpListener,
    worker_listener: TcpListener,
    advertised_host: &str,
) -> Result<(), std::io::Error> {
    let worker_port = worker_listener.local_addr()?.port();
    let gateway = Gateway::new(&format!("{advertised_host}:{worker_port}"));
    let coordinator_router = coordinator_app(gateway.clone());
    let worker_router = worker_app(gateway);
    tokio::try_join!(
        async move { axum::serve(coordinator_listener, coordinator_router).await },
        async move { axum::serve(worker_listener, worker_router).await },
    )?;
    Ok(())
}

fn remote_exception(status: u16, exception: &str, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = json!({
        "RemoteException": {
            "exception": exception,
            "javaClassName": java_class(exception),
            "message": message,
        }
    });
    (status, Json(body)).into_response()
}

fn java_class(exception: &str) -> String {
    match exception {
        "FileNotFoundException" => "java.io.FileNotFoundException".to_string(),
        "IllegalArgumentException" => "java.lang.IllegalArgumentException".to_string(),
        other => format!("org.apache.hadoop.fs.{other}"),
    }
}

fn fs_error(err: FsError) -> Response {
    let (status, exception, message) = err.describe();
    tracing::debug!(%message, "request failed");
    remote_exception(status, exception, &message)
}

fn bad_param(name: &str, value: &str) -> Response {
    remote_exception(
        400,
        "IllegalArgumentException",
        &format!("Invalid value for webhdfs parameter \"{name}\": {value}"),
    )
}

fn boolean(value: bool) -> Response {
    Json(json!({ "boolean": value })).into_response()
}

fn user(params: &Params) -> &str {
    params
        .get("user.name")
        .map(String::as_str)
        .unwrap_or(ANONYMOUS_USER)
}

fn flag(params: &Params, name: &str) -> Result<bool, Response> {
    match params.get(name).map(String::as_str) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(bad_param(name, other)),
    }
}

fn number<T: std::str::FromStr>(params: &Params, name: &str) -> Result<Option<T>, Response> {
    params
        .get(name)
        .map(|v| v.parse().map_err(|_| bad_param(name, v)))
        .transpose()
}

fn octal(params: &Params, name: &str) -> Result<Option<u32>, Response> {
    params
        .get(name)
        .map(|v| {
            u32::from_str_radix(v, 8)
                .ok()
                .filter(|m| *m <= 0o1777)
                .ok_or_else(|| bad_param(name, v))
        })
        .transpose()
}

fn opcode(params: &Params) -> Result<String, Response> {
    params
        .get("op")
        .map(|op| op.to_ascii_uppercase())
        .ok_or_else(|| bad_param("op", "<missing>"))
}

fn fs_path(raw: &str) -> Result<String, Response> {
    normalize(&format!("/{}", raw.trim_start_matches('/'))).map_err(fs_error)
}

fn expect_method(method: &Method, expected: Method, op: &str) -> Result<(), Response> {
    if *method == expected {
        Ok(())
    } else {
        Err(bad_param("op", &format!("{op} does not support {method}")))
    }
}

/// `307` to the worker, carrying the request's parameters plus a
/// coordinator address the way real gateways do.
fn redirect_to_worker(gateway: &Gateway, path: &str, params: &Params) -> Response {
    let mut query: BTreeMap<&str, &str> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    query.insert("namenoderpcaddress", "coordinator:8020");
    let encoded = query
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, QUERY_ESCAPE)))
        .collect::<Vec<_>>()
        .join("&");
    let location = format!(
        "http://{}{API_PREFIX}{}?{encoded}",
        gateway.worker_authority,
        utf8_percent_encode(path, PATH_ESCAPE)
    );
    tracing::debug!(%location, "redirecting to worker");
    match HeaderValue::from_str(&location) {
        Ok(value) => (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, value)],
        )
            .into_response(),
        Err(_) => remote_exception(500, "IOException", "cannot build redirect"),
    }
}

async fn coordinator_root(
    State(gateway): State<Gateway>,
    method: Method,
    Query(params): Query<Params>,
) -> Response {
    coordinator(gateway, method, "/".to_string(), params).await
}

async fn coordinator_op(
    State(gateway): State<Gateway>,
    method: Method,
    Path(raw): Path<String>,
    Query(params): Query<Params>,
) -> Response {
    match fs_path(&raw) {
        Ok(path) => coordinator(gateway, method, path, params).await,
        Err(response) => response,
    }
}

async fn coordinator(gateway: Gateway, method: Method, path: String, params: Params) -> Response {
    match coordinator_inner(&gateway, &method, &path, &params).await {
        Ok(response) | Err(response) => response,
    }
}

async fn coordinator_inner(
    gateway: &Gateway,
    method: &Method,
    path: &str,
    params: &Params,
) -> Result<Response, Response> {
    let op = opcode(params)?;
    tracing::debug!(%method, %op, path, "coordinator request");
    match op.as_str() {
        "LISTSTATUS" => {
            expect_method(method, Method::GET, &op)?;
            let db = gateway.db.read().await;
            let entries: Vec<_> = db
                .list(path)
                .map_err(fs_error)?
                .into_iter()
                .map(|(name, node)| node.status(&name))
                .collect();
            Ok(Json(json!({ "FileStatuses": { "FileStatus": entries } })).into_response())
        }
        "GETFILESTATUS" => {
            expect_method(method, Method::GET, &op)?;
            let db = gateway.db.read().await;
            let node = db.get(path).map_err(fs_error)?;
            Ok(Json(json!({ "FileStatus": node.status("") })).into_response())
        }
        "GETHOMEDIRECTORY" => {
            expect_method(method, Method::GET, &op)?;
            Ok(Json(json!({ "Path": format!("/user/{}", user(params)) })).into_response())
        }
        "SETPERMISSION" => {
            expect_method(method, Method::PUT, &op)?;
            let mode = octal(params, "permission")?.unwrap_or(0o755);
            let mut db = gateway.db.write().await;
            db.set_permission(path, mode).map_err(fs_error)?;
            Ok(StatusCode::OK.into_response())
        }
        "SETOWNER" => {
            expect_method(method, Method::PUT, &op)?;
            let owner = params.get("owner").map(String::as_str);
            let group = params.get("group").map(String::as_str);
            if owner.is_none() && group.is_none() {
                return Err(bad_param("owner", "<missing>"));
            }
            let mut db = gateway.db.write().await;
            db.set_owner(path, owner, group).map_err(fs_error)?;
            Ok(StatusCode::OK.into_response())
        }
        "MKDIRS" => {
            expect_method(method, Method::PUT, &op)?;
            let permission = octal(params, "permission")?;
            let mut db = gateway.db.write().await;
            let created = db.mkdirs(path, user(params), permission).map_err(fs_error)?;
            Ok(boolean(created))
        }
        "RENAME" => {
            expect_method(method, Method::PUT, &op)?;
            let destination = params
                .get("destination")
                .ok_or_else(|| bad_param("destination", "<missing>"))?;
            let destination = normalize(destination).map_err(fs_error)?;
            let mut db = gateway.db.write().await;
            Ok(boolean(db.rename(path, &destination)))
        }
        "DELETE" => {
            expect_method(method, Method::DELETE, &op)?;
            let recursive = flag(params, "recursive")?;
            let mut db = gateway.db.write().await;
            let deleted = db.delete(path, recursive).map_err(fs_error)?;
            Ok(boolean(deleted))
        }
        "OPEN" | "GETFILECHECKSUM" => {
            expect_method(method, Method::GET, &op)?;
            let db = gateway.db.read().await;
            if db.get(path).map_err(fs_error)?.is_dir() {
                return Err(fs_error(FsError::IsDirectory(path.to_string())));
            }
            Ok(redirect_to_worker(gateway, path, params))
        }
        "CREATE" => {
            expect_method(method, Method::PUT, &op)?;
            let db = gateway.db.read().await;
            match db.get(path) {
                Ok(node) if node.is_dir() => {
                    return Err(fs_error(FsError::IsDirectory(path.to_string())))
                }
                Ok(_) if !flag(params, "overwrite")? => {
                    return Err(fs_error(FsError::AlreadyExists(path.to_string())))
                }
                _ => {}
            }
            Ok(redirect_to_worker(gateway, path, params))
        }
        "APPEND" => {
            expect_method(method, Method::POST, &op)?;
            let db = gateway.db.read().await;
            if db.get(path).map_err(fs_error)?.is_dir() {
                return Err(fs_error(FsError::IsDirectory(path.to_string())));
            }
            Ok(redirect_to_worker(gateway, path, params))
        }
        other => Err(bad_param("op", other)),
    }
}

async fn worker_op(
    State(gateway): State<Gateway>,
    method: Method,
    Path(raw): Path<String>,
    Query(params): Query<Params>,
    body: Bytes,
) -> Response {
    let path = match fs_path(&raw) {
        Ok(path) => path,
        Err(response) => return response,
    };
    match worker_inner(&gateway, &method, &path, &params, body).await {
        Ok(response) | Err(response) => response,
    }
}

async fn worker_inner(
    gateway: &Gateway,
    method: &Method,
    path: &str,
    params: &Params,
    body: Bytes,
) -> Result<Response, Response> {
    let op = opcode(params)?;
    tracing::debug!(%method, %op, path, bytes = body.len(), "worker request");
    match op.as_str() {
        "OPEN" => {
            expect_method(method, Method::GET, &op)?;
            let offset = number::<u64>(params, "offset")?.unwrap_or(0);
            let length = number::<u64>(params, "length")?;
            let db = gateway.db.read().await;
            let data = db.read(path, offset, length).map_err(fs_error)?.to_vec();
            Ok((
                [(header::CONTENT_TYPE, "application/octet-stream")],
                data,
            )
                .into_response())
        }
        "GETFILECHECKSUM" => {
            expect_method(method, Method::GET, &op)?;
            let db = gateway.db.read().await;
            let data = db.read(path, 0, None).map_err(fs_error)?;
            let digest = Sha256::digest(data);
            let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
            Ok(Json(json!({
                "FileChecksum": {
                    "algorithm": "SHA-256",
                    "bytes": hex,
                    "length": digest.len(),
                }
            }))
            .into_response())
        }
        "CREATE" => {
            expect_method(method, Method::PUT, &op)?;
            let opts = NewFile {
                owner: user(params),
                overwrite: flag(params, "overwrite")?,
                permission: octal(params, "permission")?,
                replication: number(params, "replication")?,
                block_size: number(params, "blocksize")?,
            };
            let mut db = gateway.db.write().await;
            db.create(path, body.to_vec(), &opts).map_err(fs_error)?;
            let location = HeaderValue::from_str(&format!("hdfs://coordinator:8020{path}"))
                .unwrap_or(HeaderValue::from_static("/"));
            Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
        }
        "APPEND" => {
            expect_method(method, Method::POST, &op)?;
            let mut db = gateway.db.write().await;
            db.append(path, &body).map_err(fs_error)?;
            Ok(StatusCode::OK.into_response())
        }
        other => Err(bad_param("op", other)),
    }
}

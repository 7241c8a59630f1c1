//! The gateway opcode table.
//!
//! Every operation's method, hop count and response shape is fixed by the
//! REST protocol; they are encoded here once and looked up by the dispatcher.

use std::fmt;

use crate::http::HttpMethod;
use crate::query::Query;

/// How a successful (final-hop) response body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Parse as JSON and descend through these keys.
    Json(&'static [&'static str]),
    /// Return the body bytes untouched.
    Raw,
    /// The body carries nothing the caller needs.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    ListStatus,
    GetFileStatus,
    GetFileChecksum,
    GetHomeDirectory,
    SetPermission,
    SetOwner,
    Open,
    Create,
    Append,
    Mkdirs,
    Rename,
    Delete,
}

impl OpCode {
    pub fn as_str(self) -> &'static str {
        match self {
            OpCode::ListStatus => "LISTSTATUS",
            OpCode::GetFileStatus => "GETFILESTATUS",
            OpCode::GetFileChecksum => "GETFILECHECKSUM",
            OpCode::GetHomeDirectory => "GETHOMEDIRECTORY",
            OpCode::SetPermission => "SETPERMISSION",
            OpCode::SetOwner => "SETOWNER",
            OpCode::Open => "OPEN",
            OpCode::Create => "CREATE",
            OpCode::Append => "APPEND",
            OpCode::Mkdirs => "MKDIRS",
            OpCode::Rename => "RENAME",
            OpCode::Delete => "DELETE",
        }
    }

    pub fn method(self) -> HttpMethod {
        match self {
            OpCode::ListStatus
            | OpCode::GetFileStatus
            | OpCode::GetFileChecksum
            | OpCode::GetHomeDirectory
            | OpCode::Open => HttpMethod::Get,
            OpCode::SetPermission
            | OpCode::SetOwner
            | OpCode::Create
            | OpCode::Mkdirs
            | OpCode::Rename => HttpMethod::Put,
            OpCode::Append => HttpMethod::Post,
            OpCode::Delete => HttpMethod::Delete,
        }
    }

    /// Two-hop operations are redirected by the coordinator to a worker node.
    pub fn is_two_hop(self) -> bool {
        matches!(
            self,
            OpCode::GetFileChecksum | OpCode::Open | OpCode::Create | OpCode::Append
        )
    }

    /// Shape of the final response body.
    pub fn response_shape(self) -> ResponseShape {
        match self {
            OpCode::ListStatus => ResponseShape::Json(&["FileStatuses", "FileStatus"]),
            OpCode::GetFileStatus => ResponseShape::Json(&["FileStatus"]),
            OpCode::GetFileChecksum => ResponseShape::Json(&["FileChecksum"]),
            OpCode::GetHomeDirectory => ResponseShape::Json(&["Path"]),
            OpCode::Mkdirs | OpCode::Rename | OpCode::Delete => {
                ResponseShape::Json(&["boolean"])
            }
            OpCode::Open => ResponseShape::Raw,
            OpCode::SetPermission | OpCode::SetOwner | OpCode::Create | OpCode::Append => {
                ResponseShape::Empty
            }
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical filesystem operation. Built per call and discarded afterwards.
///
/// `body` is only ever sent on the worker hop of CREATE and APPEND.
#[derive(Debug, Clone)]
pub struct Operation {
    pub opcode: OpCode,
    pub path: String,
    pub query: Query,
    pub body: Option<Vec<u8>>,
}

impl Operation {
    pub fn new(opcode: OpCode, path: &str, principal: Option<&str>) -> Self {
        Self {
            opcode,
            path: path.to_string(),
            query: Query::for_op(opcode.as_str(), principal),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

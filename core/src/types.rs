//! DTOs for the gateway's JSON documents.
//!
//! Field names follow the wire format (camelCase). Keys this crate does not
//! model are kept in `extra` so nothing the server sends is dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// One entry of a listing, or the result of a stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    /// Name relative to the listed directory; empty for a stat of the path itself.
    #[serde(default)]
    pub path_suffix: String,
    #[serde(rename = "type")]
    pub kind: FileType,
    pub length: u64,
    pub owner: String,
    pub group: String,
    /// Octal permission string as sent by the server, e.g. `"755"`.
    pub permission: String,
    /// Milliseconds since the Unix epoch.
    pub modification_time: i64,
    #[serde(default)]
    pub access_time: i64,
    #[serde(default)]
    pub block_size: u64,
    #[serde(default)]
    pub replication: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children_num: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileStatus {
    pub fn is_dir(&self) -> bool {
        self.kind == FileType::Directory
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    pub algorithm: String,
    /// Hex-encoded checksum bytes.
    pub bytes: String,
    pub length: u64,
}

//! In-memory filesystem tree backing the mock gateway.
//!
//! Paths are absolute, `/`-separated, with no trailing slash except the root.
//! Entries live in a `BTreeMap` keyed by path.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

pub const DEFAULT_GROUP: &str = "supergroup";
pub const DEFAULT_BLOCK_SIZE: u64 = 134_217_728;
pub const DEFAULT_REPLICATION: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    NotFound(String),
    AlreadyExists(String),
    ParentNotDirectory(String),
    IsDirectory(String),
    NotEmpty(String),
    InvalidPath(String),
}

impl FsError {
    /// HTTP status, Java exception name and message, as a gateway reports them.
    pub fn describe(&self) -> (u16, &'static str, String) {
        match self {
            FsError::NotFound(p) => (404, "FileNotFoundException", format!("File does not exist: {p}")),
            FsError::AlreadyExists(p) => (403, "FileAlreadyExistsException", format!("{p} already exists")),
            FsError::ParentNotDirectory(p) => (
                403,
                "ParentNotDirectoryException",
                format!("Parent path is not a directory: {p}"),
            ),
            FsError::IsDirectory(p) => (400, "FileNotFoundException", format!("Path is not a file: {p}")),
            FsError::NotEmpty(p) => (403, "PathIsNotEmptyDirectoryException", format!("{p} is non empty")),
            FsError::InvalidPath(p) => (400, "InvalidPathException", format!("Invalid path name {p}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub permission: u32,
    pub owner: String,
    pub group: String,
    pub modification_time: i64,
    pub replication: u32,
    pub block_size: u64,
}

impl Node {
    fn directory(owner: &str, permission: u32) -> Self {
        Self {
            kind: NodeKind::Directory,
            permission,
            owner: owner.to_string(),
            group: DEFAULT_GROUP.to_string(),
            modification_time: now_millis(),
            replication: 0,
            block_size: 0,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn len(&self) -> u64 {
        match &self.kind {
            NodeKind::Directory => 0,
            NodeKind::File(data) => data.len() as u64,
        }
    }

    /// Wire representation of this entry, named `suffix` within its listing.
    pub fn status(&self, suffix: &str) -> Value {
        json!({
            "pathSuffix": suffix,
            "type": if self.is_dir() { "DIRECTORY" } else { "FILE" },
            "length": self.len(),
            "owner": self.owner,
            "group": self.group,
            "permission": format!("{:o}", self.permission),
            "modificationTime": self.modification_time,
            "accessTime": if self.is_dir() { 0 } else { self.modification_time },
            "blockSize": self.block_size,
            "replication": self.replication,
        })
    }
}

/// Parameters for creating a file.
#[derive(Debug, Clone)]
pub struct NewFile<'a> {
    pub owner: &'a str,
    pub overwrite: bool,
    pub permission: Option<u32>,
    pub replication: Option<u32>,
    pub block_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Namespace {
    nodes: BTreeMap<String, Node>,
}

impl Default for Namespace {
    fn default() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::directory("hdfs", 0o755));
        Self { nodes }
    }
}

/// Canonical form of `path`, or `InvalidPath`.
pub fn normalize(path: &str) -> Result<String, FsError> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath(path.to_string()));
    }
    let mut parts = Vec::new();
    for part in path.split('/') {
        match part {
            "" => {}
            "." | ".." => return Err(FsError::InvalidPath(path.to_string())),
            p => parts.push(p),
        }
    }
    Ok(format!("/{}", parts.join("/")))
}

fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) if path.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(i) => Some(&path[..i]),
    }
}

fn name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

fn is_descendant(candidate: &str, dir: &str) -> bool {
    if dir == "/" {
        return candidate != "/";
    }
    candidate
        .strip_prefix(dir)
        .is_some_and(|rest| rest.starts_with('/'))
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl Namespace {
    pub fn get(&self, path: &str) -> Result<&Node, FsError> {
        self.nodes
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    fn get_mut(&mut self, path: &str) -> Result<&mut Node, FsError> {
        self.nodes
            .get_mut(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    /// Direct children of a directory as `(name, node)`; a file lists itself
    /// under an empty name.
    pub fn list(&self, path: &str) -> Result<Vec<(String, &Node)>, FsError> {
        let node = self.get(path)?;
        if !node.is_dir() {
            return Ok(vec![(String::new(), node)]);
        }
        Ok(self
            .nodes
            .iter()
            .filter(|(p, _)| parent(p) == Some(path))
            .map(|(p, n)| (name(p).to_string(), n))
            .collect())
    }

    pub fn mkdirs(&mut self, path: &str, owner: &str, permission: Option<u32>) -> Result<bool, FsError> {
        let mut missing = Vec::new();
        let mut cursor = Some(path);
        while let Some(p) = cursor {
            match self.nodes.get(p) {
                Some(node) if node.is_dir() => break,
                Some(_) if p == path => return Err(FsError::AlreadyExists(path.to_string())),
                Some(_) => return Err(FsError::ParentNotDirectory(p.to_string())),
                None => missing.push(p.to_string()),
            }
            cursor = parent(p);
        }
        for p in missing.into_iter().rev() {
            self.nodes
                .insert(p, Node::directory(owner, permission.unwrap_or(0o755)));
        }
        Ok(true)
    }

    pub fn create(&mut self, path: &str, data: Vec<u8>, opts: &NewFile<'_>) -> Result<(), FsError> {
        if path == "/" {
            return Err(FsError::IsDirectory(path.to_string()));
        }
        match self.nodes.get(path) {
            Some(node) if node.is_dir() => return Err(FsError::IsDirectory(path.to_string())),
            Some(_) if !opts.overwrite => return Err(FsError::AlreadyExists(path.to_string())),
            _ => {}
        }
        if let Some(dir) = parent(path) {
            self.mkdirs(dir, opts.owner, None)?;
        }
        self.nodes.insert(
            path.to_string(),
            Node {
                kind: NodeKind::File(data),
                permission: opts.permission.unwrap_or(0o644),
                owner: opts.owner.to_string(),
                group: DEFAULT_GROUP.to_string(),
                modification_time: now_millis(),
                replication: opts.replication.unwrap_or(DEFAULT_REPLICATION),
                block_size: opts.block_size.unwrap_or(DEFAULT_BLOCK_SIZE),
            },
        );
        Ok(())
    }

    pub fn append(&mut self, path: &str, more: &[u8]) -> Result<(), FsError> {
        let node = self.get_mut(path)?;
        match &mut node.kind {
            NodeKind::File(data) => {
                data.extend_from_slice(more);
                node.modification_time = now_millis();
                Ok(())
            }
            NodeKind::Directory => Err(FsError::IsDirectory(path.to_string())),
        }
    }

    /// File bytes in `[offset, offset + length)`, clamped to the file size.
    pub fn read(&self, path: &str, offset: u64, length: Option<u64>) -> Result<&[u8], FsError> {
        match &self.get(path)?.kind {
            NodeKind::File(data) => {
                let start = (offset as usize).min(data.len());
                let end = match length {
                    Some(len) => start.saturating_add(len as usize).min(data.len()),
                    None => data.len(),
                };
                Ok(&data[start..end])
            }
            NodeKind::Directory => Err(FsError::IsDirectory(path.to_string())),
        }
    }

    pub fn set_permission(&mut self, path: &str, permission: u32) -> Result<(), FsError> {
        self.get_mut(path)?.permission = permission;
        Ok(())
    }

    pub fn set_owner(&mut self, path: &str, owner: Option<&str>, group: Option<&str>) -> Result<(), FsError> {
        let node = self.get_mut(path)?;
        if let Some(owner) = owner {
            node.owner = owner.to_string();
        }
        if let Some(group) = group {
            node.group = group.to_string();
        }
        Ok(())
    }

    /// Move `from` (and its subtree) to `to`. Returns false, like the real
    /// gateway, when the source is missing, the target exists, the target's
    /// parent is missing, or the target lies inside the source.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == "/" || !self.nodes.contains_key(from) || self.nodes.contains_key(to) {
            return false;
        }
        if is_descendant(to, from) {
            return false;
        }
        match parent(to).and_then(|p| self.nodes.get(p)) {
            Some(dir) if dir.is_dir() => {}
            _ => return false,
        }
        let moved: Vec<String> = self
            .nodes
            .keys()
            .filter(|p| p.as_str() == from || is_descendant(p, from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = self.nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                self.nodes.insert(new, node);
            }
        }
        true
    }

    /// Remove `path`. Returns false when it does not exist.
    pub fn delete(&mut self, path: &str, recursive: bool) -> Result<bool, FsError> {
        if path == "/" {
            return Ok(false);
        }
        if !self.nodes.contains_key(path) {
            return Ok(false);
        }
        let descendants: Vec<String> = self
            .nodes
            .keys()
            .filter(|p| is_descendant(p, path))
            .cloned()
            .collect();
        if !descendants.is_empty() && !recursive {
            return Err(FsError::NotEmpty(path.to_string()));
        }
        for p in descendants {
            self.nodes.remove(&p);
        }
        self.nodes.remove(path);
        Ok(true)
    }
}

//! Human-readable rendering of file status records.

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use serde_json::Value;
use webhdfs_core::FileStatus;

/// Listing name: the entry's suffix, or the requested path for a file,
/// whose status carries an empty suffix.
pub fn entry_name<'a>(stat: &'a FileStatus, requested: &'a str) -> &'a str {
    if stat.path_suffix.is_empty() {
        requested
    } else {
        &stat.path_suffix
    }
}

pub fn stat_short(stat: &FileStatus, requested: &str) -> String {
    entry_name(stat, requested).to_string()
}

/// `permission length owner group "Mon DD HH:MM" name`, in local time.
pub fn stat_long(stat: &FileStatus, requested: &str) -> String {
    format!(
        "{:<4} {:>10} {:<8} {:<10} {} {}",
        stat.permission,
        stat.length,
        stat.owner,
        stat.group,
        modified(stat.modification_time),
        entry_name(stat, requested)
    )
}

fn modified(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|t| t.format("%b %d %H:%M").to_string())
        .unwrap_or_default()
}

/// One `key: value` line per field, keys padded to the longest key.
pub fn stat_lines(stat: &FileStatus) -> Result<Vec<String>> {
    let value = serde_json::to_value(stat).context("cannot render file status")?;
    let Value::Object(fields) = value else {
        anyhow::bail!("file status is not a record");
    };
    let width = fields.keys().map(String::len).max().unwrap_or(0);
    Ok(fields
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key:width$}: {s}"),
            other => format!("{key:width$}: {other}"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(suffix: &str) -> FileStatus {
        serde_json::from_value(serde_json::json!({
            "pathSuffix": suffix,
            "type": "FILE",
            "length": 1234,
            "owner": "alice",
            "group": "supergroup",
            "permission": "644",
            "modificationTime": 1_700_000_000_000i64,
        }))
        .unwrap()
    }

    #[test]
    fn short_form_falls_back_to_requested_path() {
        assert_eq!(stat_short(&status("a.txt"), "/data"), "a.txt");
        assert_eq!(stat_short(&status(""), "/data/a.txt"), "/data/a.txt");
    }

    #[test]
    fn long_form_columns() {
        let line = stat_long(&status("a.txt"), "/data");
        let expected = format!(
            "644        1234 alice    supergroup {} a.txt",
            modified(1_700_000_000_000)
        );
        assert_eq!(line, expected);
    }

    #[test]
    fn timestamp_format() {
        let text = modified(1_700_000_000_000);
        // "Nov 14 22:13" in UTC; only the shape is stable across zones.
        assert_eq!(text.len(), 12);
        assert_eq!(&text[6..7], " ");
        assert_eq!(&text[9..10], ":");
    }

    #[test]
    fn stat_lines_align_keys() {
        let lines = stat_lines(&status("")).unwrap();
        assert!(lines.contains(&"owner           : alice".to_string()), "{lines:?}");
        assert!(lines.contains(&"length          : 1234".to_string()));
        assert!(lines.contains(&"type            : FILE".to_string()));
    }
}

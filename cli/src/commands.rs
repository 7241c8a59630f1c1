//! One handler per subcommand. Handlers take the client explicitly and
//! write their output to `out`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use webhdfs_core::{AppendOptions, CreateOptions, ReadOptions, Transport, WebHdfsClient};

use crate::glob::{glob_to_regex, split_pattern};
use crate::output::{entry_name, stat_lines, stat_long, stat_short};

pub fn ls<T: Transport>(
    client: &WebHdfsClient<T>,
    path: &str,
    long: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let (dir, filter) = match split_pattern(path) {
        Some((dir, pattern)) => (dir, Some(glob_to_regex(pattern)?)),
        None => (path, None),
    };
    for stat in client.list_dir(dir)? {
        if let Some(filter) = &filter {
            if !filter.is_match(entry_name(&stat, dir)) {
                continue;
            }
        }
        let line = if long {
            stat_long(&stat, path)
        } else {
            stat_short(&stat, path)
        };
        writeln!(out, "{line}")?;
    }
    Ok(())
}

pub fn stat<T: Transport>(client: &WebHdfsClient<T>, path: &str, out: &mut dyn Write) -> Result<()> {
    if let Some(status) = client.stat(path)? {
        for line in stat_lines(&status)? {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

pub fn checksum<T: Transport>(
    client: &WebHdfsClient<T>,
    path: &str,
    out: &mut dyn Write,
) -> Result<()> {
    if let Some(checksum) = client.checksum(path)? {
        writeln!(out, "{}", checksum.bytes)?;
    }
    Ok(())
}

pub fn home<T: Transport>(client: &WebHdfsClient<T>, out: &mut dyn Write) -> Result<()> {
    if let Some(home) = client.home_dir()? {
        writeln!(out, "{home}")?;
    }
    Ok(())
}

pub fn chmod<T: Transport>(client: &WebHdfsClient<T>, mode: u32, path: &str) -> Result<()> {
    client.set_permission(path, mode)?;
    Ok(())
}

pub fn chown<T: Transport>(
    client: &WebHdfsClient<T>,
    path: &str,
    user: Option<&str>,
    group: Option<&str>,
) -> Result<()> {
    if user.is_none() && group.is_none() {
        bail!("need either user or group");
    }
    client.set_owner(path, user, group)?;
    Ok(())
}

/// Download `src` into `dest`. The local file is opened before the remote
/// read so a bad destination fails without touching the gateway, and is only
/// truncated once the read succeeded.
pub fn get<T: Transport>(
    client: &WebHdfsClient<T>,
    src: &str,
    dest: &Path,
    options: &ReadOptions,
    append: bool,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(false)
        .open(dest)
        .with_context(|| format!("cannot open {}", dest.display()))?;
    let data = client.read(src, options)?;
    if !append {
        file.set_len(0)
            .with_context(|| format!("cannot truncate {}", dest.display()))?;
    }
    file.write_all(&data)
        .with_context(|| format!("cannot write {}", dest.display()))?;
    Ok(())
}

pub fn put<T: Transport>(
    client: &WebHdfsClient<T>,
    src: &Path,
    dest: &str,
    options: &CreateOptions,
) -> Result<()> {
    if !src.is_file() {
        bail!("{} is not a file", src.display());
    }
    client.create_from_file(src, dest, options)?;
    Ok(())
}

pub fn append<T: Transport>(
    client: &WebHdfsClient<T>,
    src: &Path,
    dest: &str,
    options: &AppendOptions,
) -> Result<()> {
    if !src.is_file() {
        bail!("{} is not a file", src.display());
    }
    client.append_from_file(src, dest, options)?;
    Ok(())
}

pub fn mkdir<T: Transport>(client: &WebHdfsClient<T>, path: &str, mode: Option<u32>) -> Result<()> {
    if !client.mkdirs(path, mode)? {
        bail!("cannot create directory {path}");
    }
    Ok(())
}

pub fn mv<T: Transport>(client: &WebHdfsClient<T>, src: &str, dest: &str) -> Result<()> {
    if !client.rename(src, dest)? {
        bail!("cannot rename {src} to {dest}");
    }
    Ok(())
}

pub fn rm<T: Transport>(client: &WebHdfsClient<T>, path: &str, recursive: bool) -> Result<()> {
    if !client.delete(path, recursive)? {
        bail!("cannot remove {path}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use webhdfs_core::{
        BoxError, Credentials, Endpoint, HttpRequest, HttpResponse, WebHdfsClient,
    };

    use super::*;

    #[derive(Default)]
    struct Canned {
        replies: Mutex<VecDeque<HttpResponse>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn reply(self, status: u16, body: &str) -> Self {
            self.replies.lock().unwrap().push_back(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.as_bytes().to_vec(),
            });
            self
        }

        fn redirect(self, location: &str) -> Self {
            self.replies.lock().unwrap().push_back(HttpResponse {
                status: 307,
                headers: vec![("Location".to_string(), location.to_string())],
                body: Vec::new(),
            });
            self
        }

        fn urls(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect()
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, BoxError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| "no reply queued".into())
        }
    }

    fn client(transport: &Canned) -> WebHdfsClient<&Canned> {
        WebHdfsClient::with_transport(
            Endpoint::new("gw", 50070),
            Credentials::default(),
            transport,
        )
    }

    const LISTING: &str = r#"{"FileStatuses":{"FileStatus":[
        {"pathSuffix":"a.csv","type":"FILE","length":3,"owner":"o","group":"g","permission":"644","modificationTime":0},
        {"pathSuffix":"b.txt","type":"FILE","length":4,"owner":"o","group":"g","permission":"644","modificationTime":0},
        {"pathSuffix":"c.csv","type":"FILE","length":5,"owner":"o","group":"g","permission":"644","modificationTime":0}
    ]}}"#;

    #[test]
    fn ls_filters_by_wildcard_on_parent_listing() {
        let transport = Canned::default().reply(200, LISTING);
        let mut out = Vec::new();
        ls(&client(&transport), "/data/*.csv", false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a.csv\nc.csv\n");
        assert_eq!(
            transport.urls(),
            vec!["http://gw:50070/webhdfs/v1/data?op=LISTSTATUS"]
        );
    }

    #[test]
    fn ls_plain_path_lists_everything() {
        let transport = Canned::default().reply(200, LISTING);
        let mut out = Vec::new();
        ls(&client(&transport), "/data", false, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 3);
    }

    #[test]
    fn chown_needs_user_or_group() {
        let transport = Canned::default();
        let err = chown(&client(&transport), "/f", None, None).unwrap_err();
        assert_eq!(err.to_string(), "need either user or group");
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn rm_reports_false_as_failure() {
        let transport = Canned::default().reply(200, r#"{"boolean":false}"#);
        let err = rm(&client(&transport), "/nope", false).unwrap_err();
        assert_eq!(err.to_string(), "cannot remove /nope");
    }

    #[test]
    fn put_rejects_missing_source_before_any_request() {
        let transport = Canned::default();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let err = put(&client(&transport), &missing, "/x", &CreateOptions::default()).unwrap_err();
        assert!(err.to_string().ends_with("is not a file"), "{err}");
        assert!(transport.urls().is_empty());
    }

    #[test]
    fn empty_record_bodies_print_nothing() {
        let transport = Canned::default().reply(200, "").reply(200, "");
        let mut out = Vec::new();
        stat(&client(&transport), "/f", &mut out).unwrap();
        home(&client(&transport), &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn failed_get_keeps_existing_destination() {
        let transport = Canned::default().reply(
            404,
            r#"{"RemoteException":{"message":"File does not exist: /f"}}"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        std::fs::write(&dest, "keep me").unwrap();
        get(&client(&transport), "/f", &dest, &ReadOptions::default(), false).unwrap_err();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "keep me");
    }

    #[test]
    fn get_replaces_destination_after_successful_read() {
        let transport = Canned::default()
            .redirect("http://dn-1:50075/webhdfs/v1/f?op=OPEN")
            .reply(200, "new");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");
        std::fs::write(&dest, "older and longer").unwrap();
        get(&client(&transport), "/f", &dest, &ReadOptions::default(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new");
    }

    #[test]
    fn get_fails_on_unwritable_destination_before_reading() {
        let transport = Canned::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no/such/dir/out");
        let err = get(&client(&transport), "/f", &dest, &ReadOptions::default(), false)
            .unwrap_err();
        assert!(err.to_string().starts_with("cannot open"), "{err}");
        assert!(transport.urls().is_empty());
    }
}

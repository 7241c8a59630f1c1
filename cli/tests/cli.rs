use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::str::{contains, is_match};
use serde_json::json;

fn webhdfs(server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("webhdfs").expect("webhdfs binary");
    cmd.env_clear()
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg(server.port().to_string())
        .arg("--user")
        .arg("alice");
    cmd
}

fn file_status(suffix: &str, length: u64) -> serde_json::Value {
    json!({
        "pathSuffix": suffix,
        "type": "FILE",
        "length": length,
        "owner": "alice",
        "group": "analysts",
        "permission": "640",
        "modificationTime": 1_700_000_000_000i64,
        "replication": 3,
    })
}

#[test]
fn ls_long_and_glob() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/webhdfs/v1/data")
            .query_param("op", "LISTSTATUS")
            .query_param("user.name", "alice");
        then.status(200).json_body(json!({
            "FileStatuses": {"FileStatus": [
                file_status("a.csv", 12),
                file_status("notes.txt", 7),
            ]}
        }));
    });

    webhdfs(&server)
        .args(["ls", "-l", "/data"])
        .assert()
        .success()
        .stdout(is_match(r"(?m)^640 +12 alice +analysts .* a\.csv$").unwrap())
        .stdout(contains("notes.txt"));

    webhdfs(&server)
        .args(["ls", "/data/*.csv"])
        .assert()
        .success()
        .stdout("a.csv\n");

    list.assert_hits(2);
}

#[test]
fn get_follows_redirect_through_configured_host() {
    let coordinator = MockServer::start();
    let worker = MockServer::start();
    let location = format!(
        "http://dn-17.cluster.internal:{}/webhdfs/v1/logs/app.log?op=OPEN&offset=4&namenoderpcaddress=nn:8020",
        worker.port()
    );
    let redirect = coordinator.mock(|when, then| {
        when.method(GET)
            .path("/webhdfs/v1/logs/app.log")
            .query_param("op", "OPEN")
            .query_param("offset", "4");
        then.status(307).header("Location", location.as_str());
    });
    let data = worker.mock(|when, then| {
        when.method(GET)
            .path("/webhdfs/v1/logs/app.log")
            .query_param("namenoderpcaddress", "nn:8020");
        then.status(200).body("line two\n");
    });

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("app.log");
    webhdfs(&coordinator)
        .args(["get", "/logs/app.log"])
        .arg(&dest)
        .args(["-o", "4"])
        .assert()
        .success();

    redirect.assert();
    data.assert();
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "line two\n");
}

#[test]
fn put_sends_payload_to_worker() {
    let coordinator = MockServer::start();
    let worker = MockServer::start();
    let location = format!(
        "http://dn-3:{}/webhdfs/v1/in/r.csv?op=CREATE&overwrite=true",
        worker.port()
    );
    let redirect = coordinator.mock(|when, then| {
        when.method(PUT)
            .path("/webhdfs/v1/in/r.csv")
            .query_param("op", "CREATE")
            .query_param("overwrite", "true")
            .query_param("permission", "600");
        then.status(307).header("Location", location.as_str());
    });
    let upload = worker.mock(|when, then| {
        when.method(PUT).path("/webhdfs/v1/in/r.csv").body("a,b\n");
        then.status(201);
    });

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("r.csv");
    std::fs::write(&src, "a,b\n").unwrap();
    webhdfs(&coordinator)
        .arg("put")
        .arg(&src)
        .args(["/in/r.csv", "-o", "-m", "600"])
        .assert()
        .success();

    redirect.assert();
    upload.assert();
}

#[test]
fn stat_prints_aligned_fields() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/webhdfs/v1/a.csv")
            .query_param("op", "GETFILESTATUS");
        then.status(200).json_body(json!({ "FileStatus": file_status("", 12) }));
    });

    webhdfs(&server)
        .args(["stat", "/a.csv"])
        .assert()
        .success()
        .stdout(contains("modificationTime: 1700000000000"))
        .stdout(contains("owner           : alice"))
        .stdout(contains("type            : FILE"));
}

#[test]
fn remote_exception_becomes_error_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/webhdfs/v1/missing");
        then.status(404).json_body(json!({
            "RemoteException": {
                "exception": "FileNotFoundException",
                "javaClassName": "java.io.FileNotFoundException",
                "message": "File does not exist: /missing"
            }
        }));
    });

    webhdfs(&server)
        .args(["stat", "/missing"])
        .assert()
        .failure()
        .code(1)
        .stderr(contains("error: "))
        .stderr(contains("HTTP 404"))
        .stderr(contains("File does not exist: /missing"));
}

#[test]
fn chown_without_user_or_group_fails_locally() {
    let server = MockServer::start();

    webhdfs(&server)
        .args(["chown", "/f"])
        .assert()
        .failure()
        .stderr("error: need either user or group\n");
}

#[test]
fn unreachable_gateway_is_reported() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    Command::cargo_bin("webhdfs")
        .unwrap()
        .env_clear()
        .args(["--host", "127.0.0.1", "--port", &port.to_string(), "home"])
        .assert()
        .failure()
        .stderr(contains("error: cannot connect - "));
}

#[test]
fn environment_supplies_defaults_and_flags_win() {
    let server = MockServer::start();
    let home = server.mock(|when, then| {
        when.method(GET)
            .path("/webhdfs/v1/")
            .query_param("op", "GETHOMEDIRECTORY")
            .query_param("user.name", "bob");
        then.status(200).json_body(json!({ "Path": "/user/bob" }));
    });

    Command::cargo_bin("webhdfs")
        .unwrap()
        .env_clear()
        .env("WEBHDFS_HOST", "127.0.0.1")
        .env("WEBHDFS_PORT", server.port().to_string())
        .env("WEBHDFS_USER", "bob")
        .arg("home")
        .assert()
        .success()
        .stdout("/user/bob\n");

    Command::cargo_bin("webhdfs")
        .unwrap()
        .env_clear()
        .env("WEBHDFS_HOST", "127.0.0.1")
        .env("WEBHDFS_PORT", "1")
        .env("WEBHDFS_USER", "bob")
        .args(["--port", &server.port().to_string(), "home"])
        .assert()
        .success();

    home.assert_hits(2);
}

#[test]
fn core_diagnostics_only_appear_when_requested() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/webhdfs/v1/").query_param("op", "GETHOMEDIRECTORY");
        then.status(200).json_body(json!({ "Path": "/user/alice" }));
    });

    webhdfs(&server)
        .arg("home")
        .assert()
        .success()
        .stdout("/user/alice\n")
        .stderr("");

    webhdfs(&server)
        .args(["--log-level", "debug", "home"])
        .assert()
        .success()
        .stdout("/user/alice\n")
        .stderr(contains("dispatching"));
}

#[test]
fn version_flag() {
    Command::cargo_bin("webhdfs")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

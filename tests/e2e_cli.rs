//! CLI end-to-end tests
//!
//! Tests for the hordebrowse command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Get a command for the hordebrowse binary
#[allow(deprecated)]
fn hordebrowse_cmd() -> Command {
    Command::cargo_bin("hordebrowse").unwrap()
}

/// Write a config pointing all paths inside `dir`.
fn write_config(dir: &Path, extra: &str) -> std::path::PathBuf {
    let config_path = dir.join("hordebrowse.toml");
    let content = format!(
        r#"
[bithorde]
socket = "{socket}"
fusedir = "{fusedir}"
connect_timeout_secs = 1
{extra}

[database]
path = "{db}"
"#,
        socket = dir.join("bithorde.sock").display(),
        fusedir = dir.display(),
        db = dir.join("db/metadata.db").display(),
    );
    fs::write(&config_path, content).unwrap();
    config_path
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = hordebrowse_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hordebrowse"))
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("[PATH]"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = hordebrowse_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hordebrowse"));
}

#[test]
fn test_cli_rejects_second_path() {
    let mut cmd = hordebrowse_cmd();
    cmd.args(["films", "shows"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_rejects_unknown_flag() {
    let mut cmd = hordebrowse_cmd();
    cmd.arg("--verbose")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_missing_daemon_is_fatal() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), "");

    let mut cmd = hordebrowse_cmd();
    cmd.env("HORDEBROWSE_CONFIG", &config_path)
        .write_stdin("quit\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bithorde"));

    // The database is created before the resolver is started.
    assert!(dir.path().join("db/metadata.db").exists());
}

#[test]
fn test_invalid_config_is_fatal() {
    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), "pressure = 0");

    let mut cmd = hordebrowse_cmd();
    cmd.env("HORDEBROWSE_CONFIG", &config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("pressure"));
}

#[test]
fn test_browse_session_against_fake_daemon() {
    use chrono::Utc;
    use hordebrowse_db::{Record, SqliteStore};
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;

    let dir = tempdir().unwrap();
    let config_path = write_config(dir.path(), "pressure = 2");

    fs::create_dir_all(dir.path().join("db")).unwrap();
    let store = SqliteStore::open(&dir.path().join("db/metadata.db").to_string_lossy()).unwrap();
    store
        .insert_record(
            &Record::new("tree:tiger:AAAA", Utc::now())
                .with_attr("title", "Heat")
                .with_attr("genre", "crime"),
        )
        .unwrap();
    drop(store);

    // Answers every lookup with success until the client hangs up.
    let listener = UnixListener::bind(dir.path().join("bithorde.sock")).unwrap();
    let daemon = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            let request: serde_json::Value = serde_json::from_str(&line).unwrap();
            let response = serde_json::json!({"id": request["id"], "status": "success"});
            if writeln!(writer, "{response}").is_err() {
                break;
            }
        }
    });

    let mut cmd = hordebrowse_cmd();
    cmd.env("HORDEBROWSE_CONFIG", &config_path)
        .write_stdin("rules\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("-- query 1 --"))
        .stdout(predicate::str::contains("0: -"))
        .stdout(predicate::str::contains("keys: genre(1) title(1)"));

    daemon.join().unwrap();
}

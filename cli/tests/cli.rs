#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Binary-level checks for `catalog`.

use std::net::TcpListener;
use std::process::Child;
use std::process::Stdio;
use std::time::Duration;
use std::time::Instant;

use anyhow::Result;
use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use tempfile::TempDir;

fn catalog() -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("catalog")?;
    cmd.env_remove("CATALOG_BASE_URL");
    Ok(cmd)
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

struct ServerProcess {
    child: Child,
    base_url: String,
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_server(tmp: &TempDir) -> ServerProcess {
    let port = free_port();
    let data = tmp.path().join("items.json");
    let child = std::process::Command::cargo_bin("catalog")
        .unwrap()
        .args(["serve", "--init", "--workers", "2"])
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--data")
        .arg(&data)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while std::net::TcpStream::connect(("127.0.0.1", port)).is_err() {
        assert!(Instant::now() < deadline, "server did not start");
        std::thread::sleep(Duration::from_millis(50));
    }
    ServerProcess {
        child,
        base_url: format!("http://127.0.0.1:{port}"),
    }
}

#[test]
fn help_lists_subcommands() -> Result<()> {
    catalog()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("items"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("browse"));
    Ok(())
}

#[test]
fn unreachable_server_fails() -> Result<()> {
    let port = free_port();
    catalog()?
        .args(["--base-url", &format!("http://127.0.0.1:{port}")])
        .args(["items", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("network error"));
    Ok(())
}

#[test]
fn malformed_field_is_a_usage_error() -> Result<()> {
    catalog()?
        .args(["items", "add", "--name", "Delta", "--field", "oops"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("KEY=VALUE"));
    Ok(())
}

#[test]
fn serve_logs_go_to_stderr() -> Result<()> {
    catalog()?
        .env_remove("RUST_LOG")
        .args(["serve", "--workers", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("starting"));
    Ok(())
}

#[test]
fn serve_then_query_and_add() -> Result<()> {
    let tmp = TempDir::new()?;
    let server = spawn_server(&tmp);

    catalog()?
        .args(["--base-url", &server.base_url])
        .args(["items", "list", "--q", "laptop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Laptop Pro"))
        .stdout(predicate::str::contains("Showing 1 item(s)"));

    catalog()?
        .args(["--base-url", &server.base_url])
        .args(["items", "add", "--name", "Delta", "--category", "misc"])
        .args(["--field", "price=12"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created item"));

    catalog()?
        .args(["--base-url", &server.base_url])
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"misc\": 1"));

    catalog()?
        .args(["--base-url", &server.base_url])
        .args(["items", "get", "999999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch item (404)"));

    assert!(tmp.path().join("items.json").exists());
    Ok(())
}

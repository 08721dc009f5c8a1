//! Smoke tests to verify command wiring

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn realty() -> Command {
    let mut cmd = Command::cargo_bin("realty").unwrap();
    // Keep the host's store settings out of the tests
    for var in [
        "REALTY_BACKEND",
        "REALTY_CONFIG",
        "REALTY_TABLE",
        "SUPABASE_URL",
        "SUPABASE_KEY",
        "DATABASE_URL",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_top_level_help() {
    realty()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_serve_help() {
    realty()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"))
        .stdout(predicate::str::contains("--seed"));
}

#[test]
fn test_check_help() {
    realty()
        .args(["check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--supabase-url"));
}

#[test]
fn test_unknown_backend_rejected() {
    realty()
        .args(["check", "--backend", "sqlite"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_check_memory_backend_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::File::create(&config)
        .unwrap()
        .write_all(b"[store]\nbackend = \"memory\"\n")
        .unwrap();

    realty()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 listing(s) in 'properties'"));
}

#[test]
fn test_check_without_credentials_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    realty()
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .arg("--config")
        .arg(&config)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SUPABASE_URL not set"));
}

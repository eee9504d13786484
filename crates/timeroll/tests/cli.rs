use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn timeroll(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("timeroll").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("TIMEROLL_PATTERN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn render_default_daily_pattern() {
    let dir = TempDir::new().unwrap();
    timeroll(&dir)
        .args(["render", "--pattern", "foo.%d", "--utc", "--at", "2004-11-23T23:59:59Z"])
        .assert()
        .success()
        .stdout("foo.2004-11-23\n");
}

#[test]
fn render_converts_offset_to_utc() {
    let dir = TempDir::new().unwrap();
    timeroll(&dir)
        .args([
            "render",
            "--pattern",
            "app.%d{yyyy-MM-dd-HH}.log.gz",
            "--utc",
            "--at",
            "2004-11-24T01:30:00+02:00",
        ])
        .assert()
        .success()
        .stdout("app.2004-11-23-23.log.gz\n");
}

#[test]
fn render_json_reports_base_name() {
    let dir = TempDir::new().unwrap();
    timeroll(&dir)
        .args([
            "--json",
            "render",
            "--pattern",
            "foo.%d.zip",
            "--utc",
            "--at",
            "2004-11-23T12:00:00Z",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"base\": \"foo.2004-11-23\""))
        .stdout(predicate::str::contains("\"compression\": \"zip\""));
}

#[test]
fn render_rejects_bad_instant() {
    let dir = TempDir::new().unwrap();
    timeroll(&dir)
        .args(["render", "--pattern", "foo.%d", "--at", "yesterday"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid RFC 3339 instant"));
}

#[test]
fn check_rejects_pattern_without_date() {
    let dir = TempDir::new().unwrap();
    timeroll(&dir)
        .args(["check", "--pattern", "foo.log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "does not contain a valid date format specifier",
        ));
}

#[test]
fn check_requires_pattern() {
    let dir = TempDir::new().unwrap();
    timeroll(&dir)
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("FileNamePattern option must be set"));
}

#[test]
fn check_reads_config_from_current_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("timeroll.yaml"),
        "file_name_pattern: logs/app.log.%d.gz\nactive_file_name: logs/app.log\ntime_zone: utc\n",
    )
    .unwrap();

    timeroll(&dir)
        .args(["--json", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"compression\": \"gzip\""))
        .stdout(predicate::str::contains("\"active_file\": \"logs/app.log\""))
        .stdout(predicate::str::contains("\"decoupled\": true"));
}

#[test]
fn run_copies_stdin_into_active_file() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("out.%d{yyyy}.log");

    timeroll(&dir)
        .args(["run", "--raw", "--utc", "--pattern"])
        .arg(&pattern)
        .write_stdin("first\nsecond\n")
        .assert()
        .success();

    let written: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map(|e| e == "log").unwrap_or(false))
        .collect();
    assert_eq!(written.len(), 1);
    assert_eq!(fs::read_to_string(&written[0]).unwrap(), "first\nsecond\n");
}

#[test]
fn run_with_fixed_active_file_timestamps_lines() {
    let dir = TempDir::new().unwrap();
    let active = dir.path().join("app.log");

    timeroll(&dir)
        .args(["run", "--utc", "--pattern", "app.log.%d", "--active"])
        .arg(&active)
        .write_stdin("hello\n")
        .assert()
        .success();

    let content = fs::read_to_string(&active).unwrap();
    assert!(content.starts_with('['));
    assert!(content.ends_with("] hello\n"));
}

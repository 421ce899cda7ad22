//! CLI integration tests: write a payload to a temp file and run the binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn payload(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(json.as_bytes()).expect("write payload");
    file
}

fn claimgate() -> Command {
    let mut cmd = Command::cargo_bin("claimgate").expect("binary");
    cmd.env_remove("CLAIMGATE_CHECKPOINTS")
        .env_remove("CLAIMGATE_LOG")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_prints_name() {
    claimgate()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("claimgate_cli "));
}

#[test]
fn inspect_prints_projections() {
    let file = payload(r#"{"sub": "jsmith", "aud": ["app"], "roles": "admin editor"}"#);
    let output = claimgate()
        .arg("inspect")
        .arg(file.path())
        .output()
        .expect("run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["full"]["aud"], "app");
    assert_eq!(report["reduced"]["aud"], serde_json::json!(["app"]));
    assert_eq!(report["roles"], serde_json::json!(["admin", "editor"]));
    assert_eq!(report["valid"], true);
    assert!(report.get("checkpoints").is_none());
}

#[test]
fn inspect_attaches_checkpoints_and_links() {
    let file = payload(r#"{"sub": "jsmith"}"#);
    let output = claimgate()
        .args(["inspect", "--checkpoint", "require mfa", "--link", "/a", "--link", "/a"])
        .arg(file.path())
        .output()
        .expect("run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["checkpoints"][0]["type"], "mfa");
    assert_eq!(report["frontend_links"], serde_json::json!(["/a"]));
    assert_eq!(report["roles"], serde_json::json!(["anonymous", "guest"]));
}

#[test]
fn inspect_reads_checkpoints_from_env() {
    let file = payload(r#"{"sub": "jsmith"}"#);
    let output = claimgate()
        .env("CLAIMGATE_CHECKPOINTS", "require mfa;require mfa")
        .arg("inspect")
        .arg(file.path())
        .output()
        .expect("run");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["checkpoints"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["checkpoints"][1]["id"], 1);
}

#[test]
fn inspect_yaml_output() {
    let file = payload(r#"{"sub": "jsmith"}"#);
    claimgate()
        .args(["inspect", "--format", "yaml"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("sub: jsmith"));
}

#[test]
fn inspect_reads_stdin() {
    claimgate()
        .args(["inspect", "-"])
        .write_stdin(r#"{"sub": "from-stdin"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("from-stdin"));
}

#[test]
fn inspect_rejects_invalid_claim() {
    let file = payload(r#"{"sub": 42}"#);
    claimgate()
        .arg("inspect")
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid sub claim type"));
}

#[test]
fn inspect_rejects_empty_payload() {
    let file = payload("{}");
    claimgate()
        .arg("inspect")
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid user data type"));
}

#[test]
fn check_expiry_fails_on_expired_claims() {
    let file = payload(r#"{"sub": "jsmith", "exp": 1}"#);
    claimgate()
        .args(["inspect", "--check-expiry"])
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("token expired"));
}

#[test]
fn claim_joins_lists() {
    let file = payload(r#"{"roles": ["admin", "editor"], "scope": "read write"}"#);
    claimgate()
        .arg("claim")
        .arg(file.path())
        .arg("roles")
        .assert()
        .success()
        .stdout("admin editor\n");
    claimgate()
        .arg("claim")
        .arg(file.path())
        .arg("scopes")
        .assert()
        .success()
        .stdout("read write\n");
}

#[test]
fn has_role_exit_codes() {
    let file = payload(r#"{"roles": ["admin", "editor"]}"#);
    claimgate()
        .arg("has-role")
        .arg(file.path())
        .args(["viewer", "admin"])
        .assert()
        .success();
    claimgate()
        .arg("has-role")
        .arg(file.path())
        .args(["--all", "viewer", "admin"])
        .assert()
        .code(1);
}

#[test]
fn checkpoints_command() {
    claimgate()
        .args(["checkpoints", "require mfa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Multi-factor authentication"));
    claimgate()
        .args(["checkpoints", "require otp"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported require keyword: otp"));
}

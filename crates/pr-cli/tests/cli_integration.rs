//! CLI integration tests
//!
//! Tests the pr CLI using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

fn pr() -> Command {
    Command::cargo_bin("pr")
        .expect("Failed to locate pr binary - ensure it's built before running tests")
}

/// A pr command isolated from the user's kubeconfig and configuration
fn isolated(dir: &tempfile::TempDir) -> Command {
    let mut cmd = pr();
    cmd.env("KUBECONFIG", dir.path().join("missing-kubeconfig"))
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("KUBERNETES_SERVICE_HOST")
        .env_remove("KUBERNETES_SERVICE_PORT")
        .env_remove("POLICY_REPORTER_SERVICE")
        .env_remove("POLICY_REPORTER_NAMESPACE")
        .env_remove("POLICY_REPORTER_PORT");
    cmd
}

#[test]
fn test_cli_help() {
    pr().arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pr"))
        .stdout(predicate::str::contains("Policy Reporter REST API"));
}

#[test]
fn test_cli_version_flag() {
    pr().arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command() {
    let dir = tempfile::tempdir().unwrap();
    isolated(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Client Version: {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_results_list_help() {
    pr().args(["results", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--all-namespaces"))
        .stdout(predicate::str::contains("--group-by"))
        .stdout(predicate::str::contains("--selector"));
}

#[test]
fn test_aliases() {
    pr().args(["tar", "--help"]).assert().success();
    pr().args(["res", "search", "--help"]).assert().success();
    pr().args(["cres", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--all-namespaces").not());
}

#[test]
fn test_invalid_output_format() {
    pr().args(["targets", "-o", "jsonpath"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown output format"));
}

#[test]
fn test_invalid_group_by() {
    pr().args(["results", "list", "--group-by", "severity"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown grouping"));
}

#[test]
fn test_namespace_conflicts_with_all_namespaces() {
    pr().args(["results", "list", "-n", "default", "-A"])
        .assert()
        .failure();
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    isolated(&dir)
        .args(["--config"])
        .arg(dir.path().join("nope.toml"))
        .arg("targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[policyreporter]\nport = \"not a port\"\n").unwrap();

    isolated(&dir)
        .arg("--config")
        .arg(&path)
        .arg("targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_without_cluster_fails() {
    let dir = tempfile::tempdir().unwrap();
    isolated(&dir)
        .arg("targets")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load Kubernetes configuration"));
}

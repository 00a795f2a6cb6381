//! Integration tests for the command-line surface.
//!
//! These run the compiled binary as a subprocess to check argument parsing,
//! config handling and the exit status end-to-end.

use std::process::Command;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dmsweep_bin() -> &'static str {
    env!("CARGO_BIN_EXE_dmsweep")
}

/// A command with every `DMSWEEP_*` variable cleared.
fn clean_command() -> Command {
    let mut cmd = Command::new(dmsweep_bin());
    for (key, _) in std::env::vars() {
        if key.starts_with("DMSWEEP_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

#[test]
fn log_format_json_with_help_exits_zero() {
    // --help exits 0 only if --log-format json parsed.
    let output = clean_command()
        .args(["--log-format", "json", "--help"])
        .output()
        .expect("failed to run dmsweep");

    assert!(
        output.status.success(),
        "expected exit 0, got {:?}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("--log-format"),
        "help text should mention --log-format:\n{stdout}"
    );
}

#[test]
fn help_mentions_pacing_flags_and_env() {
    let output = clean_command()
        .args(["--help"])
        .output()
        .expect("failed to run dmsweep");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for needle in [
        "--search-delay-ms",
        "--delete-delay-ms",
        "--max-attempts",
        "DMSWEEP_TOKEN",
    ] {
        assert!(stdout.contains(needle), "help text should mention {needle}:\n{stdout}");
    }
}

#[test]
fn invalid_log_format_fails() {
    let output = clean_command()
        .args(["--log-format", "xml"])
        .output()
        .expect("failed to run dmsweep");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_token_fails() {
    let output = clean_command()
        .args(["--user-id", "1", "--channel-id", "2"])
        .output()
        .expect("failed to run dmsweep");

    assert!(
        !output.status.success(),
        "expected non-zero exit when --token is missing"
    );
}

#[test]
fn zero_max_attempts_is_rejected() {
    let output = clean_command()
        .args([
            "--user-id",
            "1",
            "--token",
            "t",
            "--channel-id",
            "2",
            "--max-attempts",
            "0",
            "--api-url",
            "http://127.0.0.1:9",
        ])
        .output()
        .expect("failed to run dmsweep");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("max_attempts"), "stderr: {stderr}");
}

#[tokio::test]
async fn identity_mismatch_prints_failure_and_exits_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/@me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "other"})))
        .mount(&server)
        .await;
    Mock::given(path_regex("^/channels/.*"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let output = tokio::process::Command::new(dmsweep_bin())
        .env_remove("DMSWEEP_CONFIG")
        .args([
            "--user-id",
            "me",
            "--token",
            "t",
            "--channel-id",
            "55",
            "--api-url",
            &server.uri(),
        ])
        .output()
        .await
        .expect("failed to run dmsweep");

    assert_eq!(output.status.code(), Some(1));
    let result: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be the JSON result");
    assert_eq!(result["success"], false);
    assert_eq!(result["deleted_count"], 0);
    assert_eq!(result["failed_count"], 0);
}

//! CLI contract tests.

use std::fs;

use assert_cmd::Command;

fn bridge() -> Command {
    match Command::cargo_bin("spaces-bridge") {
        Ok(cmd) => cmd,
        Err(err) => panic!("binary should build: {err}"),
    }
}

#[test]
fn avatar_prints_gravatar_url() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config = tmp.path().join("config.toml");
    fs::write(&config, "").expect("should write config");

    let output = bridge()
        .arg("--config")
        .arg(&config)
        .args(["avatar", "test@example.com"])
        .output()
        .expect("should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "https://secure.gravatar.com/avatar/55502f40dc8b7c769880b10874abc9d0?size=200&d=retro"
    );
}

#[test]
fn translate_emits_update_messages_command() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config = tmp.path().join("config.toml");
    fs::write(&config, "").expect("should write config");
    let payload = tmp.path().join("batch.json");
    fs::write(
        &payload,
        r#"{"name": "rust", "messages": [
            {"type": "message", "content": "a", "timestamp": "2021-01-01T00:00:00.000Z", "sender": "ada@example.com"},
            {"type": "info_message", "content": "b", "timestamp": "2021-01-01T00:00:00.500Z", "sender": "ada@example.com"}
        ]}"#,
    )
    .expect("should write payload");

    let output = bridge()
        .arg("--config")
        .arg(&config)
        .arg("translate")
        .arg(&payload)
        .output()
        .expect("should run");
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["command"], "chat.updateMessages");
    assert_eq!(json["args"]["channelId"], "rust");
    assert_eq!(json["args"]["provider"], "vslsSpaces");
    let messages = json["args"]["messages"]
        .as_object()
        .expect("messages should be an object");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages["1609459200"]["text"], "_b_");
}

#[test]
fn check_config_rejects_missing_explicit_file() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let missing = tmp.path().join("nope.toml");

    let output = bridge()
        .arg("--config")
        .arg(&missing)
        .arg("check-config")
        .output()
        .expect("should run");
    assert!(!output.status.success());
}

#[test]
fn check_config_prints_summary() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let config = tmp.path().join("config.toml");
    fs::write(&config, "[activation]\nstrategy = \"backoff\"\n").expect("should write config");

    let output = bridge()
        .arg("--config")
        .arg(&config)
        .arg("check-config")
        .output()
        .expect("should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("extension: vsls-contrib.spaces"));
    assert!(stdout.contains("Backoff, 4 wait(s)"));
}

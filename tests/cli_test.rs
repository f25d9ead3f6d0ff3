//! devin 二进制测试：每个用例使用独立的 DEVIN_CONFIG_DIR，HTTP 交给 wiremock

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn devin(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("devin").unwrap();
    cmd.env("DEVIN_CONFIG_DIR", config_dir.path())
        .env_remove("DEVIN_API_TOKEN")
        .env_remove("DEVIN_BASE_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn stored_config(config_dir: &TempDir) -> Value {
    let text = std::fs::read_to_string(config_dir.path().join("config.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_help_shows_about_text() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Unofficial CLI for Devin AI"))
        .stdout(predicate::str::contains("chain"));
}

#[test]
fn test_configure_rejects_bad_token() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["configure", "--token", "sk-nope", "--base-url", "http://x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid token format"));
    assert_eq!(stored_config(&dir), json!({}));
}

#[test]
fn test_configure_saves_token_and_base_url() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["configure", "--token", "apk_user_abc", "--base-url", "http://localhost:1/v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("saved to"));
    assert_eq!(
        stored_config(&dir),
        json!({"api_token": "apk_user_abc", "base_url": "http://localhost:1/v1"})
    );
}

#[test]
fn test_configure_prompts_for_missing_values() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("configure")
        .write_stdin("apk_from_prompt\n\n")
        .assert()
        .success();
    assert_eq!(
        stored_config(&dir),
        json!({"api_token": "apk_from_prompt", "base_url": "https://api.devin.ai/v1"})
    );
}

#[test]
fn test_use_session_then_history() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No current local session."));
    devin(&dir)
        .args(["use-session", "devin-42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to session devin-42"));
    devin(&dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current local session: devin-42"));
}

#[test]
fn test_no_active_session() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("status")
        .env("DEVIN_API_TOKEN", "apk_x")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No active session"));
}

#[test]
fn test_missing_token_message() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["get-session", "devin-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("API token not found"));
}

#[test]
fn test_create_session_requires_prompt() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("create-session")
        .env("DEVIN_API_TOKEN", "apk_x")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Must provide prompt argument or --file option"));
}

#[test]
fn test_chain_requires_file_or_playbooks() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["chain", "Only a prompt"])
        .env("DEVIN_API_TOKEN", "apk_x")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Must provide --file OR (prompt and --playbooks)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthorized_prints_tip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/devin-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["get-session", "devin-1"])
        .env("DEVIN_API_TOKEN", "apk_expired")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid or expired API token (401)"))
        .stderr(predicate::str::contains("Tip: Check your API token with 'devin configure'."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_session_records_current_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(body_json(json!({
            "prompt": "Add tests",
            "idempotent": false,
            "unlisted": false,
            "session_secrets": [{"key": "TOKEN", "value": "a=b"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "devin-new",
            "url": "https://app.devin.ai/sessions/devin-new"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["create-session", "Add tests", "-s", "TOKEN=a=b", "-s", "garbage"])
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("devin-new"))
        .stderr(predicate::str::contains("Invalid secret format 'garbage'"));
    assert_eq!(stored_config(&dir)["current_session_id"], "devin-new");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_until_finished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/devin-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "devin-7",
            "status_enum": "finished",
            "structured_output": {"pr_url": "https://github.com/o/r/pull/1"}
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["watch", "devin-7"])
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("pr_url"))
        .stdout(predicate::str::contains("Session finished!"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chain_runs_single_step() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(body_json(json!({
            "prompt": "Kick off",
            "idempotent": false,
            "unlisted": false,
            "playbook_id": "pb-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "devin-chain",
            "url": "https://app.devin.ai/sessions/devin-chain"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sessions/devin-chain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "devin-chain",
            "status_enum": "blocked"
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["chain", "Kick off", "--playbooks", "pb-1"])
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/1: Playbook=pb-1"))
        .stdout(predicate::str::contains("Step 1 finished (status: blocked)."))
        .stdout(predicate::str::contains("Chain completed!"));
    assert_eq!(stored_config(&dir)["current_session_id"], "devin-chain");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_playbooks_falls_back_to_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playbooks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "unexpected"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("list-playbooks")
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"detail\": \"unexpected\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_sessions_json_keeps_server_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessions": [{
                "session_id": "devin-1",
                "status_enum": "working",
                "snapshot_id": "snap-9",
                "playbook_id": "pb-1",
                "requesting_user_email": "dev@example.com"
            }]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let assert = devin(&dir)
        .args(["list-sessions", "--json"])
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success();
    let printed: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(
        printed,
        json!([{
            "session_id": "devin-1",
            "status_enum": "working",
            "snapshot_id": "snap-9",
            "playbook_id": "pb-1",
            "requesting_user_email": "dev@example.com"
        }])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_sessions_and_knowledge_fall_back_to_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"session_id": "devin-arr"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/knowledge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "moved"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .arg("list-sessions")
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"session_id\": \"devin-arr\""));
    devin(&dir)
        .arg("list-knowledge")
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"detail\": \"moved\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_tolerates_odd_display_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions/devin-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "devin-8",
            "status_enum": "blocked",
            "title": 7,
            "tags": "single",
            "messages": {"unexpected": true}
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["watch", "devin-8"])
        .env("DEVIN_API_TOKEN", "apk_x")
        .env("DEVIN_BASE_URL", server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("Session blocked!"));
}

#[test]
fn test_local_commands_ignore_broken_poll_settings() {
    let dir = TempDir::new().unwrap();
    devin(&dir)
        .args(["configure", "--token", "apk_fixed", "--base-url", "http://localhost:1/v1"])
        .env("DEVIN_POLL__CHAIN_CEILING_SECS", "abc")
        .assert()
        .success();
    assert_eq!(stored_config(&dir)["api_token"], "apk_fixed");
    devin(&dir)
        .arg("history")
        .env("DEVIN_POLL__CHAIN_CEILING_SECS", "abc")
        .assert()
        .success();

    // 需要生效配置的命令仍然报告错误
    devin(&dir)
        .args(["get-session", "devin-1"])
        .env("DEVIN_POLL__CHAIN_CEILING_SECS", "abc")
        .assert()
        .code(1);
}

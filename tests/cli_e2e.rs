//! End-to-end CLI tests for the sharefetch binary.

#![allow(deprecated)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn sharefetch(cache_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sharefetch").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .arg("--cache-dir")
        .arg(cache_dir);
    cmd
}

fn seed_cache(cache_dir: &Path) {
    fs::create_dir_all(cache_dir).unwrap();
    let listing = json!([
        {"name": "a.bin", "size": 1_048_576, "raw_url": "https://dl.example/a.bin"},
        {"name": "视频.mp4", "size": 2_097_152, "raw_url": "https://dl.example/v.mp4"},
        {"name": "c.txt", "size": 10, "raw_url": "https://dl.example/c.txt"}
    ]);
    fs::write(
        cache_dir.join("links.json"),
        serde_json::to_string_pretty(&listing).unwrap(),
    )
    .unwrap();
}

#[test]
fn test_binary_help_lists_subcommands() {
    Command::cargo_bin("sharefetch")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("push"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_binary_without_subcommand_fails() {
    Command::cargo_bin("sharefetch")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_show_without_cache_suggests_list() {
    let dir = TempDir::new().unwrap();
    sharefetch(dir.path())
        .arg("show")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sharefetch list"));
}

#[test]
fn test_show_prints_numbered_listing() {
    let dir = TempDir::new().unwrap();
    seed_cache(dir.path());
    sharefetch(dir.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("视频.mp4"))
        .stdout(predicate::str::contains("3 file(s)"));
}

#[test]
fn test_list_rejects_foreign_link() {
    let dir = TempDir::new().unwrap();
    sharefetch(dir.path())
        .args(["list", "https://example.com/f/s!abc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("https://1drv.ms/"));
}

#[test]
fn test_export_selected_links() {
    let dir = TempDir::new().unwrap();
    seed_cache(dir.path());
    let out = dir.path().join("links.txt");
    sharefetch(dir.path())
        .args(["export", "--select", "2-3", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 entries"));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("文件名：视频.mp4\n大小：2.00MB\n直链：https://dl.example/v.mp4\n\n"));
    assert!(text.contains("文件名：c.txt"));
    assert!(!text.contains("a.bin"));
}

#[test]
fn test_export_out_of_range_selection_names_every_index() {
    let dir = TempDir::new().unwrap();
    seed_cache(dir.path());
    sharefetch(dir.path())
        .args(["export", "--select", "2,7,9"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("7, 9"));
}

#[test]
fn test_config_set_then_show_masks_secret_and_keeps_backup() {
    let dir = TempDir::new().unwrap();
    sharefetch(dir.path())
        .args(["config", "set", "--rpc", "http://nas:6800/jsonrpc", "--secret", "hunter2"])
        .assert()
        .success();
    sharefetch(dir.path())
        .args(["config", "set", "--secret", "other"])
        .assert()
        .success()
        .stdout(predicate::str::contains("aria2_config.json.bak"));

    sharefetch(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rpc = http://nas:6800/jsonrpc"))
        .stdout(predicate::str::contains("secret = *****"))
        .stdout(predicate::str::contains("other").not());

    let backup = fs::read_to_string(dir.path().join("aria2_config.json.bak")).unwrap();
    assert!(backup.contains("hunter2"));
}

#[test]
fn test_config_set_rejects_bad_endpoint() {
    let dir = TempDir::new().unwrap();
    sharefetch(dir.path())
        .args(["config", "set", "--rpc", "localhost:6800"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("http://"));
    assert!(!dir.path().join("aria2_config.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_push_partial_batch_exits_one_and_saves_config() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "aria2.getVersion"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"version": "1.37.0"}})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "aria2.addUri", "id": "0"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "0", "result": "gid0"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "aria2.addUri", "id": "2"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "2", "error": {"code": 1, "message": "Invalid URI"}})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    seed_cache(dir.path());
    let rpc = format!("{}/jsonrpc", server.uri());
    let cache_dir = dir.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        sharefetch(&cache_dir)
            .args(["-q", "push", "--select", "1,3", "--rpc", &rpc, "--save-config"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .code(1)
        .stdout(predicate::str::contains("Submitted 1/2 (1 failed)"))
        .stdout(predicate::str::contains("Invalid URI"));
    let saved = fs::read_to_string(dir.path().join("aria2_config.json")).unwrap();
    assert!(saved.contains(&format!("{}/jsonrpc", server.uri())));
}

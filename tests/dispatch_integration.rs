//! Integration tests for aria2 batch dispatch.
//!
//! Covers graduated batch fatality: non-fatal failures continue, fatal ones
//! stop the batch, and cancellation stops between items.

use serde_json::json;
use sharefetch_core::{
    CancelFlag, DispatchClient, DispatchError, DispatchErrorKind, FileEntry,
};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn entries(names: &[&str]) -> Vec<FileEntry> {
    names
        .iter()
        .map(|name| FileEntry {
            name: (*name).to_string(),
            size: 1,
            raw_url: format!("https://dl.example/{name}"),
        })
        .collect()
}

async fn mount_version(server: &MockServer) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "aria2.getVersion"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "probe", "result": {"version": "1.37.0"}})),
        )
        .mount(server)
        .await;
}

async fn mount_add(server: &MockServer, id: &str, template: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "aria2.addUri", "id": id})))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

fn accepted(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"id": id, "result": format!("gid{id}")}))
}

fn client(server: &MockServer, secret: &str) -> DispatchClient {
    DispatchClient::new(&format!("{}/jsonrpc", server.uri()), secret).unwrap()
}

#[tokio::test]
async fn test_batch_continues_past_unknown_failure() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_version(&server).await;
    mount_add(&server, "0", accepted("0"), 1).await;
    mount_add(
        &server,
        "1",
        ResponseTemplate::new(200)
            .set_body_json(json!({"id": "1", "error": {"code": 1, "message": "Invalid URI"}})),
        1,
    )
    .await;
    mount_add(&server, "2", accepted("2"), 1).await;

    let files = entries(&["a", "b", "c"]);
    let report = client(&server, "")
        .dispatch_batch(files.iter().enumerate(), &CancelFlag::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.requested, 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(report.aborted_by.is_none());
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_batch_stops_at_invalid_credentials() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_version(&server).await;
    mount_add(&server, "0", accepted("0"), 1).await;
    mount_add(
        &server,
        "1",
        ResponseTemplate::new(400)
            .set_body_json(json!({"id": "1", "error": {"code": 1, "message": "Unauthorized"}})),
        1,
    )
    .await;
    mount_add(&server, "2", accepted("2"), 0).await;

    let files = entries(&["a", "b", "c"]);
    let mut seen = Vec::new();
    let report = client(&server, "wrong")
        .dispatch_batch(files.iter().enumerate(), &CancelFlag::new(), |outcome| {
            seen.push(outcome.index);
        })
        .await
        .unwrap();

    assert_eq!(seen, [0, 1]);
    assert_eq!(report.aborted_by, Some(DispatchErrorKind::CredentialsInvalid));
    assert_eq!(report.skipped(), 1);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn test_batch_cancel_between_items() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_version(&server).await;
    mount_add(&server, "0", accepted("0"), 1).await;
    mount_add(&server, "1", accepted("1"), 0).await;

    let files = entries(&["a", "b"]);
    let cancel = CancelFlag::new();
    let report = client(&server, "")
        .dispatch_batch(files.iter().enumerate(), &cancel, |_| cancel.cancel())
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped(), 1);
}

#[tokio::test]
async fn test_batch_probe_failure_submits_nothing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "aria2.getVersion"})))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"id": "probe", "error": {"code": 1, "message": "Unauthorized"}})),
        )
        .mount(&server)
        .await;
    mount_add(&server, "0", accepted("0"), 0).await;

    let files = entries(&["a"]);
    let error = client(&server, "")
        .dispatch_batch(files.iter().enumerate(), &CancelFlag::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(error, DispatchError::CredentialsRequired { .. }), "{error:?}");
}

//! Skips wiremock-backed tests when the sandbox forbids binding localhost.

use std::net::TcpListener;

use wiremock::MockServer;

fn socket_tests_required() -> bool {
    std::env::var("SHAREFETCH_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` when localhost sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }
    assert!(
        !socket_tests_required(),
        "[socket-bound-test] cannot bind localhost socket; set SHAREFETCH_REQUIRE_SOCKET_TESTS=0 to allow skipping"
    );
    eprintln!("[socket-bound-test] cannot bind localhost socket; skipping wiremock test");
    None
}

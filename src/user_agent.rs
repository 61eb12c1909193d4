//! Shared User-Agent strings for share and daemon HTTP traffic.
//!
//! The share provider's web endpoints only answer browser-shaped requests, so
//! share traffic uses a browser UA. Daemon traffic identifies the tool.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/sharefetch";

/// Browser User-Agent sent to the share provider's viewer and API hosts.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) \
    Gecko/20100101 Firefox/135.0";

/// Default User-Agent for requests that do not need to look like a browser.
#[must_use]
pub(crate) fn default_tool_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("sharefetch/{version} (+{PROJECT_UA_URL})")
}

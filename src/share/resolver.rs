//! Turns a short share link into the identifiers the listing API needs.
//!
//! The share link redirects to the web viewer. The viewer URL carries a
//! `redeem` token (used to redeem the share for the anonymous session) and
//! an `id` query parameter naming the shared container, from which the drive
//! id and the listing root are derived.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use super::ProviderEndpoints;
use super::ShareError;
use super::headers::HeaderSet;
use crate::http::{HttpSession, RequestSpec};

/// Matches the redeem token inside the redirect target's query string.
#[allow(clippy::expect_used)]
static REDEEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&]redeem=([^&#]+)").expect("redeem regex is valid") // Static pattern, safe to panic
});

/// Marker in the share URL that identifies a personal site.
const PERSONAL_SITE_MARKER: &str = "-my";

/// Which document library a container id lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Personal storage; the library segment is `Documents`.
    Personal,
    /// Organizational team site; the library segment is `Shared Documents`.
    Organizational,
}

impl ContainerKind {
    /// Classifies by the original share URL, not the redirect target.
    #[must_use]
    pub fn from_share_url(share_url: &str) -> Self {
        if share_url.contains(PERSONAL_SITE_MARKER) {
            Self::Personal
        } else {
            Self::Organizational
        }
    }

    /// Path segment that terminates the relative-path prefix.
    #[must_use]
    pub fn library_segment(self) -> &'static str {
        match self {
            Self::Personal => "Documents",
            Self::Organizational => "Shared Documents",
        }
    }
}

/// Identifiers extracted from a share link, before any token is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShare {
    pub share_url: String,
    /// Viewer URL the share link redirected to.
    pub base_redirect_url: String,
    /// Redeem token, percent-encoded as served.
    pub redeem_token: String,
    /// Decoded `id` query parameter.
    pub container_id: String,
    pub kind: ContainerKind,
    /// Lower-cased drive id.
    pub drive_id: String,
    /// Listing root, without a trailing slash.
    pub root_relative_path: String,
}

/// Follows a share link and extracts the listing identifiers.
#[derive(Debug, Clone)]
pub struct ShareResolver {
    http: HttpSession,
    endpoints: ProviderEndpoints,
}

impl ShareResolver {
    #[must_use]
    pub fn new(http: HttpSession, endpoints: ProviderEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Follows the share link once and parses the redirect target.
    ///
    /// # Errors
    ///
    /// - [`ShareError::Resolution`] when the link is not a share link, the
    ///   viewer answers with an error status, or the redirect target lacks
    ///   the `redeem` or `id` parameter
    /// - [`ShareError::Transport`] when the viewer cannot be reached
    #[instrument(skip(self), fields(share_url = %share_url))]
    pub async fn resolve(&self, share_url: &str) -> Result<ResolvedShare, ShareError> {
        let share_url = share_url.trim();
        self.endpoints.check_share_url(share_url)?;

        let spec = RequestSpec::get(share_url).headers(HeaderSet::navigation().build());
        let response = self.http.request(&spec).await?;
        if !response.is_success() {
            return Err(ShareError::resolution(
                share_url,
                format!("viewer answered HTTP {}", response.status),
                "Check that the share link is still valid and publicly shared",
            ));
        }
        debug!(final_url = %response.final_url, "share link redirected");

        let resolved = parse_redirect(share_url, &response.final_url)?;
        info!(
            drive_id = %resolved.drive_id,
            root = %resolved.root_relative_path,
            kind = ?resolved.kind,
            "share link resolved"
        );
        Ok(resolved)
    }
}

/// Extracts the listing identifiers from a redirect target.
///
/// # Errors
///
/// Returns [`ShareError::Resolution`] when `redeem` or `id` is missing.
pub fn parse_redirect(share_url: &str, redirect_url: &str) -> Result<ResolvedShare, ShareError> {
    let redeem_token = extract_redeem_token(redirect_url).ok_or_else(|| {
        ShareError::resolution(
            share_url,
            format!("redirect target {redirect_url} carries no redeem token"),
            "Copy the complete share link; shortened or edited links cannot be redeemed",
        )
    })?;

    let container_id = extract_container_id(redirect_url).ok_or_else(|| {
        ShareError::resolution(
            share_url,
            format!("redirect target {redirect_url} carries no container id"),
            "Share a folder link rather than a single-file preview link",
        )
    })?;

    let kind = ContainerKind::from_share_url(share_url);
    let root_relative_path = relative_root(&container_id, kind);
    let drive_id = drive_id_of(&root_relative_path);
    if drive_id.is_empty() {
        return Err(ShareError::resolution(
            share_url,
            format!("container id '{container_id}' has no drive component"),
            "Share a folder link rather than a single-file preview link",
        ));
    }

    Ok(ResolvedShare {
        share_url: share_url.to_string(),
        base_redirect_url: redirect_url.to_string(),
        redeem_token,
        container_id,
        kind,
        drive_id,
        root_relative_path,
    })
}

pub(crate) fn extract_redeem_token(redirect_url: &str) -> Option<String> {
    REDEEM_PATTERN
        .captures(redirect_url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn extract_container_id(redirect_url: &str) -> Option<String> {
    let url = Url::parse(redirect_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Keeps the container id's segments up to and including the library
/// segment; ids without one are kept whole.
pub(crate) fn relative_root(container_id: &str, kind: ContainerKind) -> String {
    let terminator = kind.library_segment();
    let mut kept = Vec::new();
    for segment in container_id.split('/') {
        kept.push(segment);
        if segment == terminator {
            break;
        }
    }
    kept.join("/").trim_end_matches('/').to_string()
}

fn drive_id_of(relative_path: &str) -> String {
    relative_path
        .split('!')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

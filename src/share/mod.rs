//! Share-link resolution, token exchange, and folder enumeration.
//!
//! A run proceeds in three steps:
//!
//! 1. [`ShareResolver`] follows the share link and extracts the redeem token,
//!    drive id, and listing root.
//! 2. [`TokenExchange`] obtains an anonymous bearer token and redeems the
//!    share for it, yielding a [`ShareSession`].
//! 3. [`FolderEnumerator`] walks the folder tree depth-first and flattens it
//!    into an [`EnumerationResult`](crate::cache::EnumerationResult).

mod enumerator;
mod error;
mod headers;
mod listing;
mod resolver;
mod session;
mod token;

pub use enumerator::{FolderEnumerator, FolderNode, MAX_PAGES_PER_FOLDER};
pub use error::ShareError;
pub use resolver::{ContainerKind, ResolvedShare, ShareResolver, parse_redirect};
pub use session::ShareSession;
pub use token::{BearerToken, TokenExchange};

/// Prefix every accepted share link must start with.
pub const SHARE_LINK_PREFIX: &str = "https://1drv.ms/";

const TOKEN_URL: &str = "https://api-badgerp.svc.ms/v1.0/token";
const API_BASE: &str = "https://my.microsoftpersonalcontent.com";

/// Application identity presented to the token endpoint.
const APP_ID: &str = "5cbed6ac-a083-4e14-b191-b4ba07653de2";

/// Query string of every listing request. The provider rejects listings
/// that do not ask for this exact projection.
const LISTING_QUERY: &str = "%24top=100&orderby=folder%2Cname&%24expand=thumbnails%2Ctags&select=*%2Cocr%2CwebDavUrl%2CsharepointIds%2CisRestricted%2CcommentSettings%2CspecialFolder%2CcontainingDrivePolicyScenarioViewpoint&ump=1";

/// Hosts and identifiers of the share provider.
///
/// Production code uses [`Default`]; tests point every endpoint at a mock
/// server with [`with_base_url`](Self::with_base_url).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub share_prefix: String,
    pub token_url: String,
    pub api_base: String,
    pub app_id: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            share_prefix: SHARE_LINK_PREFIX.to_string(),
            token_url: TOKEN_URL.to_string(),
            api_base: API_BASE.to_string(),
            app_id: APP_ID.to_string(),
        }
    }
}

impl ProviderEndpoints {
    /// All endpoints served from `base_url` (e.g. a wiremock server).
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            share_prefix: format!("{base}/"),
            token_url: format!("{base}/v1.0/token"),
            api_base: base.to_string(),
            app_id: APP_ID.to_string(),
        }
    }

    /// Rejects anything that is not a share link before any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Resolution`] when the prefix does not match.
    pub fn check_share_url(&self, share_url: &str) -> Result<(), ShareError> {
        if share_url.starts_with(&self.share_prefix) && share_url.len() > self.share_prefix.len() {
            Ok(())
        } else {
            Err(ShareError::resolution(
                share_url,
                format!("link does not start with {}", self.share_prefix),
                "Paste a share link of the form https://1drv.ms/f/...",
            ))
        }
    }

    pub(crate) fn redeem_url(&self, redeem_token: &str) -> String {
        format!(
            "{}/_api/v2.0/shares/u!{redeem_token}/driveitem?%24select=id%2CparentReference",
            self.api_base
        )
    }

    pub(crate) fn listing_url(&self, drive_id: &str, relative_path: &str) -> String {
        let encoded: Vec<String> = relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(encode_segment)
            .collect();
        format!(
            "{}/_api/v2.0/drives/{drive_id}/items/{}/children?{LISTING_QUERY}",
            self.api_base,
            encoded.join("/")
        )
    }

    /// Continuation links must stay on the API host; the bearer token is
    /// attached to every listing request.
    pub(crate) fn is_api_url(&self, url: &str) -> bool {
        url.strip_prefix(&self.api_base)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Percent-encodes one path segment, keeping `!` which the provider uses
/// inside item ids.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).replace("%21", "!")
}

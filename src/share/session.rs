//! Authenticated context for listing one share.

use std::fmt;

use super::resolver::ResolvedShare;
use super::token::BearerToken;

/// Everything needed to list a share, fixed once the token is issued.
///
/// Owned by a single enumeration run and never persisted. There is no token
/// refresh: a token that expires mid-run surfaces as an auth error.
#[derive(Clone)]
pub struct ShareSession {
    share: ResolvedShare,
    bearer: BearerToken,
}

impl ShareSession {
    #[must_use]
    pub fn new(share: ResolvedShare, bearer: BearerToken) -> Self {
        Self { share, bearer }
    }

    #[must_use]
    pub fn base_redirect_url(&self) -> &str {
        &self.share.base_redirect_url
    }

    #[must_use]
    pub fn redeem_token(&self) -> &str {
        &self.share.redeem_token
    }

    #[must_use]
    pub fn drive_id(&self) -> &str {
        &self.share.drive_id
    }

    #[must_use]
    pub fn root_relative_path(&self) -> &str {
        &self.share.root_relative_path
    }

    #[must_use]
    pub fn auth_scheme(&self) -> &str {
        &self.bearer.auth_scheme
    }

    /// `Authorization` header value for direct API calls.
    #[must_use]
    pub fn authorization(&self) -> String {
        self.bearer.header_value()
    }

    /// Authorization line embedded in multipart listing bodies. The viewer
    /// sends the scheme exactly as issued here, without capitalization.
    pub(crate) fn embedded_authorization(&self) -> String {
        format!("{} {}", self.bearer.auth_scheme, self.bearer.token)
    }
}

impl fmt::Debug for ShareSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareSession")
            .field("base_redirect_url", &self.share.base_redirect_url)
            .field("drive_id", &self.share.drive_id)
            .field("root_relative_path", &self.share.root_relative_path)
            .field("auth_scheme", &self.bearer.auth_scheme)
            .finish_non_exhaustive()
    }
}

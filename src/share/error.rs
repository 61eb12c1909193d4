//! Error taxonomy for share resolution and enumeration.

use thiserror::Error;

use crate::cache::CacheError;
use crate::http::TransportError;

/// Everything that can abort turning a share link into a listing.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The share link or its redirect target does not have the expected shape,
    /// or the share could not be redeemed. Never retried.
    #[error("cannot resolve share link {url}: {reason}\n  Suggestion: {suggestion}")]
    Resolution {
        url: String,
        reason: String,
        suggestion: &'static str,
    },

    /// Token issuance failed or the provider rejected the bearer token.
    #[error("authentication with the share provider failed: {reason}\n  Suggestion: Retry in a moment; if it persists, request a fresh share link")]
    Auth { reason: String },

    /// A listing response did not have the expected structure.
    #[error("unexpected listing response for folder '{path}': {reason}\n  Suggestion: Re-run the listing; the provider may have changed its response format")]
    Enumeration { path: String, reason: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The run was cancelled between folder pages.
    #[error("enumeration cancelled after {files_found} file(s); nothing was written to the cache")]
    Cancelled { files_found: usize },
}

impl ShareError {
    pub(crate) fn resolution(
        url: impl Into<String>,
        reason: impl Into<String>,
        suggestion: &'static str,
    ) -> Self {
        Self::Resolution {
            url: url.into(),
            reason: reason.into(),
            suggestion,
        }
    }

    pub(crate) fn auth(reason: impl Into<String>) -> Self {
        Self::Auth {
            reason: reason.into(),
        }
    }

    pub(crate) fn enumeration(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Enumeration {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

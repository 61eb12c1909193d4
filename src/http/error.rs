//! Transport-level errors for the HTTP session.

use thiserror::Error;

/// Errors raised before a usable HTTP response was obtained.
///
/// Non-2xx statuses are not errors at this layer: the session returns the
/// buffered response and lets each caller map statuses onto its own taxonomy.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The TCP/TLS connection could not be established (refused, reset, DNS).
    #[error("connection to {url} failed: {source}")]
    Connect {
        /// The URL being requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within its timeout.
    #[error("request to {url} timed out")]
    Timeout {
        /// The URL being requested.
        url: String,
    },

    /// Any other network or body-decoding failure.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL being requested.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },
}

impl TransportError {
    /// Maps a `reqwest` error onto the transport taxonomy.
    ///
    /// Timeouts are checked first: a connect timeout reports both flags and
    /// callers care that it was a timeout.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates a client construction error.
    pub fn client_build(reason: impl Into<String>) -> Self {
        Self::ClientBuild {
            reason: reason.into(),
        }
    }

    /// Returns true for connection-establishment failures.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// Returns true for timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

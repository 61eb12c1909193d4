//! Batch-level dispatch errors, raised before any job is submitted.

use thiserror::Error;

use super::DispatchErrorKind;
use crate::http::TransportError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid aria2 RPC address '{endpoint}': {reason}\n  Suggestion: Use an address like http://127.0.0.1:6800/jsonrpc")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("aria2 at {endpoint} is unreachable: {reason}\n  Suggestion: Check the RPC address and that aria2 is running with --enable-rpc")]
    EndpointUnreachable { endpoint: String, reason: String },

    #[error("aria2 at {endpoint} did not answer within {timeout_secs}s\n  Suggestion: Check that the RPC address points at aria2 and not another service")]
    EndpointTimeout { endpoint: String, timeout_secs: u64 },

    #[error("aria2 at {endpoint} requires an RPC secret\n  Suggestion: Pass --secret or save one with `sharefetch config set --secret <secret>`")]
    CredentialsRequired { endpoint: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchError {
    /// The per-item failure kind equivalent to this batch-level error.
    #[must_use]
    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            Self::EndpointUnreachable { .. } => DispatchErrorKind::EndpointUnreachable,
            Self::EndpointTimeout { .. } => DispatchErrorKind::EndpointTimeout,
            Self::CredentialsRequired { .. } => DispatchErrorKind::CredentialsRequired,
            Self::InvalidEndpoint { .. } | Self::Transport(_) => DispatchErrorKind::Unknown,
        }
    }
}

//! aria2 JSON-RPC client.

use std::fmt;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::rpc::{RpcRequest, RpcResponse, job_id_of};
use super::{BatchReport, DispatchError, DispatchErrorKind, DispatchOutcome, DispatchStatus};
use crate::cache::FileEntry;
use crate::cancel::CancelFlag;
use crate::config::RpcConfig;
use crate::http::{
    CONNECT_TIMEOUT_SECS, HttpResponse, HttpSession, RequestSpec, RetryPolicy, TransportError,
};
use crate::user_agent::default_tool_user_agent;

/// Timeout of the connectivity probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout of each job submission.
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

const UNAUTHORIZED_MARKER: &str = "Unauthorized";
const CONNECTION_REFUSED_MARKER: &str = "Connection refused";

/// Checks an RPC address before any request is made.
///
/// The address must use `http://` or `https://`, name a host, and end with
/// `/jsonrpc`.
///
/// # Errors
///
/// Returns [`DispatchError::InvalidEndpoint`] describing the first violation.
pub fn validate_endpoint(endpoint: &str) -> Result<String, DispatchError> {
    let endpoint = endpoint.trim();
    let invalid = |reason: &str| DispatchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    if endpoint.is_empty() {
        return Err(invalid("address is empty"));
    }
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(invalid("address must start with http:// or https://"));
    }
    if !endpoint.ends_with("/jsonrpc") {
        return Err(invalid("address must end with /jsonrpc"));
    }
    let parsed = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("address has no host"));
    }
    Ok(endpoint.to_string())
}

/// What the connectivity probe learned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// aria2 version, when the daemon answered the probe without a secret.
    pub version: Option<String>,
    /// The daemon refused the unauthenticated probe.
    pub requires_secret: bool,
}

/// Client for one aria2 endpoint.
#[derive(Clone)]
pub struct DispatchClient {
    http: HttpSession,
    endpoint: String,
    secret: String,
    probe_timeout: Duration,
    submit_timeout: Duration,
}

impl fmt::Debug for DispatchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchClient")
            .field("endpoint", &self.endpoint)
            .field("has_secret", &!self.secret.is_empty())
            .finish_non_exhaustive()
    }
}

impl DispatchClient {
    /// Validates the endpoint and builds a client. No request is made.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidEndpoint`] for a malformed address and
    /// [`DispatchError::Transport`] when the HTTP client cannot be built.
    pub fn new(endpoint: &str, secret: &str) -> Result<Self, DispatchError> {
        let endpoint = validate_endpoint(endpoint)?;
        let http = HttpSession::with_options(
            &default_tool_user_agent(),
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            SUBMIT_TIMEOUT,
        )?
        .with_retry_policy(RetryPolicy::with_retries(0));
        Ok(Self {
            http,
            endpoint,
            secret: secret.trim().to_string(),
            probe_timeout: PROBE_TIMEOUT,
            submit_timeout: SUBMIT_TIMEOUT,
        })
    }

    /// Builds a client from a persisted configuration.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_config(config: &RpcConfig) -> Result<Self, DispatchError> {
        Self::new(&config.rpc, &config.secret)
    }

    /// Overrides the probe and submission timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, probe: Duration, submit: Duration) -> Self {
        self.probe_timeout = probe;
        self.submit_timeout = submit;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn rpc_spec(&self, request: &RpcRequest, timeout: Duration) -> RequestSpec {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RequestSpec::post(&self.endpoint)
            .headers(headers)
            .body(request.to_body())
            .timeout(timeout)
    }

    /// Checks that the daemon answers JSON-RPC and whether it needs a secret.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::EndpointUnreachable`] on connection failure or a
    ///   non-JSON-RPC answer
    /// - [`DispatchError::EndpointTimeout`] when the probe times out
    /// - [`DispatchError::CredentialsRequired`] when the daemon demands a
    ///   secret and none is configured
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn probe(&self) -> Result<ProbeReport, DispatchError> {
        let spec = self.rpc_spec(&RpcRequest::get_version(), self.probe_timeout);
        let response = match self.http.request(&spec).await {
            Ok(response) => response,
            Err(TransportError::Timeout { .. }) => {
                return Err(DispatchError::EndpointTimeout {
                    endpoint: self.endpoint.clone(),
                    timeout_secs: self.probe_timeout.as_secs().max(1),
                });
            }
            Err(error @ TransportError::ClientBuild { .. }) => return Err(error.into()),
            Err(error) => {
                return Err(DispatchError::EndpointUnreachable {
                    endpoint: self.endpoint.clone(),
                    reason: error.to_string(),
                });
            }
        };

        let Ok(reply) = response.json::<RpcResponse>() else {
            return Err(DispatchError::EndpointUnreachable {
                endpoint: self.endpoint.clone(),
                reason: format!("HTTP {} with a body that is not JSON-RPC", response.status),
            });
        };

        if let Some(error) = &reply.error {
            if error.message.contains(UNAUTHORIZED_MARKER) {
                if self.secret.is_empty() {
                    return Err(DispatchError::CredentialsRequired {
                        endpoint: self.endpoint.clone(),
                    });
                }
                debug!("daemon requires a secret; one is configured");
                return Ok(ProbeReport {
                    version: None,
                    requires_secret: true,
                });
            }
            warn!(error = %error.describe(), "probe answered with an error");
        }

        let version = reply
            .result
            .as_ref()
            .and_then(|result| result.get("version"))
            .and_then(Value::as_str)
            .map(str::to_string);
        info!(version = ?version, "aria2 reachable");
        Ok(ProbeReport {
            version,
            requires_secret: false,
        })
    }

    /// Submits one file. Never fails: every problem becomes a
    /// [`DispatchStatus::Failed`] outcome.
    #[instrument(skip(self, entry), fields(name = %entry.name))]
    pub async fn dispatch(&self, index: usize, entry: &FileEntry) -> DispatchOutcome {
        let request = RpcRequest::add_uri(index, &self.secret, &entry.raw_url, &entry.name);
        let spec = self.rpc_spec(&request, self.submit_timeout);
        let status = match self.http.request(&spec).await {
            Ok(response) => self.classify_reply(&response),
            Err(error) => classify_transport(&error),
        };
        DispatchOutcome {
            index,
            name: entry.name.clone(),
            status,
        }
    }

    fn classify_reply(&self, response: &HttpResponse) -> DispatchStatus {
        let Ok(reply) = response.json::<RpcResponse>() else {
            return failed(
                DispatchErrorKind::Unknown,
                format!("HTTP {} with a body that is not JSON-RPC", response.status),
            );
        };
        if let Some(result) = &reply.result {
            return DispatchStatus::Succeeded {
                job_id: job_id_of(result),
            };
        }
        let Some(error) = reply.error else {
            return failed(
                DispatchErrorKind::Unknown,
                "reply carried neither result nor error".to_string(),
            );
        };

        let kind = if error.message.contains(UNAUTHORIZED_MARKER) {
            if self.secret.is_empty() {
                DispatchErrorKind::CredentialsRequired
            } else {
                DispatchErrorKind::CredentialsInvalid
            }
        } else if error.message.contains(CONNECTION_REFUSED_MARKER) {
            DispatchErrorKind::EndpointUnreachable
        } else {
            DispatchErrorKind::Unknown
        };
        failed(kind, error.describe())
    }

    /// Probes once, then submits `items` in order.
    ///
    /// `on_outcome` is called after each submission, before the next one
    /// starts. The batch stops at the first batch-fatal failure or when
    /// `cancel` trips; the report records what was processed.
    ///
    /// # Errors
    ///
    /// Returns the probe's [`DispatchError`] when the daemon is unusable; no
    /// item is submitted in that case.
    pub async fn dispatch_batch<'a, I, F>(
        &self,
        items: I,
        cancel: &CancelFlag,
        mut on_outcome: F,
    ) -> Result<BatchReport, DispatchError>
    where
        I: IntoIterator<Item = (usize, &'a FileEntry)>,
        F: FnMut(&DispatchOutcome),
    {
        let items: Vec<(usize, &FileEntry)> = items.into_iter().collect();
        let mut report = BatchReport {
            requested: items.len(),
            ..BatchReport::default()
        };
        if items.is_empty() {
            return Ok(report);
        }

        self.probe().await?;

        for (index, entry) in items {
            if cancel.is_cancelled() {
                warn!(processed = report.outcomes.len(), "dispatch cancelled");
                report.cancelled = true;
                break;
            }

            let outcome = self.dispatch(index, entry).await;
            match &outcome.status {
                DispatchStatus::Succeeded { job_id } => {
                    info!(index, name = %outcome.name, job_id = %job_id, "submitted");
                }
                DispatchStatus::Failed { kind, message } => {
                    warn!(index, name = %outcome.name, kind = %kind, message = %message, "submission failed");
                }
            }
            on_outcome(&outcome);

            let fatal = outcome.failure_kind().filter(|kind| kind.is_batch_fatal());
            report.outcomes.push(outcome);
            if let Some(kind) = fatal {
                warn!(kind = %kind, "stopping batch");
                report.aborted_by = Some(kind);
                break;
            }
        }

        Ok(report)
    }
}

fn classify_transport(error: &TransportError) -> DispatchStatus {
    let kind = match error {
        TransportError::Connect { .. } => DispatchErrorKind::EndpointUnreachable,
        TransportError::Timeout { .. } => DispatchErrorKind::EndpointTimeout,
        TransportError::Network { .. } | TransportError::ClientBuild { .. } => {
            DispatchErrorKind::Unknown
        }
    };
    failed(kind, error.to_string())
}

fn failed(kind: DispatchErrorKind, message: String) -> DispatchStatus {
    DispatchStatus::Failed { kind, message }
}

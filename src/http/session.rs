//! Pooled HTTP session with per-request retry opt-in.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Method, Proxy};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::retry::{
    FailureType, RetryDecision, RetryPolicy, classify_status, classify_transport_error,
};
use super::TransportError;
use crate::user_agent::BROWSER_USER_AGENT;

/// Default connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Description of one logical request.
///
/// Specs are immutable once built and are re-sent verbatim on retry, so
/// headers never leak between calls.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    idempotent: bool,
}

impl RequestSpec {
    /// A GET request. Retried automatically on transient failure.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, true)
    }

    /// A POST request. Never retried unless [`idempotent`](Self::idempotent) is called.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url, false)
    }

    fn new(method: Method, url: impl Into<String>, idempotent: bool) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            idempotent,
        }
    }

    /// Replaces the request headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the raw request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Overrides the session read timeout for this request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Marks a POST as safely repeatable (a read disguised as a POST).
    #[must_use]
    pub fn idempotent(mut self) -> Self {
        self.idempotent = true;
        self
    }

    /// Returns true if the session may retry this request on transient failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.idempotent
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// URL after following redirects.
    pub final_url: String,
    /// Response body decoded as text.
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Reusable HTTP session with bounded automatic retry.
///
/// Create once per run and share by reference; the inner client pools
/// connections and keeps a cookie store across requests.
#[derive(Debug, Clone)]
pub struct HttpSession {
    client: Client,
    retry_policy: RetryPolicy,
}

impl HttpSession {
    /// Creates a session with a browser User-Agent and default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when client construction fails.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(
            BROWSER_USER_AGENT,
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a session with an explicit User-Agent and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when client construction fails.
    pub fn with_options(
        user_agent: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = build_client(user_agent, connect_timeout, read_timeout)?;
        Ok(Self {
            client,
            retry_policy: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy used for retryable requests.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the configured retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Sends a request, retrying per the policy when the request is retryable.
    ///
    /// A 5xx on the last permitted attempt is returned as a response, not an
    /// error, so callers can still inspect the body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    #[instrument(skip(self, spec), fields(method = %spec.method, url = %spec.url))]
    pub async fn request(&self, spec: &RequestSpec) -> Result<HttpResponse, TransportError> {
        let mut attempt = 1;
        loop {
            let outcome = self.send_once(spec).await;
            let failure_type = match &outcome {
                Ok(response) => classify_status(response.status),
                Err(error) => classify_transport_error(error),
            };

            // Any non-transient status is a final answer.
            if outcome.is_ok() && failure_type == FailureType::Permanent {
                return outcome;
            }
            if !spec.is_retryable() {
                return outcome;
            }

            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        status = outcome.as_ref().ok().map(|r| r.status),
                        error = outcome.as_ref().err().map(ToString::to_string),
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(attempt, %reason, "giving up");
                    return outcome;
                }
            }
        }
    }

    async fn send_once(&self, spec: &RequestSpec) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(spec.method.clone(), &spec.url)
            .headers(spec.headers.clone());
        if let Some(body) = &spec.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = spec.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&spec.url, e))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&spec.url, e))?;

        debug!(status, final_url = %final_url, body_len = body.len(), "response received");
        Ok(HttpResponse {
            status,
            final_url,
            body,
        })
    }
}

fn build_client(
    user_agent: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<Client, TransportError> {
    match try_build_client(user_agent, connect_timeout, read_timeout, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; retry with env-only proxy discovery.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(user_agent, connect_timeout, read_timeout, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(TransportError::client_build(
                    "client construction panicked while initializing networking",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(TransportError::client_build(error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(TransportError::client_build(error.to_string())),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    user_agent: &str,
    connect_timeout: Duration,
    read_timeout: Duration,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let user_agent = user_agent.to_string();
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(user_agent, connect_timeout, read_timeout);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(user_agent: String, connect_timeout: Duration, read_timeout: Duration) -> ClientBuilder {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout)
        .user_agent(user_agent)
        .cookie_store(true)
        .gzip(true)
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    for (scheme, names) in [
        ("https", ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        ("http", ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
    ] {
        let Some(proxy) = first_non_empty_env(&names) else {
            continue;
        };
        let resolved = if scheme == "https" {
            Proxy::https(&proxy)
        } else {
            Proxy::http(&proxy)
        };
        if let Ok(resolved) = resolved {
            builder = builder.proxy(resolved);
        }
    }
    builder
}

fn first_non_empty_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

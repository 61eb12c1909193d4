//! HTTP session shared by share resolution, enumeration, and dispatch.
//!
//! # Overview
//!
//! [`HttpSession`] wraps one pooled `reqwest` client and buffers every
//! response into an [`HttpResponse`]. Requests are described with a
//! [`RequestSpec`]:
//!
//! - GET specs are retried on transient failures (connect/reset, timeouts, 5xx)
//!   following the session's [`RetryPolicy`].
//! - POST specs are sent exactly once unless the caller explicitly marks them
//!   [`idempotent`](RequestSpec::idempotent). Token issuance and share
//!   redemption must never be marked.
//!
//! # Example
//!
//! ```no_run
//! use sharefetch_core::http::{HttpSession, RequestSpec};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = HttpSession::new()?;
//! let response = session.request(&RequestSpec::get("https://example.com")).await?;
//! println!("{} -> {}", response.status, response.final_url);
//! # Ok(())
//! # }
//! ```

mod error;
mod retry;
mod session;

pub use error::TransportError;
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_status,
    classify_transport_error,
};
pub use session::{
    CONNECT_TIMEOUT_SECS, HttpResponse, HttpSession, READ_TIMEOUT_SECS, RequestSpec,
};

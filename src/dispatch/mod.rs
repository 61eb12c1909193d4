//! Submission of selected files to an aria2 daemon over JSON-RPC.
//!
//! A batch probes the daemon once, then submits items one at a time in
//! selection order. Failures that would repeat for every later item
//! (unreachable daemon, rejected secret) stop the batch; other failures are
//! recorded and the batch continues.

mod client;
mod error;
mod outcome;
mod rpc;

pub use client::{DispatchClient, PROBE_TIMEOUT, ProbeReport, SUBMIT_TIMEOUT, validate_endpoint};
pub use error::DispatchError;
pub use outcome::{BatchReport, DispatchErrorKind, DispatchOutcome, DispatchStatus};

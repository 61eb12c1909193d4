//! JSON-RPC 2.0 envelopes for the aria2 methods this crate calls.

use serde::Deserialize;
use serde_json::{Value, json};

pub(crate) const GET_VERSION: &str = "aria2.getVersion";
pub(crate) const ADD_URI: &str = "aria2.addUri";

#[derive(Debug)]
pub(crate) struct RpcRequest {
    jsonrpc: &'static str,
    id: String,
    method: &'static str,
    params: Vec<Value>,
}

impl RpcRequest {
    /// Version probe. Sent without a token: an `Unauthorized` answer tells
    /// us the daemon requires one.
    pub(crate) fn get_version() -> Self {
        Self {
            jsonrpc: "2.0",
            id: "probe".to_string(),
            method: GET_VERSION,
            params: Vec::new(),
        }
    }

    /// `aria2.addUri` for one file. The `token:` parameter is omitted when
    /// `secret` is empty.
    pub(crate) fn add_uri(id: usize, secret: &str, url: &str, out: &str) -> Self {
        let mut params = Vec::with_capacity(3);
        if !secret.is_empty() {
            params.push(Value::String(format!("token:{secret}")));
        }
        params.push(json!([url]));
        params.push(json!({ "out": out }));
        Self {
            jsonrpc: "2.0",
            id: id.to_string(),
            method: ADD_URI,
            params,
        }
    }

    pub(crate) fn to_body(&self) -> String {
        json!({
            "jsonrpc": self.jsonrpc,
            "id": self.id,
            "method": self.method,
            "params": self.params,
        })
        .to_string()
    }
}

/// Response envelope. Either `result` or `error` is expected; both are
/// optional so that malformed replies still decode and can be reported.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub(crate) result: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    #[serde(default)]
    pub(crate) code: Option<i64>,
    #[serde(default)]
    pub(crate) message: String,
}

impl RpcErrorObject {
    pub(crate) fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("{} (code {code})", self.message),
            None => self.message.clone(),
        }
    }
}

/// Renders a `result` value as a job id: strings verbatim, anything else as
/// JSON text.
pub(crate) fn job_id_of(result: &Value) -> String {
    match result {
        Value::String(gid) => gid.clone(),
        other => other.to_string(),
    }
}

//! JSON-RPC 2.0 envelopes as seen by the harness.
//!
//! Outgoing messages are strongly typed. Incoming frames stay as raw JSON so
//! that structurally broken responses can still be routed and then validated.

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The protocol tag every envelope must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id issued by the harness.
pub type RequestId = u64;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC request.
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<JsonRpcError> for HarnessError {
    fn from(err: JsonRpcError) -> Self {
        HarnessError::Protocol {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

/// A response frame, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    id: RequestId,
    envelope: Value,
}

impl Response {
    /// The correlation id this response answered.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The full envelope exactly as the server sent it.
    pub fn envelope(&self) -> &Value {
        &self.envelope
    }

    pub fn result(&self) -> Option<&Value> {
        self.envelope.get("result")
    }

    /// Parse the error object, if present.
    ///
    /// A present but malformed error object is reported as a validation error.
    pub fn error(&self) -> Option<Result<JsonRpcError, HarnessError>> {
        let raw = self.envelope.get("error")?;
        Some(
            serde_json::from_value(raw.clone())
                .map_err(|e| HarnessError::validation(format!("malformed error object: {e}"))),
        )
    }

    /// Settle the envelope: the result on success, the server's error as
    /// [`HarnessError::Protocol`], or a validation error for anything else.
    pub fn into_result(self) -> Result<Value, HarnessError> {
        let has_result = self.envelope.get("result").is_some();
        match (has_result, self.error()) {
            (true, Some(_)) => Err(HarnessError::validation(
                "response carries both result and error",
            )),
            (false, Some(err)) => Err(err?.into()),
            (true, None) => match self.envelope {
                Value::Object(mut map) => Ok(map.remove("result").unwrap_or(Value::Null)),
                _ => Err(HarnessError::validation("response is not a JSON object")),
            },
            (false, None) => Err(HarnessError::validation(
                "response has neither result nor error",
            )),
        }
    }
}

/// An incoming frame, classified by field presence.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A server-initiated request (`method` and `id`).
    Request { id: Value, method: String },
    /// A server-initiated notification (`method` without `id`).
    Notification { method: String },
    /// A response whose id the harness could have issued.
    Response(Response),
    /// Anything else: a response with a foreign id, or no discernible role.
    Unroutable(Value),
}

impl Message {
    /// Classify a JSON object read off the wire.
    pub fn classify(frame: Value) -> Self {
        if let Some(method) = frame.get("method").and_then(Value::as_str) {
            let method = method.to_string();
            return match frame.get("id") {
                Some(id) => Message::Request {
                    id: id.clone(),
                    method,
                },
                None => Message::Notification { method },
            };
        }
        match frame.get("id").and_then(Value::as_u64) {
            Some(id) => Message::Response(Response {
                id,
                envelope: frame,
            }),
            None => Message::Unroutable(frame),
        }
    }
}

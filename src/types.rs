//! Contract types for UI ↔ backend communication
//!
//! These types define the request/response envelope shared by every
//! transport: the native bridge and the in-memory reference backend.
//!
//! Wire shape:
//!
//! ```text
//! Request:  { op, v, payload, correlationId }
//! Response: { ok, result?, error?: { code, message, details?, status? } }
//! ```

use crate::error::codes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Contract version stamped on every request.
///
/// Carried as a compatibility tag only; no negotiation happens on mismatch.
pub const CONTRACT_VERSION: u32 = 1;

/// Outgoing request envelope
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub op: String,
    pub v: u32,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    pub correlation_id: String,
}

fn empty_payload() -> Value {
    json!({})
}

impl EngineRequest {
    /// Build a request for `op`, stamping the contract version and a fresh
    /// correlation id. A `null` payload becomes an empty object.
    pub fn new(op: impl Into<String>, payload: Value) -> Self {
        let payload = if payload.is_null() { empty_payload() } else { payload };
        Self {
            op: op.into(),
            v: CONTRACT_VERSION,
            payload,
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Shorthand for [`EngineRequest::new`].
pub fn make_request(op: impl Into<String>, payload: Value) -> EngineRequest {
    EngineRequest::new(op, payload)
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub ok: bool,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EngineError>,
}

/// A `result` key that is present (even as `null`) counts as populated.
pub(crate) fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Error details in response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl EngineResponse {
    /// Success response with result value
    pub fn ok(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn err(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(EngineError {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
                status: None,
            }),
        }
    }

    /// Attach structured details to an error response. No-op on success.
    pub fn with_details(mut self, details: Value) -> Self {
        if let Some(err) = self.error.as_mut() {
            err.details = Some(details);
        }
        self
    }

    /// Attach an HTTP-ish status to an error response. No-op on success.
    pub fn with_status(mut self, status: u16) -> Self {
        if let Some(err) = self.error.as_mut() {
            err.status = Some(status);
        }
        self
    }

    /// `ok` agrees with which branch is populated, and exactly one is.
    pub fn is_well_formed(&self) -> bool {
        match (self.ok, &self.result, &self.error) {
            (true, Some(_), None) => true,
            (false, None, Some(_)) => true,
            _ => false,
        }
    }

    /// Replace a malformed envelope (one that came over a transport) with an
    /// `INTERNAL_ERROR` response.
    pub fn normalized(self) -> Self {
        if self.is_well_formed() {
            self
        } else {
            tracing::warn!(
                op = "envelope.malformed",
                ok = self.ok,
                has_result = self.result.is_some(),
                has_error = self.error.is_some(),
                "Malformed response envelope"
            );
            Self::err(
                codes::INTERNAL_ERROR,
                "Malformed response envelope: ok flag disagrees with populated fields",
            )
        }
    }

    /// Split into the populated branch.
    pub fn into_result(self) -> Result<Value, EngineError> {
        match self.normalized() {
            EngineResponse {
                result: Some(result),
                ..
            } => Ok(result),
            EngineResponse {
                error: Some(error), ..
            } => Err(error),
            // normalized() guarantees one branch is populated
            _ => Err(EngineError {
                code: codes::INTERNAL_ERROR.to_string(),
                message: "Empty response envelope".to_string(),
                details: None,
                status: None,
            }),
        }
    }

    /// Error code, if this is an error response
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

//! Operation clients
//!
//! One module per capability domain. Each function builds a request envelope,
//! sends it through the dispatcher and unwraps the response:
//!
//! - `ok: false` → `Err(SdkError)` carrying the envelope's code and message
//! - `ok: true` → the result deserialized into the declared response type
//!
//! Pre-checks on caller input only exist where they give fast feedback
//! (credential format, empty paths). The backend remains authoritative.
//!
//! A few boolean helpers (`paths::is_allowed`, `debug::is_dev_mode`) swallow
//! errors and answer `false`. Each one says so at its definition.

pub mod auth;
pub mod debug;
pub mod home;
pub mod node_credentials;
pub mod node_session;
pub mod paths;
pub mod runner;
pub mod runtime;
pub mod setup;
pub mod vault;
pub mod workflow_runs;

use crate::backend::SmartBackend;
use crate::error::{codes, SdkError, SdkResult};
use crate::ops::Operation;
use crate::state::TransportMode;
use crate::types::make_request;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Handle to the dispatcher shared by all operation clients
#[derive(Clone)]
pub struct EngineClient {
    backend: Arc<SmartBackend>,
}

impl EngineClient {
    pub fn new(backend: Arc<SmartBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<SmartBackend> {
        &self.backend
    }

    pub async fn connect(&self) {
        self.backend.connect().await
    }

    pub async fn disconnect(&self) {
        self.backend.disconnect().await
    }

    pub fn mode(&self) -> TransportMode {
        self.backend.mode()
    }

    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    /// Typed call: serialize the request, dispatch, decode the result.
    pub async fn call<O: Operation>(&self, request: &O::Request) -> SdkResult<O::Response> {
        let payload = serde_json::to_value(request)
            .map_err(|e| SdkError::validation(codes::INVALID_PAYLOAD, e.to_string()))?;

        let result = self.call_raw(O::OP.as_str(), payload).await?;

        serde_json::from_value(result).map_err(|e| {
            SdkError::new(
                codes::INTERNAL_ERROR,
                format!("Unexpected result shape for {}: {}", O::OP, e),
            )
        })
    }

    /// Untyped call by wire name
    pub async fn call_raw(&self, op: &str, payload: Value) -> SdkResult<Value> {
        let req = make_request(op, payload);
        let resp = self.backend.request(&req).await;

        resp.into_result().map_err(|error| {
            tracing::debug!(
                op = "client.call.failed",
                op_name = %op,
                correlation_id = %req.correlation_id,
                code = %error.code,
                "Operation returned an error"
            );
            SdkError::from(error)
        })
    }
}

/// `{ "ok": true }` acknowledgement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: bool,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::bridge::testing::ScriptedBridge;

    /// Client over a connected reference backend (demo mode)
    pub async fn reference_client() -> EngineClient {
        let client = EngineClient::new(Arc::new(SmartBackend::reference_only()));
        client.connect().await;
        client
    }

    /// Client over a connected scripted native bridge
    pub async fn native_client(bridge: ScriptedBridge) -> (EngineClient, Arc<ScriptedBridge>) {
        let bridge = Arc::new(bridge);
        let client = EngineClient::new(Arc::new(SmartBackend::with_bridge(bridge.clone())));
        client.connect().await;
        (client, bridge)
    }
}

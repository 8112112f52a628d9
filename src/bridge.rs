//! Native bridge contract
//!
//! The privileged native side is a black box reached through exactly two
//! entry points: a connect handshake and a generic request forwarder taking
//! the full request envelope and returning the full response envelope.
//! A disconnect notification is also offered; callers treat it as
//! best-effort.
//!
//! Implementations report transport failures as [`BridgeError`]. Application
//! errors travel inside the returned [`EngineResponse`].

use crate::error::BridgeError;
use crate::types::{EngineRequest, EngineResponse};
use async_trait::async_trait;

#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Establish a session with the native side.
    async fn connect(&self) -> Result<(), BridgeError>;

    /// Forward one envelope.
    async fn request(&self, req: &EngineRequest) -> Result<EngineResponse, BridgeError>;

    /// Tell the native side the session is over.
    async fn disconnect(&self) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted bridge for tests

    use super::*;
    use serde_json::Value;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every forwarded op and answers from a per-op script
    #[derive(Default)]
    pub struct ScriptedBridge {
        connect_fails: bool,
        request_fails: bool,
        connect_delay: Option<Duration>,
        responses: Mutex<HashMap<String, EngineResponse>>,
        queued: Mutex<HashMap<String, VecDeque<EngineResponse>>>,
        pub forwarded: Mutex<Vec<String>>,
        /// Handshakes and goodbyes in the order the bridge saw them
        events: Mutex<Vec<&'static str>>,
        pub connects: AtomicUsize,
        pub disconnects: AtomicUsize,
    }

    impl ScriptedBridge {
        pub fn new() -> Self {
            Self::default()
        }

        /// Bridge whose handshake always fails
        pub fn refusing() -> Self {
            Self {
                connect_fails: true,
                ..Self::default()
            }
        }

        /// Bridge that connects but fails every forwarded request at the
        /// transport level
        pub fn broken_pipe() -> Self {
            Self {
                request_fails: true,
                ..Self::default()
            }
        }

        pub fn with_connect_delay(mut self, delay: Duration) -> Self {
            self.connect_delay = Some(delay);
            self
        }

        pub fn respond(self, op: &str, response: EngineResponse) -> Self {
            self.responses
                .lock()
                .unwrap()
                .insert(op.to_string(), response);
            self
        }

        pub fn respond_ok(self, op: &str, result: Value) -> Self {
            self.respond(op, EngineResponse::ok(result))
        }

        /// Answer the next request for `op` with `response`, ahead of any
        /// standing script. Queued answers are used in order.
        pub fn respond_once(self, op: &str, response: EngineResponse) -> Self {
            self.queued
                .lock()
                .unwrap()
                .entry(op.to_string())
                .or_default()
                .push_back(response);
            self
        }

        pub fn forwarded_ops(&self) -> Vec<String> {
            self.forwarded.lock().unwrap().clone()
        }

        pub fn lifecycle_events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }

        pub fn connect_count(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NativeBridge for ScriptedBridge {
        async fn connect(&self) -> Result<(), BridgeError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("connect");
            if let Some(delay) = self.connect_delay {
                tokio::time::sleep(delay).await;
            }
            if self.connect_fails {
                return Err(BridgeError::Unavailable("no native host".into()));
            }
            Ok(())
        }

        async fn request(&self, req: &EngineRequest) -> Result<EngineResponse, BridgeError> {
            self.forwarded.lock().unwrap().push(req.op.clone());
            if self.request_fails {
                return Err(BridgeError::Closed);
            }
            let queued = self
                .queued
                .lock()
                .unwrap()
                .get_mut(&req.op)
                .and_then(VecDeque::pop_front);
            let scripted = queued.or_else(|| self.responses.lock().unwrap().get(&req.op).cloned());
            Ok(scripted.unwrap_or_else(|| {
                EngineResponse::ok(serde_json::json!({ "native": true, "op": req.op }))
            }))
        }

        async fn disconnect(&self) -> Result<(), BridgeError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("disconnect");
            Err(BridgeError::Closed)
        }
    }
}

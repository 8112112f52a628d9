//! SmartBackend: backend selection and request dispatch
//!
//! # Routing
//!
//! 1. Local-only operations (see [`crate::ops::LOCAL_ONLY_OPS`]) always go to
//!    the native bridge, before any connection check. Transport failure →
//!    `TAURI_NOT_READY`.
//! 2. Not connected → `NOT_CONNECTED`.
//! 3. Native mode → native bridge. Transport failure → `INTERNAL_ERROR`.
//! 4. Reference mode → in-memory reference backend.
//!
//! # Connect
//!
//! `connect()` probes the native bridge. If the handshake fails (or there is
//! no bridge at all) the dispatcher silently falls back to the reference
//! backend: running without a native host is a normal operating mode.
//! Concurrent callers share a single in-flight attempt.
//!
//! # Ownership
//!
//! One instance per application, constructed by the application root and
//! handed down as `Arc<SmartBackend>`. There is no global.

use crate::bridge::NativeBridge;
use crate::config::{BridgeMode, DesktopConfig};
use crate::core_process::{CoreCommand, CoreProcessBridge};
use crate::error::{codes, sanitize_error};
use crate::ops::is_local_only_op;
use crate::reference::ReferenceBackend;
use crate::state::TransportMode;
use crate::types::{EngineRequest, EngineResponse};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default)]
struct Connection {
    mode: TransportMode,
    connected: bool,
}

/// Dispatcher that picks the native bridge or the reference backend
pub struct SmartBackend {
    bridge: Option<Arc<dyn NativeBridge>>,
    reference: ReferenceBackend,
    conn: RwLock<Connection>,
    /// Serializes connect/disconnect so only one attempt is ever in flight
    lifecycle: tokio::sync::Mutex<()>,
    /// Pending disconnect notification; drained before the next handshake
    farewell: Mutex<Option<JoinHandle<()>>>,
}

impl SmartBackend {
    /// `bridge = None` means no native host exists in this process.
    pub fn new(bridge: Option<Arc<dyn NativeBridge>>) -> Self {
        Self {
            bridge,
            reference: ReferenceBackend::new(),
            conn: RwLock::new(Connection::default()),
            lifecycle: tokio::sync::Mutex::new(()),
            farewell: Mutex::new(None),
        }
    }

    pub fn with_bridge(bridge: Arc<dyn NativeBridge>) -> Self {
        Self::new(Some(bridge))
    }

    /// Demo mode: never probes a native bridge
    pub fn reference_only() -> Self {
        Self::new(None)
    }

    /// Build the dispatcher the app runs with.
    ///
    /// In auto mode a missing Desktop Core binary is not an error: the
    /// dispatcher simply has no bridge and will fall back on connect.
    pub fn from_config(config: &DesktopConfig) -> Self {
        if config.bridge_mode == BridgeMode::Reference {
            tracing::info!(op = "backend.config.reference", "Bridge disabled by configuration");
            return Self::reference_only();
        }

        match CoreCommand::discover(config.core_bin.as_deref()) {
            Ok(command) => {
                Self::with_bridge(Arc::new(CoreProcessBridge::new(command, config.bridge_timeout)))
            }
            Err(e) => {
                tracing::info!(
                    op = "backend.config.no_core",
                    reason = %sanitize_error(&e.to_string()),
                    "Desktop Core not found"
                );
                Self::reference_only()
            }
        }
    }

    /// Current transport mode (diagnostics / UI display)
    pub fn mode(&self) -> TransportMode {
        self.snapshot().mode
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot().connected
    }

    /// The embedded reference backend
    pub fn reference(&self) -> &ReferenceBackend {
        &self.reference
    }

    /// Connect, falling back to the reference backend on any bridge failure.
    ///
    /// Never fails. No-op when already connected.
    pub async fn connect(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        if self.snapshot().connected {
            tracing::debug!(op = "backend.connect.skipped", "Already connected");
            return;
        }

        // The native side must see the old session end before a new one starts
        let farewell = self.farewell.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = farewell {
            let _ = handle.await;
        }

        let mode = match &self.bridge {
            Some(bridge) => match bridge.connect().await {
                Ok(()) => {
                    tracing::info!(op = "backend.connect.native", "Connected to native bridge");
                    TransportMode::Native
                }
                Err(e) => {
                    tracing::info!(
                        op = "backend.connect.fallback",
                        reason = %sanitize_error(&e.to_string()),
                        "Native bridge unavailable - using reference backend"
                    );
                    self.reference.connect();
                    TransportMode::Reference
                }
            },
            None => {
                tracing::info!(
                    op = "backend.connect.reference",
                    "No native bridge configured - using reference backend"
                );
                self.reference.connect();
                TransportMode::Reference
            }
        };

        self.set(Connection {
            mode,
            connected: true,
        });
    }

    /// Disconnect. Never fails; no-op when not connected.
    ///
    /// In native mode the bridge is notified from a detached task whose
    /// outcome is ignored. That notification may not complete, but it is never
    /// overtaken: the next `connect()` waits for it first.
    pub async fn disconnect(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        let conn = self.snapshot();
        if !conn.connected {
            return;
        }

        match conn.mode {
            TransportMode::Native => {
                if let Some(bridge) = self.bridge.clone() {
                    let handle = tokio::spawn(async move {
                        if let Err(e) = bridge.disconnect().await {
                            tracing::debug!(
                                op = "backend.disconnect.notify_failed",
                                error = %e,
                                "Native bridge disconnect notification failed (ignored)"
                            );
                        }
                    });
                    *self.farewell.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                }
            }
            TransportMode::Reference => self.reference.disconnect(),
            TransportMode::Unknown => {}
        }

        self.set(Connection::default());
        tracing::info!(op = "backend.disconnect", mode = %conn.mode, "Disconnected");
    }

    /// Route one request. Transport failures come back as error envelopes.
    pub async fn request(&self, req: &EngineRequest) -> EngineResponse {
        if is_local_only_op(&req.op) {
            return self.forward_local_only(req).await;
        }

        let conn = self.snapshot();
        if !conn.connected {
            return EngineResponse::err(
                codes::NOT_CONNECTED,
                "Engine not connected. Call connect first.",
            );
        }

        match conn.mode {
            TransportMode::Native => self.forward_native(req).await,
            TransportMode::Reference => self.reference.request(req),
            TransportMode::Unknown => EngineResponse::err(
                codes::NOT_CONNECTED,
                "Transport mode not selected. Call connect first.",
            ),
        }
    }

    async fn forward_local_only(&self, req: &EngineRequest) -> EngineResponse {
        let Some(bridge) = &self.bridge else {
            return EngineResponse::err(
                codes::TAURI_NOT_READY,
                &format!("{} requires the native desktop bridge, which is not available", req.op),
            );
        };

        match bridge.request(req).await {
            Ok(resp) => resp.normalized(),
            Err(e) => {
                let message = sanitize_error(&e.to_string());
                tracing::warn!(
                    op = "backend.local_only.unavailable",
                    op_name = %req.op,
                    error = %message,
                    "Local-only operation could not reach native bridge"
                );
                EngineResponse::err(codes::TAURI_NOT_READY, &message)
            }
        }
    }

    async fn forward_native(&self, req: &EngineRequest) -> EngineResponse {
        let Some(bridge) = &self.bridge else {
            return EngineResponse::err(codes::INTERNAL_ERROR, "Native mode without a bridge");
        };

        match bridge.request(req).await {
            Ok(resp) => resp.normalized(),
            Err(e) => {
                let message = sanitize_error(&e.to_string());
                tracing::error!(
                    op = "backend.native.transport_error",
                    op_name = %req.op,
                    correlation_id = %req.correlation_id,
                    error = %message,
                    "Native bridge request failed"
                );
                EngineResponse::err(codes::INTERNAL_ERROR, &message)
            }
        }
    }

    fn snapshot(&self) -> Connection {
        *self.conn.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, conn: Connection) {
        *self.conn.write().unwrap_or_else(PoisonError::into_inner) = conn;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::ScriptedBridge;
    use crate::ops::{Op, LOCAL_ONLY_OPS};
    use crate::types::make_request;
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn smart(bridge: &Arc<ScriptedBridge>) -> SmartBackend {
        SmartBackend::with_bridge(bridge.clone())
    }

    #[tokio::test]
    async fn test_no_bridge_falls_back_to_reference() {
        let backend = SmartBackend::reference_only();
        assert_eq!(backend.mode(), TransportMode::Unknown);

        backend.connect().await;
        assert_eq!(backend.mode(), TransportMode::Reference);
        assert!(backend.is_connected());

        let resp = backend
            .request(&make_request("auth.set", json!({ "tenantId": "t", "sub": "u", "jwt": "j" })))
            .await;
        assert!(resp.ok);
        let resp = backend.request(&make_request("home.grant", json!({}))).await;
        assert!(resp.result.unwrap()["grant_id"].is_string());
        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert_eq!(resp.result.unwrap()["state"], "HOME_GRANTED");
    }

    #[tokio::test]
    async fn test_reference_mode_delegates_grant_gating() {
        let backend = SmartBackend::reference_only();
        backend.connect().await;
        let resp = backend.request(&make_request("home.grant", json!({}))).await;
        assert_eq!(resp.error_code(), Some(codes::NOT_AUTHENTICATED));
    }

    #[tokio::test]
    async fn test_refused_handshake_falls_back_silently() {
        let bridge = Arc::new(ScriptedBridge::refusing());
        let backend = smart(&bridge);

        backend.connect().await;
        assert_eq!(backend.mode(), TransportMode::Reference);
        assert!(backend.reference().is_connected());

        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert!(resp.ok);
        assert!(bridge.forwarded_ops().is_empty());
    }

    #[tokio::test]
    async fn test_native_mode_forwards_everything() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);

        backend.connect().await;
        assert_eq!(backend.mode(), TransportMode::Native);

        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert_eq!(resp.result.unwrap()["native"], true);
        let resp = backend.request(&make_request("made.up", json!({}))).await;
        assert!(resp.ok, "native side decides what is unknown");
        assert_eq!(bridge.forwarded_ops(), vec!["home.status", "made.up"]);
    }

    #[tokio::test]
    async fn test_native_transport_failure_is_internal_error() {
        let bridge = Arc::new(ScriptedBridge::broken_pipe());
        let backend = smart(&bridge);
        backend.connect().await;

        let resp = backend.request(&make_request("vault.status", json!({}))).await;
        assert_eq!(resp.error_code(), Some(codes::INTERNAL_ERROR));
    }

    #[tokio::test]
    async fn test_native_application_errors_pass_through() {
        let bridge = Arc::new(ScriptedBridge::new().respond(
            "vault.secrets.get",
            EngineResponse::err(codes::SECRET_NOT_FOUND, "no such secret").with_status(404),
        ));
        let backend = smart(&bridge);
        backend.connect().await;

        let resp = backend
            .request(&make_request("vault.secrets.get", json!({ "id": "x" })))
            .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, codes::SECRET_NOT_FOUND);
        assert_eq!(err.status, Some(404));
    }

    #[tokio::test]
    async fn test_malformed_native_response_is_normalized() {
        let bridge = Arc::new(ScriptedBridge::new().respond(
            "home.status",
            EngineResponse {
                ok: true,
                result: None,
                error: None,
            },
        ));
        let backend = smart(&bridge);
        backend.connect().await;

        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert!(resp.is_well_formed());
        assert_eq!(resp.error_code(), Some(codes::INTERNAL_ERROR));
    }

    #[tokio::test]
    async fn test_not_connected_before_connect() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);

        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert_eq!(resp.error_code(), Some(codes::NOT_CONNECTED));
        assert!(bridge.forwarded_ops().is_empty());
    }

    #[tokio::test]
    async fn test_local_only_goes_native_before_connect() {
        let bridge = Arc::new(
            ScriptedBridge::new()
                .respond_ok("setup.status", json!({ "nodeIdentity": "configured", "setupComplete": true })),
        );
        let backend = smart(&bridge);

        let resp = backend.request(&make_request("setup.status", json!({}))).await;
        assert_eq!(resp.result.unwrap()["setupComplete"], true);
        assert_eq!(bridge.forwarded_ops(), vec!["setup.status"]);
        assert_eq!(backend.mode(), TransportMode::Unknown);
    }

    #[tokio::test]
    async fn test_local_only_goes_native_in_every_mode() {
        // Reference mode: handshake refused, but local-only ops still hit the bridge
        let bridge = Arc::new(ScriptedBridge::refusing());
        let backend = smart(&bridge);
        backend.connect().await;
        assert_eq!(backend.mode(), TransportMode::Reference);

        for op in LOCAL_ONLY_OPS {
            let resp = backend.request(&make_request(op.as_str(), json!({}))).await;
            assert_eq!(resp.result.unwrap()["native"], true, "{}", op);
        }
        let expected: Vec<String> = LOCAL_ONLY_OPS.iter().map(|op| op.to_string()).collect();
        assert_eq!(bridge.forwarded_ops(), expected);

        // Native mode
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);
        backend.connect().await;
        let resp = backend.request(&make_request("nodeCredentials.status", json!({}))).await;
        assert!(resp.ok);
        assert_eq!(bridge.forwarded_ops(), vec!["nodeCredentials.status"]);
    }

    #[tokio::test]
    async fn test_local_only_without_bridge_is_not_ready() {
        let backend = SmartBackend::reference_only();

        // Before connect
        let resp = backend.request(&make_request("setup.status", json!({}))).await;
        assert_eq!(resp.error_code(), Some(codes::TAURI_NOT_READY));

        // After falling back: never answered by the reference backend
        backend.connect().await;
        for op in LOCAL_ONLY_OPS {
            let resp = backend.request(&make_request(op.as_str(), json!({}))).await;
            assert_eq!(resp.error_code(), Some(codes::TAURI_NOT_READY), "{}", op);
        }
    }

    #[tokio::test]
    async fn test_local_only_transport_failure_is_not_ready() {
        let bridge = Arc::new(ScriptedBridge::broken_pipe());
        let backend = smart(&bridge);
        let resp = backend
            .request(&make_request("nodeCredentials.clear", json!({})))
            .await;
        assert_eq!(resp.error_code(), Some(codes::TAURI_NOT_READY));
    }

    #[tokio::test]
    async fn test_concurrent_connects_share_one_attempt() {
        let bridge = Arc::new(ScriptedBridge::new().with_connect_delay(Duration::from_millis(50)));
        let backend = Arc::new(smart(&bridge));

        let (a, b, c) = (backend.clone(), backend.clone(), backend.clone());
        tokio::join!(a.connect(), b.connect(), c.connect());

        assert_eq!(bridge.connect_count(), 1);
        assert_eq!(backend.mode(), TransportMode::Native);
    }

    #[tokio::test]
    async fn test_connect_twice_is_noop() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);
        backend.connect().await;
        backend.connect().await;
        assert_eq!(bridge.connect_count(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_native_swallows_notification_failure() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);
        backend.connect().await;

        backend.disconnect().await;
        assert!(!backend.is_connected());
        assert_eq!(backend.mode(), TransportMode::Unknown);

        // Detached notification gets a chance to run
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bridge.disconnects.load(Ordering::SeqCst), 1);

        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert_eq!(resp.error_code(), Some(codes::NOT_CONNECTED));
    }

    #[tokio::test]
    async fn test_disconnect_reference_resets_home_state() {
        let backend = SmartBackend::reference_only();
        backend.connect().await;
        backend
            .request(&make_request("auth.set", json!({ "tenantId": "t", "sub": "u", "jwt": "j" })))
            .await;
        backend.request(&make_request("home.grant", json!({}))).await;

        backend.disconnect().await;
        assert!(!backend.reference().is_connected());

        backend.connect().await;
        let resp = backend.request(&make_request("home.status", json!({}))).await;
        assert_eq!(resp.result.unwrap()["state"], "BOOTSTRAP_PRE_LOGIN");
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected_is_noop() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);
        backend.disconnect().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(bridge.disconnects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reconnect_after_disconnect_probes_again() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);
        backend.connect().await;
        backend.disconnect().await;
        backend.connect().await;
        assert_eq!(bridge.connect_count(), 2);
        assert_eq!(backend.mode(), TransportMode::Native);
    }

    #[tokio::test]
    async fn test_reconnect_waits_for_previous_goodbye() {
        let bridge = Arc::new(ScriptedBridge::new());
        let backend = smart(&bridge);
        backend.connect().await;
        backend.disconnect().await;
        backend.connect().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(bridge.lifecycle_events(), vec!["connect", "disconnect", "connect"]);
        assert!(backend.is_connected());
        assert_eq!(backend.mode(), TransportMode::Native);
    }

    #[tokio::test]
    async fn test_all_responses_are_well_formed_in_reference_mode() {
        let backend = SmartBackend::reference_only();
        for op in Op::ALL {
            assert!(backend.request(&make_request(op.as_str(), json!({}))).await.is_well_formed());
        }
        backend.connect().await;
        for op in Op::ALL {
            assert!(backend.request(&make_request(op.as_str(), json!({}))).await.is_well_formed());
        }
    }
}

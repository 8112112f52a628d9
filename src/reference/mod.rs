//! In-memory reference backend
//!
//! A pure, stateful stand-in for the native bridge, used when no privileged
//! backend is reachable (browser preview, demos, tests). It simulates the
//! connection lifecycle, the auth context and the HOME grant. Nothing here
//! touches the filesystem, network or environment.
//!
//! Instances share no global state; construct as many as needed.

mod auth;
mod home;
mod runtime;

pub use home::REFERENCE_HOME_PATH;

use crate::error::codes;
use crate::ops::Op;
use crate::state::{AuthContext, HomeState};
use crate::types::{EngineRequest, EngineResponse};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutable backend state. Reset wholesale by `disconnect()`.
#[derive(Debug, Default)]
pub(crate) struct ReferenceState {
    pub(crate) connected: bool,
    pub(crate) auth: Option<AuthContext>,
    pub(crate) home_granted: bool,
}

impl ReferenceState {
    pub(crate) fn home_state(&self) -> HomeState {
        HomeState::derive(self.auth.is_some(), self.home_granted)
    }
}

/// In-memory backend implementing a subset of the operation catalogue
#[derive(Debug, Default)]
pub struct ReferenceBackend {
    state: Mutex<ReferenceState>,
}

impl ReferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark connected. Safe to call repeatedly.
    pub fn connect(&self) {
        self.lock().connected = true;
        tracing::debug!(op = "reference.connect", "Reference backend connected");
    }

    /// Reset all state to initial.
    pub fn disconnect(&self) {
        *self.lock() = ReferenceState::default();
        tracing::debug!(op = "reference.disconnect", "Reference backend reset");
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    pub fn home_state(&self) -> HomeState {
        self.lock().home_state()
    }

    /// Dispatch one request
    pub fn request(&self, req: &EngineRequest) -> EngineResponse {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(e) => return EngineResponse::err(codes::INTERNAL_ERROR, &e.to_string()),
        };

        let parsed = req.op.parse::<Op>();

        // Only runtime.info is answered before connect
        let allowed_offline = matches!(parsed, Ok(op) if op.allowed_while_disconnected());
        if !state.connected && !allowed_offline {
            return EngineResponse::err(
                codes::NOT_CONNECTED,
                "Engine not connected. Call connect first.",
            );
        }

        let op = match parsed {
            Ok(op) => op,
            Err(e) => return EngineResponse::err(codes::INVALID_OP, &e.to_string()),
        };

        tracing::debug!(
            op = "reference.dispatch",
            op_name = %op,
            correlation_id = %req.correlation_id,
            "Dispatching"
        );

        match op {
            Op::RuntimeInfo => runtime::handle_info(&state),
            Op::SetupStatus => runtime::handle_setup_status(),
            Op::AuthSet => auth::handle_set(&req.payload, &mut state),
            Op::HomeStatus => home::handle_status(&state),
            Op::HomeGrant => home::handle_grant(&mut state),
            Op::NodeSessionStatus => runtime::handle_node_session_status(),
            Op::RunnerStatus => runtime::handle_runner_status(),
            Op::DebugIsDevMode => runtime::handle_is_dev_mode(),

            // Everything below needs the native bridge
            Op::AuthLogin
            | Op::AuthRefresh
            | Op::AuthLogout
            | Op::NodeSessionEnsureIdentity
            | Op::NodeSessionBootstrap
            | Op::NodeCredentialsSet
            | Op::NodeCredentialsStatus
            | Op::NodeCredentialsClear
            | Op::PathsCheck
            | Op::PathsList
            | Op::PathsGet
            | Op::PathsRequest
            | Op::PathsRemove
            | Op::VaultStatus
            | Op::VaultCapabilities
            | Op::VaultSecretsList
            | Op::VaultSecretsGet
            | Op::VaultSecretsCreate
            | Op::VaultSecretsUpdate
            | Op::VaultSecretsDelete
            | Op::VaultSecretsUpsert
            | Op::VaultBundlesList
            | Op::VaultBundlesGet
            | Op::VaultBundlesCreate
            | Op::VaultBundlesRename
            | Op::VaultBundlesDelete
            | Op::VaultBundlesListSecrets
            | Op::VaultBundlesAddSecret
            | Op::VaultBundlesRemoveSecret
            | Op::VaultFilesWriteText
            | Op::VaultFilesWriteBytes
            | Op::VaultFilesReadText
            | Op::VaultFilesReadBytes
            | Op::VaultFilesList
            | Op::VaultFilesExists
            | Op::VaultFilesDelete
            | Op::VaultFilesMkdir
            | Op::VaultFilesMove
            | Op::VaultAttachSecretsToConnector
            | Op::VaultInjectSecretsIntoRun
            | Op::VaultAuditList
            | Op::RunnerTaskStats
            | Op::WorkflowRunsCreate
            | Op::WorkflowRunsGet
            | Op::EngineStatus
            | Op::DebugOpenFolder
            | Op::DebugResolveVaultPath => EngineResponse::err(
                codes::INVALID_OP,
                &format!("Unknown operation: {}", req.op),
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReferenceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::make_request;
    use serde_json::json;

    fn connected() -> ReferenceBackend {
        let backend = ReferenceBackend::new();
        backend.connect();
        backend
    }

    fn login(backend: &ReferenceBackend) {
        let resp = backend.request(&make_request(
            "auth.set",
            json!({ "tenantId": "t", "sub": "u", "jwt": "j" }),
        ));
        assert!(resp.ok);
    }

    fn home_state_of(backend: &ReferenceBackend) -> String {
        let resp = backend.request(&make_request("home.status", json!({})));
        resp.result.unwrap()["state"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_scenario_grant_after_auth() {
        let backend = connected();

        let resp = backend.request(&make_request(
            "auth.set",
            json!({ "tenantId": "t", "sub": "u", "jwt": "j" }),
        ));
        assert!(resp.ok);
        assert_eq!(resp.result.unwrap(), json!({ "ok": true }));

        let resp = backend.request(&make_request("home.grant", json!({})));
        assert!(resp.ok);
        assert!(resp.result.unwrap()["grant_id"].is_string());

        let result = backend
            .request(&make_request("home.status", json!({})))
            .result
            .unwrap();
        assert_eq!(result["state"], "HOME_GRANTED");
        assert_eq!(result["grantPresent"], true);
    }

    #[test]
    fn test_scenario_grant_before_auth() {
        let backend = connected();
        let resp = backend.request(&make_request("home.grant", json!({})));
        assert!(!resp.ok);
        assert_eq!(resp.error_code(), Some(codes::NOT_AUTHENTICATED));
    }

    #[test]
    fn test_every_op_but_runtime_info_is_gated_on_connect() {
        let backend = ReferenceBackend::new();
        for op in Op::ALL {
            let resp = backend.request(&make_request(op.as_str(), json!({})));
            if *op == Op::RuntimeInfo {
                assert!(resp.ok, "runtime.info should answer offline");
            } else {
                assert_eq!(resp.error_code(), Some(codes::NOT_CONNECTED), "{}", op);
            }
        }
        let resp = backend.request(&make_request("no.such.op", json!({})));
        assert_eq!(resp.error_code(), Some(codes::NOT_CONNECTED));
    }

    #[test]
    fn test_unknown_op_names_the_op() {
        let backend = connected();
        for name in ["no.such.op", "vault.secrets.list", "paths.request", ""] {
            let resp = backend.request(&make_request(name, json!({})));
            let err = resp.error.unwrap();
            assert_eq!(err.code, codes::INVALID_OP);
            assert_eq!(err.message, format!("Unknown operation: {}", name));
        }
    }

    #[test]
    fn test_home_state_only_moves_forward() {
        let backend = connected();
        let mut seen = vec![backend.home_state()];

        // Repeated status calls and a failed grant must not regress anything
        backend.request(&make_request("home.grant", json!({})));
        seen.push(backend.home_state());
        login(&backend);
        seen.push(backend.home_state());
        backend.request(&make_request("auth.set", json!({ "tenantId": "" })));
        seen.push(backend.home_state());
        backend.request(&make_request("home.grant", json!({})));
        seen.push(backend.home_state());
        login(&backend);
        seen.push(backend.home_state());

        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
        assert_eq!(seen.last(), Some(&HomeState::HomeGranted));
    }

    #[test]
    fn test_disconnect_resets_everything() {
        let backend = connected();
        login(&backend);
        backend.request(&make_request("home.grant", json!({})));
        assert_eq!(home_state_of(&backend), "HOME_GRANTED");

        backend.disconnect();
        assert!(!backend.is_connected());
        backend.connect();
        assert_eq!(home_state_of(&backend), "BOOTSTRAP_PRE_LOGIN");

        // Grant gating is back in force after the reset
        let resp = backend.request(&make_request("home.grant", json!({})));
        assert_eq!(resp.error_code(), Some(codes::NOT_AUTHENTICATED));
    }

    #[test]
    fn test_connect_is_idempotent() {
        let backend = connected();
        login(&backend);
        backend.connect();
        assert!(backend.is_connected());
        assert_eq!(home_state_of(&backend), "AUTHENTICATED_NO_HOME_GRANT");
    }

    #[test]
    fn test_instances_are_independent() {
        let a = connected();
        let b = connected();
        login(&a);
        assert_eq!(home_state_of(&a), "AUTHENTICATED_NO_HOME_GRANT");
        assert_eq!(home_state_of(&b), "BOOTSTRAP_PRE_LOGIN");
    }

    #[test]
    fn test_setup_status_reports_not_configured() {
        let backend = connected();
        let result = backend
            .request(&make_request("setup.status", json!({})))
            .result
            .unwrap();
        assert_eq!(result["nodeIdentity"], "not_configured");
        assert_eq!(result["setupComplete"], false);
    }

    #[test]
    fn test_runtime_info_reports_demo_mode() {
        let backend = ReferenceBackend::new();
        let result = backend
            .request(&make_request("runtime.info", json!({})))
            .result
            .unwrap();
        assert_eq!(result["mode"], "demo");
        assert_eq!(result["engine_present"], false);
        assert_eq!(result["homeState"], "BOOTSTRAP_PRE_LOGIN");
    }

    #[test]
    fn test_responses_are_well_formed() {
        let backend = connected();
        for op in Op::ALL {
            let resp = backend.request(&make_request(op.as_str(), json!({})));
            assert!(resp.is_well_formed(), "{}", op);
        }
    }
}

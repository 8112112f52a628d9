//! Runtime, setup and diagnostics operations
//!
//! Handles: runtime.info, setup.status, nodeSession.status, runner.status,
//! debug.isDevMode

use super::home::REFERENCE_HOME_PATH;
use super::ReferenceState;
use crate::state::RunnerStatus;
use crate::types::EngineResponse;
use serde_json::json;

/// Handle runtime.info operation (answered even while disconnected)
pub fn handle_info(state: &ReferenceState) -> EngineResponse {
    EngineResponse::ok(json!({
        "runtime": "reference",
        "engine_present": false,
        "mode": "demo",
        "homeState": state.home_state(),
        "homePath": REFERENCE_HOME_PATH,
    }))
}

/// Handle setup.status operation
///
/// Node identity is always "not configured" here: credentials live in OS
/// secure storage, which only the native bridge can read. The dispatcher
/// never routes this operation to the reference backend; the handler exists
/// so onboarding flows can be exercised against a bare reference backend.
pub fn handle_setup_status() -> EngineResponse {
    EngineResponse::ok(json!({
        "nodeIdentity": "not_configured",
        "setupComplete": false,
    }))
}

/// Handle nodeSession.status operation
pub fn handle_node_session_status() -> EngineResponse {
    EngineResponse::ok(json!({
        "hasIdentity": false,
        "hasSession": false,
        "sessionValid": false,
        "identity": null,
        "session": null,
    }))
}

/// Handle runner.status operation (no runner exists in demo mode)
pub fn handle_runner_status() -> EngineResponse {
    EngineResponse::ok(json!(RunnerStatus::default()))
}

/// Handle debug.isDevMode operation
pub fn handle_is_dev_mode() -> EngineResponse {
    EngineResponse::ok(json!({ "isDevMode": false }))
}

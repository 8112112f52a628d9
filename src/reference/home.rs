//! Home operations
//!
//! Handles: home.status, home.grant
//!
//! The grant is simulated: no engine call, no grants file. A synthetic grant
//! id and a one-year expiry are handed back so the UI flow behaves the same.

use super::ReferenceState;
use crate::error::codes;
use crate::state::HomeState;
use crate::types::EngineResponse;
use chrono::{Duration, Utc};
use serde_json::json;

/// Placeholder path reported in place of a real home directory
pub const REFERENCE_HOME_PATH: &str = "~/.ekka-desktop";

/// Matches the engine's home grant lifetime (1 year)
const GRANT_EXPIRES_IN_SECONDS: i64 = 31_536_000;

/// Handle home.status operation
pub fn handle_status(state: &ReferenceState) -> EngineResponse {
    let home_state = state.home_state();

    let reason = match home_state {
        HomeState::BootstrapPreLogin => Some("Login required before HOME grant"),
        HomeState::AuthenticatedNoHomeGrant => Some("No valid HOME grant found"),
        HomeState::HomeGranted => None,
    };

    EngineResponse::ok(json!({
        "state": home_state,
        "homePath": REFERENCE_HOME_PATH,
        "grantPresent": state.home_granted,
        "reason": reason,
    }))
}

/// Handle home.grant operation
pub fn handle_grant(state: &mut ReferenceState) -> EngineResponse {
    if state.auth.is_none() {
        return EngineResponse::err(
            codes::NOT_AUTHENTICATED,
            "Must call auth.set before home.grant",
        );
    }

    state.home_granted = true;

    let grant_id = format!("reference-{}", uuid::Uuid::new_v4());
    let expires_at = (Utc::now() + Duration::seconds(GRANT_EXPIRES_IN_SECONDS)).to_rfc3339();

    tracing::info!(
        op = "reference.home.granted",
        grant_id = %grant_id,
        "Simulated HOME grant issued"
    );

    EngineResponse::ok(json!({
        "success": true,
        "grant_id": grant_id,
        "expires_at": expires_at,
    }))
}

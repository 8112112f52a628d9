//! Auth operations
//!
//! Handles: auth.set

use super::ReferenceState;
use crate::error::codes;
use crate::state::AuthContext;
use crate::types::EngineResponse;
use serde_json::{json, Value};

/// Handle auth.set operation
pub fn handle_set(payload: &Value, state: &mut ReferenceState) -> EngineResponse {
    let tenant_id = match required_str(payload, "tenantId") {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let sub = match required_str(payload, "sub") {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let jwt = match required_str(payload, "jwt") {
        Ok(j) => j,
        Err(resp) => return resp,
    };

    let workspace_id = payload
        .get("workspaceId")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    tracing::info!(
        op = "reference.auth.set",
        tenant_id = %tenant_id,
        sub = %sub,
        "Auth context set"
    );

    state.auth = Some(AuthContext {
        tenant_id,
        sub,
        jwt,
        workspace_id,
    });

    EngineResponse::ok(json!({ "ok": true }))
}

fn required_str(payload: &Value, key: &str) -> Result<String, EngineResponse> {
    match payload.get(key).and_then(|v| v.as_str()) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(EngineResponse::err(
            codes::INVALID_PAYLOAD,
            &format!("Missing or empty '{}'", key),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_stores_context() {
        let mut state = ReferenceState::default();
        let resp = handle_set(
            &json!({ "tenantId": "t", "sub": "u", "jwt": "j", "workspaceId": "w" }),
            &mut state,
        );
        assert!(resp.ok);
        let auth = state.auth.unwrap();
        assert_eq!(auth.tenant_id, "t");
        assert_eq!(auth.workspace_id.as_deref(), Some("w"));
    }

    #[test]
    fn test_set_rejects_each_missing_field() {
        for missing in ["tenantId", "sub", "jwt"] {
            let mut payload = json!({ "tenantId": "t", "sub": "u", "jwt": "j" });
            payload.as_object_mut().unwrap().remove(missing);

            let mut state = ReferenceState::default();
            let resp = handle_set(&payload, &mut state);
            assert_eq!(resp.error_code(), Some(codes::INVALID_PAYLOAD));
            assert!(resp.error.unwrap().message.contains(missing));
            assert!(state.auth.is_none());
        }
    }

    #[test]
    fn test_set_rejects_non_string_field() {
        let mut state = ReferenceState::default();
        let resp = handle_set(&json!({ "tenantId": 7, "sub": "u", "jwt": "j" }), &mut state);
        assert_eq!(resp.error_code(), Some(codes::INVALID_PAYLOAD));
    }
}

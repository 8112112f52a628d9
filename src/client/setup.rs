//! Setup / onboarding

use super::EngineClient;
use crate::error::SdkResult;
use crate::ops::{operation, Empty};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentityState {
    Configured,
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatus {
    pub node_identity: NodeIdentityState,
    pub setup_complete: bool,
}

operation!(
    /// setup.status (local-only)
    GetSetupStatus: SetupStatus, Empty => SetupStatus
);

/// Whether this device finished onboarding (node credentials stored).
pub async fn status(client: &EngineClient) -> SdkResult<SetupStatus> {
    client.call::<GetSetupStatus>(&Empty {}).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SmartBackend;
    use crate::bridge::testing::ScriptedBridge;
    use crate::client::test_support::native_client;
    use crate::error::codes;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_status_from_native_bridge() {
        let (client, bridge) = native_client(ScriptedBridge::new().respond_ok(
            "setup.status",
            json!({ "nodeIdentity": "configured", "setupComplete": true }),
        ))
        .await;

        let status = status(&client).await.unwrap();
        assert_eq!(status.node_identity, NodeIdentityState::Configured);
        assert!(status.setup_complete);
        assert_eq!(bridge.forwarded_ops(), vec!["setup.status"]);
    }

    #[tokio::test]
    async fn test_status_without_bridge_is_not_ready() {
        let client = EngineClient::new(Arc::new(SmartBackend::reference_only()));
        client.connect().await;
        let err = status(&client).await.unwrap_err();
        assert!(err.is(codes::TAURI_NOT_READY));
    }
}

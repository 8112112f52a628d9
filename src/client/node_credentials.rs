//! Node credentials (local-only)
//!
//! The node id and secret live in OS secure storage on the native side.
//! These calls always go to the native bridge, in every transport mode.

use super::{Ack, EngineClient};
use crate::error::{codes, SdkError, SdkResult};
use crate::ops::{operation, Empty};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Shortest node secret the native side accepts
pub const MIN_NODE_SECRET_LEN: usize = 16;

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SetCredentialsRequest {
    pub node_id: String,
    pub node_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsSet {
    pub ok: bool,
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsStatus {
    pub has_credentials: bool,
    #[serde(default)]
    pub node_id: Option<String>,
}

operation!(
    /// nodeCredentials.set
    SetCredentials: NodeCredentialsSet, SetCredentialsRequest => CredentialsSet
);
operation!(
    /// nodeCredentials.status
    GetCredentialsStatus: NodeCredentialsStatus, Empty => CredentialsStatus
);
operation!(
    /// nodeCredentials.clear
    ClearCredentials: NodeCredentialsClear, Empty => Ack
);

/// Format check only. The native side validates again before storing.
pub fn validate_node_id(node_id: &str) -> SdkResult<uuid::Uuid> {
    uuid::Uuid::parse_str(node_id.trim()).map_err(|e| {
        SdkError::validation(codes::INVALID_NODE_ID, format!("Invalid UUID format: {}", e))
    })
}

pub fn validate_node_secret(node_secret: &str) -> SdkResult<()> {
    if node_secret.is_empty() {
        return Err(SdkError::validation(
            codes::INVALID_NODE_SECRET,
            "Node secret cannot be empty",
        ));
    }
    // Byte length, as the native store measures it
    if node_secret.len() < MIN_NODE_SECRET_LEN {
        return Err(SdkError::validation(
            codes::INVALID_NODE_SECRET,
            format!("Node secret must be at least {} characters", MIN_NODE_SECRET_LEN),
        ));
    }
    Ok(())
}

/// Store node credentials. Bad input is rejected before any round trip.
pub async fn set(client: &EngineClient, node_id: &str, node_secret: &str) -> SdkResult<CredentialsSet> {
    let node_id = validate_node_id(node_id)?;
    validate_node_secret(node_secret)?;

    let req = SetCredentialsRequest {
        node_id: node_id.to_string(),
        node_secret: node_secret.to_string(),
    };
    let result = client.call::<SetCredentials>(&req).await?;

    tracing::info!(
        op = "client.node_credentials.stored",
        node_id = %result.node_id,
        "Node credentials stored"
    );
    Ok(result)
}

pub async fn status(client: &EngineClient) -> SdkResult<CredentialsStatus> {
    client.call::<GetCredentialsStatus>(&Empty {}).await
}

pub async fn clear(client: &EngineClient) -> SdkResult<()> {
    client.call::<ClearCredentials>(&Empty {}).await?;
    tracing::info!(op = "client.node_credentials.cleared", "Node credentials cleared");
    Ok(())
}

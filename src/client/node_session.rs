//! Node identity and session
//!
//! The node identity is an Ed25519 keypair held by the native side. A session
//! is obtained by signing a server challenge with it; none of that is visible
//! here, only the resulting status.

use super::EngineClient;
use crate::error::SdkResult;
use crate::ops::{operation, Empty};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub node_id: String,
    pub public_key_b64: String,
    #[serde(default)]
    pub private_key_vault_ref: Option<String>,
    #[serde(default, alias = "created_at_iso_utc")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSession {
    pub session_id: String,
    pub tenant_id: String,
    pub workspace_id: String,
    pub expires_at: String,
    #[serde(default)]
    pub is_expired: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    /// Start the local runner loop once a session exists
    pub start_runner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub node_id: String,
    pub public_key_b64: String,
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub session: Option<NodeSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSessionStatus {
    pub has_identity: bool,
    pub has_session: bool,
    pub session_valid: bool,
    #[serde(default)]
    pub identity: Option<NodeIdentity>,
    #[serde(default)]
    pub session: Option<NodeSession>,
}

operation!(
    /// nodeSession.ensureIdentity
    EnsureIdentity: NodeSessionEnsureIdentity, Empty => NodeIdentity
);
operation!(
    /// nodeSession.bootstrap
    Bootstrap: NodeSessionBootstrap, BootstrapRequest => BootstrapResult
);
operation!(
    /// nodeSession.status
    GetSessionStatus: NodeSessionStatus, Empty => NodeSessionStatus
);

/// Load the node identity, creating it on first use.
pub async fn ensure_identity(client: &EngineClient) -> SdkResult<NodeIdentity> {
    client.call::<EnsureIdentity>(&Empty {}).await
}

/// Identity + registration + session in one step.
pub async fn bootstrap(client: &EngineClient, start_runner: bool) -> SdkResult<BootstrapResult> {
    let result = client
        .call::<Bootstrap>(&BootstrapRequest { start_runner })
        .await?;
    tracing::info!(
        op = "client.node_session.bootstrapped",
        node_id = %result.node_id,
        registered = result.registered,
        has_session = result.session.is_some(),
        "Node session bootstrapped"
    );
    Ok(result)
}

pub async fn status(client: &EngineClient) -> SdkResult<NodeSessionStatus> {
    client.call::<GetSessionStatus>(&Empty {}).await
}

//! HOME directory status and grant

use super::EngineClient;
use crate::error::SdkResult;
use crate::ops::{operation, Empty};
use crate::state::HomeState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStatus {
    pub state: HomeState,
    pub home_path: String,
    pub grant_present: bool,
    /// Why the grant is missing, when it is
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeGrant {
    pub success: bool,
    pub grant_id: String,
    pub expires_at: Option<String>,
}

operation!(
    /// home.status
    GetHomeStatus: HomeStatus, Empty => HomeStatus
);
operation!(
    /// home.grant
    GrantHome: HomeGrant, Empty => HomeGrant
);

pub async fn status(client: &EngineClient) -> SdkResult<HomeStatus> {
    client.call::<GetHomeStatus>(&Empty {}).await
}

/// Request the HOME grant. Requires a prior `auth::set_context`.
pub async fn grant(client: &EngineClient) -> SdkResult<HomeGrant> {
    let grant = client.call::<GrantHome>(&Empty {}).await?;
    tracing::info!(op = "client.home.granted", grant_id = %grant.grant_id, "HOME grant issued");
    Ok(grant)
}

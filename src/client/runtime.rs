//! Runtime info

use super::EngineClient;
use crate::error::SdkResult;
use crate::ops::{operation, Empty};
use crate::state::HomeState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    pub runtime: String,
    #[serde(rename = "engine_present")]
    pub engine_present: bool,
    pub mode: String,
    pub home_state: HomeState,
    pub home_path: String,
}

operation!(
    /// runtime.info
    GetRuntimeInfo: RuntimeInfo, Empty => RuntimeInfo
);

/// Which runtime answers requests
pub async fn info(client: &EngineClient) -> SdkResult<RuntimeInfo> {
    client.call::<GetRuntimeInfo>(&Empty {}).await
}

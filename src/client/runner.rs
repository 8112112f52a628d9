//! Local runner

use super::EngineClient;
use crate::error::SdkResult;
use crate::ops::{operation, Empty};
use crate::state::RunnerStatus;
use serde_json::Value;

operation!(
    /// runner.status
    GetRunnerStatus: RunnerStatus, Empty => RunnerStatus
);
operation!(
    /// runner.taskStats (engine-owned shape, passed through as is)
    GetTaskStats: RunnerTaskStats, Empty => Value
);

pub async fn status(client: &EngineClient) -> SdkResult<RunnerStatus> {
    client.call::<GetRunnerStatus>(&Empty {}).await
}

/// Task queue statistics from the engine
pub async fn task_stats(client: &EngineClient) -> SdkResult<Value> {
    client.call::<GetTaskStats>(&Empty {}).await
}

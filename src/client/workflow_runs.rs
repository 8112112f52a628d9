//! Workflow runs

use super::EngineClient;
use crate::error::SdkResult;
use crate::ops::operation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize)]
pub struct CreateRunRequest {
    pub request: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetRunRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

operation!(
    /// workflowRuns.create
    CreateRun: WorkflowRunsCreate, CreateRunRequest => WorkflowRun
);
operation!(
    /// workflowRuns.get
    GetRun: WorkflowRunsGet, GetRunRequest => WorkflowRun
);

/// Start a workflow run. `request` is forwarded to the engine untouched.
pub async fn create(client: &EngineClient, request: Value, jwt: Option<&str>) -> SdkResult<WorkflowRun> {
    let req = CreateRunRequest {
        request,
        jwt: jwt.map(str::to_string),
    };
    let run = client.call::<CreateRun>(&req).await?;
    tracing::info!(op = "client.workflow_runs.created", run_id = %run.id, "Workflow run created");
    Ok(run)
}

pub async fn get(client: &EngineClient, id: &str, jwt: Option<&str>) -> SdkResult<WorkflowRun> {
    let req = GetRunRequest {
        id: id.to_string(),
        jwt: jwt.map(str::to_string),
    };
    client.call::<GetRun>(&req).await
}

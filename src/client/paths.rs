//! Path grants
//!
//! Access to folders outside HOME is granted per path by the engine. These
//! calls query and manage those grants.

use super::EngineClient;
use crate::error::{codes, SdkError, SdkResult};
use crate::ops::operation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathAccess {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathType {
    Home,
    Workspace,
    Data,
    Temp,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRequest {
    pub path: String,
    pub operation: PathAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCheck {
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub path_type: Option<PathType>,
    #[serde(default)]
    pub access: Option<PathAccess>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_type: Option<PathType>,
}

/// One granted path. Grant metadata beyond these fields stays in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathGrant {
    pub path: String,
    #[serde(default)]
    pub path_type: Option<PathType>,
    #[serde(default)]
    pub access: Option<PathAccess>,
    #[serde(default)]
    pub grant_id: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathList {
    pub paths: Vec<PathGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathRequest {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub path: String,
    pub path_type: PathType,
    pub access: PathAccess,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantResult {
    pub success: bool,
    #[serde(default)]
    pub grant_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removed {
    pub removed: bool,
}

operation!(
    /// paths.check
    CheckPath: PathsCheck, CheckRequest => PathCheck
);
operation!(
    /// paths.list
    ListPaths: PathsList, ListRequest => PathList
);
operation!(
    /// paths.get (null when no grant exists)
    GetPath: PathsGet, PathRequest => Option<PathGrant>
);
operation!(
    /// paths.request
    RequestPath: PathsRequest, GrantRequest => GrantResult
);
operation!(
    /// paths.remove
    RemovePath: PathsRemove, PathRequest => Removed
);

pub async fn check(client: &EngineClient, path: &str, operation: PathAccess) -> SdkResult<PathCheck> {
    let req = CheckRequest {
        path: path.to_string(),
        operation,
    };
    client.call::<CheckPath>(&req).await
}

/// Convenience wrapper around [`check`].
///
/// Unlike every other client call this one does not surface errors: any
/// failure (not connected, no grant store, unknown path) answers `false`.
pub async fn is_allowed(client: &EngineClient, path: &str, operation: PathAccess) -> bool {
    match check(client, path, operation).await {
        Ok(result) => result.allowed,
        Err(e) => {
            tracing::debug!(op = "client.paths.is_allowed.error", code = %e.code, "Treating error as not allowed");
            false
        }
    }
}

pub async fn list(client: &EngineClient, path_type: Option<PathType>) -> SdkResult<Vec<PathGrant>> {
    Ok(client.call::<ListPaths>(&ListRequest { path_type }).await?.paths)
}

pub async fn get(client: &EngineClient, path: &str) -> SdkResult<Option<PathGrant>> {
    client
        .call::<GetPath>(&PathRequest {
            path: path.to_string(),
        })
        .await
}

/// Ask the engine to grant access to `path`.
pub async fn request(
    client: &EngineClient,
    path: &str,
    path_type: PathType,
    access: PathAccess,
) -> SdkResult<GrantResult> {
    if path.trim().is_empty() {
        return Err(SdkError::validation(codes::INVALID_PAYLOAD, "Path cannot be empty"));
    }
    let req = GrantRequest {
        path: path.to_string(),
        path_type,
        access,
    };
    let result = client.call::<RequestPath>(&req).await?;
    tracing::info!(
        op = "client.paths.requested",
        success = result.success,
        "Path grant requested"
    );
    Ok(result)
}

pub async fn remove(client: &EngineClient, path: &str) -> SdkResult<bool> {
    let req = PathRequest {
        path: path.to_string(),
    };
    Ok(client.call::<RemovePath>(&req).await?.removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::ScriptedBridge;
    use crate::client::test_support::{native_client, reference_client};
    use serde_json::json;

    #[tokio::test]
    async fn test_check_and_is_allowed() {
        let (client, _) = native_client(ScriptedBridge::new().respond_ok(
            "paths.check",
            json!({ "allowed": true, "reason": null, "pathType": "WORKSPACE", "access": "write" }),
        ))
        .await;

        let result = check(&client, "/work/project", PathAccess::Write).await.unwrap();
        assert_eq!(result.path_type, Some(PathType::Workspace));
        assert!(is_allowed(&client, "/work/project", PathAccess::Write).await);
    }

    #[tokio::test]
    async fn test_is_allowed_swallows_errors() {
        // Reference backend does not implement paths.check
        let client = reference_client().await;
        assert!(check(&client, "/tmp", PathAccess::Read).await.is_err());
        assert!(!is_allowed(&client, "/tmp", PathAccess::Read).await);
    }

    #[tokio::test]
    async fn test_request_rejects_empty_path() {
        let (client, bridge) = native_client(ScriptedBridge::new()).await;
        let err = request(&client, "  ", PathType::General, PathAccess::Read)
            .await
            .unwrap_err();
        assert!(err.is(codes::INVALID_PAYLOAD));
        assert!(bridge.forwarded_ops().is_empty());
    }

    #[tokio::test]
    async fn test_list_get_remove() {
        let (client, bridge) = native_client(
            ScriptedBridge::new()
                .respond_ok(
                    "paths.list",
                    json!({ "paths": [{ "path": "/data", "pathType": "DATA", "access": "read", "grantId": "g1" }] }),
                )
                .respond_ok("paths.get", json!(null))
                .respond_ok("paths.remove", json!({ "removed": true })),
        )
        .await;

        let paths = list(&client, Some(PathType::Data)).await.unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].grant_id.as_deref(), Some("g1"));

        assert!(get(&client, "/nowhere").await.unwrap().is_none());
        assert!(remove(&client, "/data").await.unwrap());
        assert_eq!(bridge.forwarded_ops(), vec!["paths.list", "paths.get", "paths.remove"]);
    }

    #[test]
    fn test_grant_request_wire_shape() {
        let req = GrantRequest {
            path: "/data".into(),
            path_type: PathType::Data,
            access: PathAccess::Write,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "path": "/data", "pathType": "DATA", "access": "write" })
        );
    }
}

//! Debug utilities (dev builds)

use super::EngineClient;
use crate::ops::{operation, Empty};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevMode {
    pub is_dev_mode: bool,
}

operation!(
    /// debug.isDevMode
    IsDevMode: DebugIsDevMode, Empty => DevMode
);

/// Whether the native side runs in development mode.
///
/// Swallows errors: anything other than a clear "yes" answers `false`, so
/// debug surfaces stay hidden whenever the answer is unknown.
pub async fn is_dev_mode(client: &EngineClient) -> bool {
    match client.call::<IsDevMode>(&Empty {}).await {
        Ok(mode) => mode.is_dev_mode,
        Err(e) => {
            tracing::debug!(op = "client.debug.is_dev_mode.error", code = %e.code, "Assuming production");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SmartBackend;
    use crate::bridge::testing::ScriptedBridge;
    use crate::client::test_support::{native_client, reference_client};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_dev_mode_from_native() {
        let (client, _) =
            native_client(ScriptedBridge::new().respond_ok("debug.isDevMode", json!({ "isDevMode": true }))).await;
        assert!(is_dev_mode(&client).await);
    }

    #[tokio::test]
    async fn test_reference_backend_is_never_dev() {
        let client = reference_client().await;
        assert!(!is_dev_mode(&client).await);
    }

    #[tokio::test]
    async fn test_errors_answer_false() {
        let client = EngineClient::new(Arc::new(SmartBackend::reference_only()));
        assert!(!is_dev_mode(&client).await);
    }
}

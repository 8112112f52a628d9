//! Shared state types
//!
//! Domain types that both backends and the client layer agree on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authentication context from login
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub tenant_id: String,
    pub sub: String,
    pub jwt: String,
    /// Workspace ID (defaults to tenant on the native side when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

/// Home directory state machine
///
/// Derived, never stored: no auth context → `BootstrapPreLogin`; auth but no
/// grant → `AuthenticatedNoHomeGrant`; grant → `HomeGranted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HomeState {
    BootstrapPreLogin,
    AuthenticatedNoHomeGrant,
    HomeGranted,
}

impl HomeState {
    pub fn derive(authenticated: bool, home_granted: bool) -> Self {
        match (authenticated, home_granted) {
            (_, true) => HomeState::HomeGranted,
            (true, false) => HomeState::AuthenticatedNoHomeGrant,
            (false, false) => HomeState::BootstrapPreLogin,
        }
    }
}

/// Which backend the dispatcher is routing to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Not connected; nothing but local-only operations may be dispatched
    #[default]
    Unknown,
    /// Privileged native bridge
    Native,
    /// In-memory reference backend (demo mode)
    Reference,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Unknown => write!(f, "unknown"),
            TransportMode::Native => write!(f, "native"),
            TransportMode::Reference => write!(f, "reference"),
        }
    }
}

// =============================================================================
// Runner State
// =============================================================================

/// Runner loop state (running, stopped, error)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerLoopState {
    Running,
    #[default]
    Stopped,
    Error,
}

/// Local runner status as reported by `runner.status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerStatus {
    pub enabled: bool,
    pub state: RunnerLoopState,
    #[serde(default)]
    pub runner_id: Option<String>,
    #[serde(default)]
    pub engine_url: Option<String>,
    #[serde(default)]
    pub last_poll_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_claim_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_complete_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_task_id: Option<String>,
    #[serde(default)]
    pub last_error: Option<String>,
}

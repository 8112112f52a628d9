//! Operation catalogue
//!
//! Every operation name the UI may send, as one enum. Backends dispatch by
//! matching on [`Op`] instead of on raw strings, so adding an operation forces
//! every backend to decide what to do with it.
//!
//! Typed contracts sit on top: an [`Operation`] pairs an [`Op`] with its
//! request and response types. Client modules declare one marker type per
//! operation with the [`operation!`] macro.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

macro_rules! catalogue {
    ($( $variant:ident => $name:literal ),+ $(,)?) => {
        /// Operation name as sent in the envelope `op` field
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Op {
            $( $variant, )+
        }

        impl Op {
            /// Full catalogue, in declaration order
            pub const ALL: &'static [Op] = &[ $( Op::$variant, )+ ];

            /// Wire name
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Op::$variant => $name, )+
                }
            }
        }

        impl FromStr for Op {
            type Err = UnknownOp;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Op::$variant), )+
                    _ => Err(UnknownOp(s.to_string())),
                }
            }
        }
    };
}

catalogue! {
    // Runtime
    RuntimeInfo => "runtime.info",

    // Setup / onboarding
    SetupStatus => "setup.status",

    // Auth
    AuthSet => "auth.set",
    AuthLogin => "auth.login",
    AuthRefresh => "auth.refresh",
    AuthLogout => "auth.logout",

    // Node identity and session
    NodeSessionEnsureIdentity => "nodeSession.ensureIdentity",
    NodeSessionBootstrap => "nodeSession.bootstrap",
    NodeSessionStatus => "nodeSession.status",

    // Node credentials (OS-level secure storage)
    NodeCredentialsSet => "nodeCredentials.set",
    NodeCredentialsStatus => "nodeCredentials.status",
    NodeCredentialsClear => "nodeCredentials.clear",

    // Home
    HomeStatus => "home.status",
    HomeGrant => "home.grant",

    // Path grants
    PathsCheck => "paths.check",
    PathsList => "paths.list",
    PathsGet => "paths.get",
    PathsRequest => "paths.request",
    PathsRemove => "paths.remove",

    // Vault
    VaultStatus => "vault.status",
    VaultCapabilities => "vault.capabilities",
    VaultSecretsList => "vault.secrets.list",
    VaultSecretsGet => "vault.secrets.get",
    VaultSecretsCreate => "vault.secrets.create",
    VaultSecretsUpdate => "vault.secrets.update",
    VaultSecretsDelete => "vault.secrets.delete",
    VaultSecretsUpsert => "vault.secrets.upsert",
    VaultBundlesList => "vault.bundles.list",
    VaultBundlesGet => "vault.bundles.get",
    VaultBundlesCreate => "vault.bundles.create",
    VaultBundlesRename => "vault.bundles.rename",
    VaultBundlesDelete => "vault.bundles.delete",
    VaultBundlesListSecrets => "vault.bundles.listSecrets",
    VaultBundlesAddSecret => "vault.bundles.addSecret",
    VaultBundlesRemoveSecret => "vault.bundles.removeSecret",
    VaultFilesWriteText => "vault.files.writeText",
    VaultFilesWriteBytes => "vault.files.writeBytes",
    VaultFilesReadText => "vault.files.readText",
    VaultFilesReadBytes => "vault.files.readBytes",
    VaultFilesList => "vault.files.list",
    VaultFilesExists => "vault.files.exists",
    VaultFilesDelete => "vault.files.delete",
    VaultFilesMkdir => "vault.files.mkdir",
    VaultFilesMove => "vault.files.move",
    VaultAttachSecretsToConnector => "vault.attachSecretsToConnector",
    VaultInjectSecretsIntoRun => "vault.injectSecretsIntoRun",
    VaultAuditList => "vault.audit.list",

    // Runner
    RunnerStatus => "runner.status",
    RunnerTaskStats => "runner.taskStats",

    // Workflow runs
    WorkflowRunsCreate => "workflowRuns.create",
    WorkflowRunsGet => "workflowRuns.get",

    // Engine
    EngineStatus => "engine.status",

    // Debug utilities (dev mode only)
    DebugIsDevMode => "debug.isDevMode",
    DebugOpenFolder => "debug.openFolder",
    DebugResolveVaultPath => "debug.resolveVaultPath",
}

/// Operations that must always be served by the native bridge.
///
/// They read or write OS-level secure storage, which the reference backend
/// cannot simulate. Routing one of them anywhere else would report wrong
/// answers such as "credentials not configured" while a real store has them.
pub const LOCAL_ONLY_OPS: &[Op] = &[
    Op::SetupStatus,
    Op::NodeCredentialsStatus,
    Op::NodeCredentialsSet,
    Op::NodeCredentialsClear,
];

impl Op {
    /// Member of [`LOCAL_ONLY_OPS`]
    pub fn is_local_only(self) -> bool {
        LOCAL_ONLY_OPS.contains(&self)
    }

    /// May be answered before `connect()`
    pub fn allowed_while_disconnected(self) -> bool {
        matches!(self, Op::RuntimeInfo)
    }
}

/// Envelope-level check: unknown names are never local-only.
pub fn is_local_only_op(name: &str) -> bool {
    name.parse::<Op>().map(Op::is_local_only).unwrap_or(false)
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation name not in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown operation: {0}")]
pub struct UnknownOp(pub String);

// =============================================================================
// Typed Contracts
// =============================================================================

/// Compile-time pairing of an operation with its payload and result types
pub trait Operation {
    const OP: Op;
    type Request: Serialize + Send + Sync;
    type Response: DeserializeOwned;
}

/// Payload for operations that take no input. Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Empty {}

/// Declare a marker type implementing [`Operation`].
///
/// ```ignore
/// operation!(
///     /// home.grant
///     HomeGrant: HomeGrant, Empty => HomeGrantResult
/// );
/// ```
macro_rules! operation {
    ($(#[$meta:meta])* $name:ident: $op:ident, $req:ty => $resp:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl $crate::ops::Operation for $name {
            const OP: $crate::ops::Op = $crate::ops::Op::$op;
            type Request = $req;
            type Response = $resp;
        }
    };
}

pub(crate) use operation;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_wire_names_round_trip() {
        for op in Op::ALL {
            assert_eq!(op.as_str().parse::<Op>(), Ok(*op));
        }
    }

    #[test]
    fn test_wire_names_are_unique() {
        let names: HashSet<&str> = Op::ALL.iter().map(|op| op.as_str()).collect();
        assert_eq!(names.len(), Op::ALL.len());
    }

    #[test]
    fn test_local_only_set() {
        assert!(is_local_only_op("setup.status"));
        assert!(is_local_only_op("nodeCredentials.set"));
        assert!(is_local_only_op("nodeCredentials.status"));
        assert!(is_local_only_op("nodeCredentials.clear"));
        assert!(!is_local_only_op("home.status"));
        assert!(!is_local_only_op("auth.set"));
        assert!(!is_local_only_op("setup.bogus"));
        assert_eq!(Op::ALL.iter().filter(|op| op.is_local_only()).count(), 4);
    }

    #[test]
    fn test_unknown_op_message_names_the_op() {
        let err = "frobnicate.now".parse::<Op>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown operation: frobnicate.now");
    }

    #[test]
    fn test_empty_serializes_as_object() {
        assert_eq!(serde_json::to_value(Empty {}).unwrap(), serde_json::json!({}));
    }
}

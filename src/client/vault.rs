//! Vault: secrets, bundles, files and audit
//!
//! All vault operations require the HOME grant on the native side
//! (`HOME_GRANT_REQUIRED` otherwise). Secret values are write-only: they go in
//! through create/update/upsert and never come back out; listing returns
//! metadata only.
//!
//! Entity types type the fields the app reads and keep anything else the
//! engine sends in `extra`.

use super::EngineClient;
use crate::error::{codes, SdkError, SdkResult};
use crate::ops::{operation, Empty};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultStatus {
    pub initialized: bool,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultCapabilities {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Secret metadata (never the value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub secret_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

/// Input for secrets.create / secrets.upsert. Sent as the payload itself.
#[derive(Clone, Default, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SecretInput {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

#[derive(Clone, Default, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SecretUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub secret_ids: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Options shared by the file operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recursive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    #[serde(alias = "dir")]
    Directory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub kind: FileKind,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Maps a secret into a connector field or a run's environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretMapping {
    pub secret_id: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    #[serde(default)]
    pub id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditPage {
    #[serde(default)]
    pub events: Vec<AuditEvent>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Payloads and result wrappers
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct WithOpts<T> {
    pub opts: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct ById {
    pub id: String,
}

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct UpdateSecretRequest {
    #[zeroize(skip)]
    pub id: String,
    pub input: SecretUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameBundleRequest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSecretsRequest {
    pub bundle_id: String,
    pub opts: SecretListOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub bundle_id: String,
    pub secret_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteTextRequest {
    pub path: String,
    pub content: String,
    pub opts: FileOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteBytesRequest {
    pub path: String,
    /// Base64 (standard alphabet)
    pub content_bytes: String,
    pub opts: FileOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct PathRequest {
    pub path: String,
    pub opts: FileOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListFilesRequest {
    pub dir: String,
    pub opts: FileListOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    pub opts: FileOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub connector_id: String,
    pub mappings: Vec<SecretMapping>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectRequest {
    pub run_id: String,
    pub mappings: Vec<SecretMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecretList {
    pub secrets: Vec<SecretMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BundleList {
    pub bundles: Vec<Bundle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileList {
    pub entries: Vec<FileEntry>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Written {
    pub written: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Exists {
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Created {
    pub created: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Moved {
    pub moved: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Attached {
    pub attached: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Injected {
    pub injected: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BytesContent {
    pub content_bytes: String,
}

// =============================================================================
// Operations
// =============================================================================

operation!(GetStatus: VaultStatus, Empty => VaultStatus);
operation!(GetCapabilities: VaultCapabilities, Empty => VaultCapabilities);

operation!(ListSecrets: VaultSecretsList, WithOpts<SecretListOptions> => SecretList);
operation!(GetSecret: VaultSecretsGet, ById => SecretMeta);
operation!(CreateSecret: VaultSecretsCreate, SecretInput => SecretMeta);
operation!(UpdateSecret: VaultSecretsUpdate, UpdateSecretRequest => SecretMeta);
operation!(DeleteSecret: VaultSecretsDelete, ById => Deleted);
operation!(UpsertSecret: VaultSecretsUpsert, SecretInput => SecretMeta);

operation!(ListBundles: VaultBundlesList, WithOpts<Map<String, Value>> => BundleList);
operation!(GetBundle: VaultBundlesGet, ById => Bundle);
operation!(CreateBundle: VaultBundlesCreate, BundleInput => Bundle);
operation!(RenameBundle: VaultBundlesRename, RenameBundleRequest => Bundle);
operation!(DeleteBundle: VaultBundlesDelete, ById => Deleted);
operation!(ListBundleSecrets: VaultBundlesListSecrets, BundleSecretsRequest => SecretList);
operation!(AddSecretToBundle: VaultBundlesAddSecret, MembershipRequest => Bundle);
operation!(RemoveSecretFromBundle: VaultBundlesRemoveSecret, MembershipRequest => Bundle);

operation!(WriteText: VaultFilesWriteText, WriteTextRequest => Written);
operation!(WriteBytes: VaultFilesWriteBytes, WriteBytesRequest => Written);
operation!(ReadText: VaultFilesReadText, PathRequest => TextContent);
operation!(ReadBytes: VaultFilesReadBytes, PathRequest => BytesContent);
operation!(ListFiles: VaultFilesList, ListFilesRequest => FileList);
operation!(FileExists: VaultFilesExists, PathRequest => Exists);
operation!(DeleteFile: VaultFilesDelete, PathRequest => Deleted);
operation!(MakeDir: VaultFilesMkdir, PathRequest => Created);
operation!(MoveFile: VaultFilesMove, MoveRequest => Moved);

operation!(AttachSecrets: VaultAttachSecretsToConnector, AttachRequest => Attached);
operation!(InjectSecrets: VaultInjectSecretsIntoRun, InjectRequest => Injected);
operation!(ListAudit: VaultAuditList, WithOpts<AuditListOptions> => AuditPage);

fn by_id(id: &str) -> ById {
    ById { id: id.to_string() }
}

fn at(path: &str, opts: FileOptions) -> PathRequest {
    PathRequest {
        path: path.to_string(),
        opts,
    }
}

pub async fn status(client: &EngineClient) -> SdkResult<VaultStatus> {
    client.call::<GetStatus>(&Empty {}).await
}

pub async fn capabilities(client: &EngineClient) -> SdkResult<VaultCapabilities> {
    client.call::<GetCapabilities>(&Empty {}).await
}

// -----------------------------------------------------------------------------
// Secrets
// -----------------------------------------------------------------------------

pub async fn list_secrets(client: &EngineClient, opts: SecretListOptions) -> SdkResult<Vec<SecretMeta>> {
    Ok(client.call::<ListSecrets>(&WithOpts { opts }).await?.secrets)
}

pub async fn get_secret(client: &EngineClient, id: &str) -> SdkResult<SecretMeta> {
    client.call::<GetSecret>(&by_id(id)).await
}

pub async fn create_secret(client: &EngineClient, input: &SecretInput) -> SdkResult<SecretMeta> {
    let meta = client.call::<CreateSecret>(input).await?;
    tracing::info!(op = "client.vault.secret.created", secret_id = %meta.id, "Secret created");
    Ok(meta)
}

pub async fn update_secret(client: &EngineClient, id: &str, input: SecretUpdate) -> SdkResult<SecretMeta> {
    let req = UpdateSecretRequest {
        id: id.to_string(),
        input,
    };
    client.call::<UpdateSecret>(&req).await
}

pub async fn delete_secret(client: &EngineClient, id: &str) -> SdkResult<bool> {
    Ok(client.call::<DeleteSecret>(&by_id(id)).await?.deleted)
}

/// Create by name, or replace the value of the existing secret with that name.
pub async fn upsert_secret(client: &EngineClient, input: &SecretInput) -> SdkResult<SecretMeta> {
    client.call::<UpsertSecret>(input).await
}

// -----------------------------------------------------------------------------
// Bundles
// -----------------------------------------------------------------------------

pub async fn list_bundles(client: &EngineClient) -> SdkResult<Vec<Bundle>> {
    Ok(client
        .call::<ListBundles>(&WithOpts { opts: Map::new() })
        .await?
        .bundles)
}

pub async fn get_bundle(client: &EngineClient, id: &str) -> SdkResult<Bundle> {
    client.call::<GetBundle>(&by_id(id)).await
}

pub async fn create_bundle(client: &EngineClient, input: &BundleInput) -> SdkResult<Bundle> {
    client.call::<CreateBundle>(input).await
}

pub async fn rename_bundle(client: &EngineClient, id: &str, name: &str) -> SdkResult<Bundle> {
    let req = RenameBundleRequest {
        id: id.to_string(),
        name: name.to_string(),
    };
    client.call::<RenameBundle>(&req).await
}

pub async fn delete_bundle(client: &EngineClient, id: &str) -> SdkResult<bool> {
    Ok(client.call::<DeleteBundle>(&by_id(id)).await?.deleted)
}

pub async fn list_bundle_secrets(
    client: &EngineClient,
    bundle_id: &str,
    opts: SecretListOptions,
) -> SdkResult<Vec<SecretMeta>> {
    let req = BundleSecretsRequest {
        bundle_id: bundle_id.to_string(),
        opts,
    };
    Ok(client.call::<ListBundleSecrets>(&req).await?.secrets)
}

fn membership(bundle_id: &str, secret_id: &str) -> MembershipRequest {
    MembershipRequest {
        bundle_id: bundle_id.to_string(),
        secret_id: secret_id.to_string(),
    }
}

pub async fn add_secret_to_bundle(client: &EngineClient, bundle_id: &str, secret_id: &str) -> SdkResult<Bundle> {
    client
        .call::<AddSecretToBundle>(&membership(bundle_id, secret_id))
        .await
}

pub async fn remove_secret_from_bundle(
    client: &EngineClient,
    bundle_id: &str,
    secret_id: &str,
) -> SdkResult<Bundle> {
    client
        .call::<RemoveSecretFromBundle>(&membership(bundle_id, secret_id))
        .await
}

// -----------------------------------------------------------------------------
// Files
// -----------------------------------------------------------------------------

pub async fn write_text(client: &EngineClient, path: &str, content: &str, opts: FileOptions) -> SdkResult<()> {
    let req = WriteTextRequest {
        path: path.to_string(),
        content: content.to_string(),
        opts,
    };
    client.call::<WriteText>(&req).await?;
    Ok(())
}

pub async fn write_bytes(client: &EngineClient, path: &str, bytes: &[u8], opts: FileOptions) -> SdkResult<()> {
    let req = WriteBytesRequest {
        path: path.to_string(),
        content_bytes: base64::engine::general_purpose::STANDARD.encode(bytes),
        opts,
    };
    client.call::<WriteBytes>(&req).await?;
    Ok(())
}

pub async fn read_text(client: &EngineClient, path: &str, opts: FileOptions) -> SdkResult<String> {
    Ok(client.call::<ReadText>(&at(path, opts)).await?.content)
}

pub async fn read_bytes(client: &EngineClient, path: &str, opts: FileOptions) -> SdkResult<Vec<u8>> {
    let encoded = client.call::<ReadBytes>(&at(path, opts)).await?.content_bytes;
    base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| SdkError::new(codes::INTERNAL_ERROR, format!("Invalid base64 file content: {}", e)))
}

/// List a vault directory. An empty `dir` lists the root.
pub async fn list_files(client: &EngineClient, dir: &str, opts: FileListOptions) -> SdkResult<Vec<FileEntry>> {
    let req = ListFilesRequest {
        dir: dir.to_string(),
        opts,
    };
    Ok(client.call::<ListFiles>(&req).await?.entries)
}

pub async fn file_exists(client: &EngineClient, path: &str, opts: FileOptions) -> SdkResult<bool> {
    Ok(client.call::<FileExists>(&at(path, opts)).await?.exists)
}

pub async fn delete_file(client: &EngineClient, path: &str, opts: FileOptions) -> SdkResult<bool> {
    Ok(client.call::<DeleteFile>(&at(path, opts)).await?.deleted)
}

pub async fn mkdir(client: &EngineClient, path: &str, opts: FileOptions) -> SdkResult<()> {
    client.call::<MakeDir>(&at(path, opts)).await?;
    Ok(())
}

pub async fn move_file(client: &EngineClient, from: &str, to: &str, opts: FileOptions) -> SdkResult<()> {
    let req = MoveRequest {
        from: from.to_string(),
        to: to.to_string(),
        opts,
    };
    client.call::<MoveFile>(&req).await?;
    Ok(())
}

// -----------------------------------------------------------------------------
// Connectors, runs, audit
// -----------------------------------------------------------------------------

pub async fn attach_secrets_to_connector(
    client: &EngineClient,
    connector_id: &str,
    mappings: Vec<SecretMapping>,
) -> SdkResult<()> {
    let req = AttachRequest {
        connector_id: connector_id.to_string(),
        mappings,
    };
    client.call::<AttachSecrets>(&req).await?;
    Ok(())
}

/// Inject secrets into a workflow run's environment. The resolved values stay
/// on the native side.
pub async fn inject_secrets_into_run(
    client: &EngineClient,
    run_id: &str,
    mappings: Vec<SecretMapping>,
) -> SdkResult<()> {
    let req = InjectRequest {
        run_id: run_id.to_string(),
        mappings,
    };
    client.call::<InjectSecrets>(&req).await?;
    Ok(())
}

pub async fn list_audit(client: &EngineClient, opts: AuditListOptions) -> SdkResult<AuditPage> {
    client.call::<ListAudit>(&WithOpts { opts }).await
}

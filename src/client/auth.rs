//! Authentication
//!
//! `login`, `refresh` and `logout` are proxied by the native side so refresh
//! tokens and passwords never pass through host logic. `set_context` hands the
//! resulting identity to whichever backend is active.

use super::{Ack, EngineClient};
use crate::error::SdkResult;
use crate::ops::operation;
use crate::state::AuthContext;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoginUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoginTenant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Login result. Only the fields the app relies on are typed; the rest of
/// the server payload is kept in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoginResult {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
    #[serde(default)]
    pub tenant: Option<LoginTenant>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoginResult {
    /// Auth context for `set_context`, if the server returned enough to build one.
    pub fn auth_context(&self) -> Option<AuthContext> {
        Some(AuthContext {
            tenant_id: self.tenant.as_ref()?.id.clone(),
            sub: self.user.as_ref()?.id.clone(),
            jwt: self.access_token.clone()?,
            workspace_id: None,
        })
    }
}

#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct TokenRequest {
    pub refresh_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenPair {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

operation!(
    /// auth.set
    SetAuthContext: AuthSet, AuthContext => Ack
);
operation!(
    /// auth.login
    Login: AuthLogin, LoginRequest => LoginResult
);
operation!(
    /// auth.refresh
    Refresh: AuthRefresh, TokenRequest => TokenPair
);
operation!(
    /// auth.logout
    Logout: AuthLogout, TokenRequest => Value
);

pub async fn login(client: &EngineClient, identifier: &str, password: &str) -> SdkResult<LoginResult> {
    let req = LoginRequest {
        identifier: identifier.to_string(),
        password: password.to_string(),
    };
    client.call::<Login>(&req).await
}

/// Propagate the logged-in identity to the backend.
pub async fn set_context(client: &EngineClient, ctx: &AuthContext) -> SdkResult<()> {
    client.call::<SetAuthContext>(ctx).await?;
    tracing::info!(
        op = "client.auth.context_set",
        tenant_id = %ctx.tenant_id,
        "Auth context propagated"
    );
    Ok(())
}

pub async fn refresh(client: &EngineClient, refresh_token: &str, jwt: Option<&str>) -> SdkResult<TokenPair> {
    let req = TokenRequest {
        refresh_token: refresh_token.to_string(),
        jwt: jwt.map(str::to_string),
    };
    client.call::<Refresh>(&req).await
}

/// Best-effort server-side logout. Failures are logged and swallowed so local
/// state cleanup always proceeds.
pub async fn logout(client: &EngineClient, refresh_token: &str, jwt: Option<&str>) {
    let req = TokenRequest {
        refresh_token: refresh_token.to_string(),
        jwt: jwt.map(str::to_string),
    };
    if let Err(e) = client.call::<Logout>(&req).await {
        tracing::warn!(
            op = "client.auth.logout_failed",
            code = %e.code,
            "Logout notification failed (ignored)"
        );
    }
}

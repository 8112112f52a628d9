//! Application bootstrap
//!
//! Sequences app startup: setup check → connect → login check → auth context
//! propagation → HOME grant check → ready.
//!
//! ```text
//! Loading ──setup incomplete──────────────────────────▶ Setup
//! Loading ──connect──▶ home.status ──pre-login──────────▶ Login
//! Login ──login──▶ AUTHENTICATED_NO_HOME_GRANT ─────────▶ HomeSetup
//! Login / HomeSetup ──HOME_GRANTED──────────────────────▶ Ready
//! Loading ──connect fails──▶ setup still incomplete? ──▶ Setup (banner)
//!                                         otherwise ──▶ Login (banner)
//! ```
//!
//! `Setup` and `Login` are re-entrant. There is no automatic retry: after a
//! failure the driver waits for the next user action.

use crate::client::{auth, home, node_credentials, setup, EngineClient};
use crate::error::{codes, SdkError, SdkResult};
use crate::state::{AuthContext, HomeState};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AppPhase {
    Loading,
    /// Node credentials missing; onboarding wizard
    Setup,
    Login,
    /// Logged in, HOME grant missing
    HomeSetup,
    Ready,
}

impl fmt::Display for AppPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppPhase::Loading => "loading",
            AppPhase::Setup => "setup",
            AppPhase::Login => "login",
            AppPhase::HomeSetup => "homeSetup",
            AppPhase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Outcome of a setup.status probe
enum SetupCheck {
    Complete,
    Incomplete,
    /// No native bridge to ask (demo mode): there is nothing to set up
    NotApplicable,
    Failed(SdkError),
}

/// Bootstrap driver. Owns the current phase and the last error to display.
pub struct AppBootstrap {
    client: EngineClient,
    phase: AppPhase,
    banner: Option<SdkError>,
    auth: Option<AuthContext>,
}

impl AppBootstrap {
    pub fn new(client: EngineClient) -> Self {
        Self {
            client,
            phase: AppPhase::Loading,
            banner: None,
            auth: None,
        }
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    /// Non-fatal error to show alongside the current phase
    pub fn banner(&self) -> Option<&SdkError> {
        self.banner.as_ref()
    }

    pub fn client(&self) -> &EngineClient {
        &self.client
    }

    pub fn auth(&self) -> Option<&AuthContext> {
        self.auth.as_ref()
    }

    /// Run the startup sequence until it needs user input.
    pub async fn start(&mut self) -> AppPhase {
        self.enter(AppPhase::Loading, None);

        match self.check_setup().await {
            SetupCheck::Incomplete => return self.enter(AppPhase::Setup, None),
            SetupCheck::Failed(err) => return self.enter(AppPhase::Setup, Some(err)),
            SetupCheck::Complete | SetupCheck::NotApplicable => {}
        }

        self.client.connect().await;

        match home::status(&self.client).await {
            Ok(status) => {
                let next = match status.state {
                    HomeState::BootstrapPreLogin => AppPhase::Login,
                    HomeState::AuthenticatedNoHomeGrant => AppPhase::HomeSetup,
                    HomeState::HomeGranted => AppPhase::Ready,
                };
                self.enter(next, None)
            }
            Err(err) => self.recover_from_connect_failure(err).await,
        }
    }

    /// Store node credentials, then restart the sequence.
    pub async fn complete_setup(&mut self, node_id: &str, node_secret: &str) -> SdkResult<AppPhase> {
        self.expect_phase(&[AppPhase::Setup], "complete setup")?;

        if let Err(err) = node_credentials::set(&self.client, node_id, node_secret).await {
            self.banner = Some(err.clone());
            return Err(err);
        }

        Ok(self.start().await)
    }

    /// Propagate a freshly logged-in identity and move on by HOME state.
    pub async fn login(&mut self, ctx: AuthContext) -> SdkResult<AppPhase> {
        self.expect_phase(&[AppPhase::Login], "log in")?;

        if let Err(err) = auth::set_context(&self.client, &ctx).await {
            self.banner = Some(err.clone());
            return Err(err);
        }
        self.auth = Some(ctx);

        self.advance_by_home_state().await
    }

    /// Request the HOME grant.
    pub async fn grant_home(&mut self) -> SdkResult<AppPhase> {
        self.expect_phase(&[AppPhase::HomeSetup], "grant HOME")?;

        if let Err(err) = home::grant(&self.client).await {
            self.banner = Some(err.clone());
            return Err(err);
        }

        self.advance_by_home_state().await
    }

    /// Log out and return to `Login`.
    ///
    /// Only valid once setup is done (`Login`, `HomeSetup`, `Ready`). From
    /// there it always succeeds: the server notification is best-effort and
    /// the local session is reset regardless.
    pub async fn logout(&mut self, refresh_token: Option<&str>) -> SdkResult<AppPhase> {
        self.expect_phase(&[AppPhase::Login, AppPhase::HomeSetup, AppPhase::Ready], "log out")?;

        if let Some(token) = refresh_token {
            let jwt = self.auth.as_ref().map(|ctx| ctx.jwt.clone());
            auth::logout(&self.client, token, jwt.as_deref()).await;
        }
        self.auth = None;

        // A fresh session drops the backend's auth context and grant
        self.client.disconnect().await;
        self.client.connect().await;

        Ok(self.enter(AppPhase::Login, None))
    }

    async fn advance_by_home_state(&mut self) -> SdkResult<AppPhase> {
        let status = match home::status(&self.client).await {
            Ok(status) => status,
            Err(err) => {
                self.banner = Some(err.clone());
                return Err(err);
            }
        };

        let next = match status.state {
            HomeState::HomeGranted => AppPhase::Ready,
            HomeState::AuthenticatedNoHomeGrant => AppPhase::HomeSetup,
            HomeState::BootstrapPreLogin => AppPhase::Login,
        };
        Ok(self.enter(next, None))
    }

    async fn recover_from_connect_failure(&mut self, err: SdkError) -> AppPhase {
        tracing::warn!(
            op = "bootstrap.connect.failed",
            code = %err.code,
            "Connection check failed, re-checking setup"
        );

        match self.check_setup().await {
            SetupCheck::Complete | SetupCheck::NotApplicable => self.enter(AppPhase::Login, Some(err)),
            SetupCheck::Incomplete | SetupCheck::Failed(_) => self.enter(AppPhase::Setup, Some(err)),
        }
    }

    async fn check_setup(&self) -> SetupCheck {
        match setup::status(&self.client).await {
            Ok(status) if status.setup_complete => SetupCheck::Complete,
            Ok(_) => SetupCheck::Incomplete,
            Err(err) if err.is(codes::TAURI_NOT_READY) => {
                tracing::debug!(op = "bootstrap.setup.skipped", "No native bridge, skipping setup");
                SetupCheck::NotApplicable
            }
            Err(err) => SetupCheck::Failed(err),
        }
    }

    fn expect_phase(&self, allowed: &[AppPhase], action: &str) -> SdkResult<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(SdkError::validation(
                codes::INVALID_OP,
                format!("Cannot {} in the {} phase", action, self.phase),
            ))
        }
    }

    fn enter(&mut self, next: AppPhase, banner: Option<SdkError>) -> AppPhase {
        if next != self.phase {
            tracing::info!(
                op = "bootstrap.phase",
                from = %self.phase,
                to = %next,
                banner = banner.as_ref().map(|e| e.code.as_str()).unwrap_or(""),
                "Phase changed"
            );
        }
        self.phase = next;
        self.banner = banner;
        next
    }
}

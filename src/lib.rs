//! EKKA Desktop SDK
//!
//! Every UI-facing operation is expressed as a versioned request envelope and
//! dispatched by [`SmartBackend`] to either the privileged native bridge or an
//! in-memory reference backend (demo mode). Typed per-area clients live under
//! [`client`]; app startup is driven by [`AppBootstrap`].

pub mod backend;
pub mod bootstrap;
pub mod bridge;
pub mod client;
pub mod config;
pub mod core_process;
pub mod error;
pub mod ops;
pub mod reference;
pub mod state;
pub mod types;

pub use backend::SmartBackend;
pub use bootstrap::{AppBootstrap, AppPhase};
pub use client::EngineClient;
pub use config::DesktopConfig;
pub use error::{SdkError, SdkResult};
pub use state::{AuthContext, HomeState, TransportMode};
pub use types::{make_request, EngineRequest, EngineResponse};

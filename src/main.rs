//! EKKA Desktop - headless entry point
//!
//! # Startup Order
//!
//! 1. Load `.env.local` and initialize tracing (logs go to stderr)
//! 2. Resolve configuration (`--demo` forces the reference backend)
//! 3. Build the dispatcher, spawning Desktop Core on first connect
//! 4. Run the bootstrap sequence and print where it stopped as JSON
//!
//! The UI shell drives the remaining transitions (setup, login, HOME grant).

use anyhow::Context;
use ekka_desktop_sdk::config::BridgeMode;
use ekka_desktop_sdk::{AppBootstrap, DesktopConfig, EngineClient, SmartBackend};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::from_filename(".env.local").is_err() {
        let _ = dotenvy::from_filename("../.env.local");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ekka_desktop_sdk=info".parse()?)
                .add_directive("ekka_desktop=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mut config = DesktopConfig::from_env().context("invalid desktop configuration")?;
    if std::env::args().skip(1).any(|arg| arg == "--demo") {
        config.bridge_mode = BridgeMode::Reference;
    }

    tracing::info!(
        op = "desktop.startup",
        app = %config.app_name,
        environment = %config.environment,
        dev_mode = config.is_dev_mode(),
        "EKKA Desktop starting"
    );

    let backend = Arc::new(SmartBackend::from_config(&config));
    let mut app = AppBootstrap::new(EngineClient::new(backend));
    let phase = app.start().await;

    let report = json!({
        "phase": phase,
        "mode": app.client().mode(),
        "banner": app.banner().map(|e| json!({ "code": e.code, "message": e.message })),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    app.client().disconnect().await;
    tracing::info!(op = "desktop.shutdown", "EKKA Desktop stopped");
    Ok(())
}

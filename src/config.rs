//! App configuration
//!
//! Values come from the process environment at startup. Build-time values
//! (baked with `option_env!`) act as defaults, so a packaged build can ship
//! its branding without any runtime environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

macro_rules! baked_or {
    ($name:ident, $env:literal, $default:literal) => {
        pub fn $name() -> &'static str {
            option_env!($env).unwrap_or($default)
        }
    };
}

// App display name (e.g., "EKKA Studio")
baked_or!(baked_app_name, "EKKA_APP_NAME", "EKKA Desktop");

// Deployment environment ("development" enables dev mode)
baked_or!(baked_environment, "EKKA_ENV", "production");

/// Default per-request timeout for the stdio bridge
pub const DEFAULT_BRIDGE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Whether to probe the native bridge at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BridgeMode {
    /// Probe the native bridge, fall back to the reference backend
    #[default]
    Auto,
    /// Never probe; reference backend only (demo mode)
    Reference,
}

impl FromStr for BridgeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "reference" | "demo" => Ok(Self::Reference),
            _ => Err(ConfigError::InvalidValue {
                key: "EKKA_BRIDGE_MODE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopConfig {
    pub app_name: String,
    /// Explicit Desktop Core binary (`EKKA_DESKTOP_CORE_BIN`)
    pub core_bin: Option<PathBuf>,
    pub bridge_timeout: Duration,
    pub bridge_mode: BridgeMode,
    pub environment: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            app_name: baked_app_name().to_string(),
            core_bin: None,
            bridge_timeout: Duration::from_secs(DEFAULT_BRIDGE_TIMEOUT_SECS),
            bridge_mode: BridgeMode::Auto,
            environment: baked_environment().to_string(),
        }
    }
}

impl DesktopConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(name) = get("EKKA_APP_NAME") {
            config.app_name = name;
        }
        if let Some(path) = get("EKKA_DESKTOP_CORE_BIN") {
            config.core_bin = Some(PathBuf::from(path));
        }
        if let Some(raw) = get("EKKA_BRIDGE_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: "EKKA_BRIDGE_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            config.bridge_timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = get("EKKA_BRIDGE_MODE") {
            config.bridge_mode = mode.parse()?;
        }
        if let Some(env) = get("EKKA_ENV") {
            config.environment = env;
        }

        Ok(config)
    }

    pub fn is_dev_mode(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

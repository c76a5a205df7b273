//! Configuration system (layered: defaults < TOML file < env).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::route::RouteTable;

const ENV_PREFIX: &str = "SESSIONGATE_";

/// How strictly email verification gates navigation and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationPolicy {
    /// Treat authenticated but unverified identities as signed out when
    /// resolving routes.
    pub require_verified_email: bool,
    /// End the provider session after an unverified sign-in or a fresh
    /// registration.
    pub end_unverified_sessions: bool,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            require_verified_email: true,
            end_unverified_sessions: true,
        }
    }
}

/// Credential flow tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// How long a sign-in waits for the session controller to report the
    /// new identity. `0` disables the wait.
    pub settle_timeout_ms: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            settle_timeout_ms: 5_000,
        }
    }
}

impl FlowSettings {
    pub fn settle_timeout(&self) -> Option<Duration> {
        (self.settle_timeout_ms > 0).then(|| Duration::from_millis(self.settle_timeout_ms))
    }
}

/// Top-level configuration.
///
/// ```toml
/// [routes]
/// auth_path = "/auth"
/// home_path = "/home"
/// profile_path = "/user"
///
/// [policy]
/// require_verified_email = true
/// end_unverified_sessions = true
///
/// [flow]
/// settle_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub routes: RouteTable,
    pub policy: VerificationPolicy,
    pub flow: FlowSettings,
}

impl GateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file path (~/.sessiongate/config.toml).
    pub fn default_config_path() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(".sessiongate"))
            .unwrap_or_else(|| PathBuf::from(".sessiongate"))
            .join("config.toml")
    }

    /// Parse a TOML config file.
    ///
    /// Returns the defaults if the file does not exist.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(GateError::Io(err)),
        };
        Self::from_toml_str(&raw).map_err(|err| match err {
            GateError::Configuration(msg) => {
                GateError::Configuration(format!("{msg} (in {})", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, GateError> {
        toml::from_str(raw).map_err(|err| GateError::Configuration(err.to_string()))
    }

    /// Defaults overridden by `SESSIONGATE_*` environment variables.
    pub fn from_env() -> Result<Self, GateError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Full layering: file (explicit or default path), then environment.
    pub fn load(path: Option<&Path>) -> Result<Self, GateError> {
        let _ = dotenvy::dotenv();
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, keyed by full variable name.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(path) = var("AUTH_PATH") {
            self.routes.auth_path = path;
        }
        if let Some(path) = var("HOME_PATH") {
            self.routes.home_path = path;
        }
        if let Some(path) = var("PROFILE_PATH") {
            self.routes.profile_path = path;
        }
        if let Some(value) = var("REQUIRE_VERIFIED_EMAIL") {
            self.policy.require_verified_email = parse_bool("REQUIRE_VERIFIED_EMAIL", &value)?;
        }
        if let Some(value) = var("END_UNVERIFIED_SESSIONS") {
            self.policy.end_unverified_sessions = parse_bool("END_UNVERIFIED_SESSIONS", &value)?;
        }
        if let Some(value) = var("SETTLE_TIMEOUT_MS") {
            self.flow.settle_timeout_ms = value.trim().parse().map_err(|_| {
                GateError::Configuration(format!(
                    "{ENV_PREFIX}SETTLE_TIMEOUT_MS must be a number of milliseconds, got {value:?}"
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), GateError> {
        self.routes.validate()
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, GateError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GateError::Configuration(format!(
            "{ENV_PREFIX}{name} must be a boolean, got {value:?}"
        ))),
    }
}

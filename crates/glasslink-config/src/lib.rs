//! Shared configuration for the glasslink CLI.
//!
//! TOML profiles, WiFi credential resolution (env + plaintext), and
//! translation to `glasslink_core::SessionConfig`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use glasslink_api::WifiCredentials;
use glasslink_core::{RetryPolicy, SessionConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no WiFi credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by explicit name, or fall back to the default
    /// profile; a missing default resolves to a built-in profile.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        match name {
            Some(n) => self
                .profiles
                .get(n)
                .cloned()
                .map(|p| (n.to_string(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { profile: n.into() }),
            None => {
                let n = self.default_profile.as_deref().unwrap_or("default");
                Ok((
                    n.to_string(),
                    self.profiles.get(n).cloned().unwrap_or_default(),
                ))
            }
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Network join timeout in seconds, unless a profile overrides it.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    45
}

/// A named device profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Device base URL on its hotspot network.
    #[serde(default = "default_device_url")]
    pub device_url: String,

    /// Hotspot SSID, for connecting without a short-range negotiation.
    pub ssid: Option<String>,

    /// Hotspot password (plaintext — prefer env).
    pub password: Option<String>,

    /// Environment variable name containing the hotspot password.
    pub password_env: Option<String>,

    /// Credential exchange timeout in seconds.
    pub credential_timeout: Option<u64>,

    /// Network join timeout in seconds.
    pub join_timeout: Option<u64>,

    /// Reachability probe retries after the first attempt.
    pub reachability_retries: Option<u32>,

    /// Delay between reachability probes, in seconds.
    pub reachability_delay: Option<u64>,

    /// Health check retries after the first attempt.
    pub status_retries: Option<u32>,

    /// Delay between health checks, in seconds.
    pub status_delay: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            device_url: default_device_url(),
            ssid: None,
            password: None,
            password_env: None,
            credential_timeout: None,
            join_timeout: None,
            reachability_retries: None,
            reachability_delay: None,
            status_retries: None,
            status_delay: None,
        }
    }
}

fn default_device_url() -> String {
    "http://192.168.4.1".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "glasslink", "glasslink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("glasslink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("GLASSLINK_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve pre-shared WiFi credentials from a profile, if it has any.
///
/// Chain: `password_env` → env var, then plaintext `password`. A profile
/// without an SSID has nothing to resolve — the session negotiates over
/// the short-range link instead.
pub fn resolve_wifi_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<WifiCredentials>, ConfigError> {
    let Some(ref ssid) = profile.ssid else {
        return Ok(None);
    };

    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(Some(WifiCredentials::new(ssid.clone(), pw)));
        }
    }

    // 2. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(Some(WifiCredentials::new(ssid.clone(), pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve a plain password for a profile, used where the CLI needs the
/// SSID and password separately.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_wifi_credentials(profile, profile_name)?
        .map(|c| c.password)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

// ── Session config translation ──────────────────────────────────────

/// Build a `SessionConfig` from a profile — no CLI flag overrides.
///
/// The join timeout falls back through profile → `[defaults]` → built-in.
pub fn profile_to_session_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let device_url: url::Url = profile
        .device_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "device_url".into(),
            reason: format!("invalid URL: {}", profile.device_url),
        })?;

    let mut config = SessionConfig {
        device_url,
        ..SessionConfig::default()
    };

    if let Some(secs) = profile.credential_timeout {
        config.credential_timeout = Duration::from_secs(secs);
    }
    config.join_timeout = Duration::from_secs(profile.join_timeout.unwrap_or(defaults.timeout));
    if profile.reachability_retries.is_some() || profile.reachability_delay.is_some() {
        config.reachability = RetryPolicy::new(
            profile
                .reachability_retries
                .unwrap_or(config.reachability.max_retries),
            profile
                .reachability_delay
                .map_or(config.reachability.retry_delay, Duration::from_secs),
        );
    }
    if profile.status_retries.is_some() || profile.status_delay.is_some() {
        config.status_check = RetryPolicy::new(
            profile
                .status_retries
                .unwrap_or(config.status_check.max_retries),
            profile
                .status_delay
                .map_or(config.status_check.retry_delay, Duration::from_secs),
        );
    }

    Ok(config)
}

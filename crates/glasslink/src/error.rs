//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use glasslink_config::ConfigError;
use glasslink_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not obtain WiFi credentials from the device: {reason}")]
    #[diagnostic(
        code(glasslink::credential_exchange),
        help(
            "Bring the glasses close to this host, or skip negotiation:\n\
             configure ssid/password in a profile, or pass --ssid/--password."
        )
    )]
    CredentialExchange { reason: String },

    #[error("Could not join network '{ssid}': {reason}")]
    #[diagnostic(
        code(glasslink::join_failed),
        help(
            "Check that the glasses' hotspot is up (double-press the power\n\
             button) and that this host's WiFi adapter is free."
        )
    )]
    JoinFailed { ssid: String, reason: String },

    #[error("Device at {url} is not responding")]
    #[diagnostic(
        code(glasslink::unreachable),
        help(
            "The network join succeeded but the device never answered.\n\
             Reason: {reason}\n\
             Try: glasslink status --retries 5"
        )
    )]
    Unreachable { url: String, reason: String },

    #[error("Lost contact with the device: {message}")]
    #[diagnostic(code(glasslink::transport))]
    Transport { message: String },

    #[error("Not connected to a device")]
    #[diagnostic(
        code(glasslink::not_connected),
        help("Run: glasslink connect")
    )]
    NotConnected,

    // ── Operation lifecycle ──────────────────────────────────────────

    #[error("Another operation is already in flight")]
    #[diagnostic(
        code(glasslink::busy),
        help("Wait for the current operation to finish, or cancel it first.")
    )]
    Busy,

    #[error("Session is in state '{state}' and must be reset first")]
    #[diagnostic(code(glasslink::reset_required))]
    ResetRequired { state: String },

    #[error("Operation cancelled")]
    #[diagnostic(code(glasslink::cancelled))]
    Cancelled,

    #[error("{phase} timed out after {seconds}s")]
    #[diagnostic(
        code(glasslink::timeout),
        help("Increase the bound with --timeout or the profile's timeout settings.")
    )]
    Timeout { phase: String, seconds: u64 },

    // ── Device ───────────────────────────────────────────────────────

    #[error("Device failed its health check: {reason}")]
    #[diagnostic(
        code(glasslink::unhealthy),
        help(
            "The device is reachable but not ready to serve media.\n\
             Give it a moment and run: glasslink status"
        )
    )]
    Unhealthy { reason: String },

    #[error("Device rejected '{action}': {message}")]
    #[diagnostic(code(glasslink::rejected))]
    Rejected { action: String, message: String },

    #[error("Failed to store '{name}'")]
    #[diagnostic(
        code(glasslink::media_store),
        help("Check free space and permissions on the destination directory.")
    )]
    MediaStore {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(glasslink::validation))]
    Validation { field: String, reason: String },

    #[error("No WiFi credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(glasslink::no_credentials),
        help(
            "Set password (or password_env) next to ssid in the profile,\n\
             or remove ssid to negotiate credentials over the link."
        )
    )]
    NoCredentials { profile: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(glasslink::profile_not_found),
        help("List configured profiles with: glasslink config show")
    )]
    ProfileNotFound { name: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(glasslink::config))]
    Config { message: String },

    // ── IO / internal ────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(glasslink::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CredentialExchange { .. }
            | Self::JoinFailed { .. }
            | Self::Unreachable { .. }
            | Self::Transport { .. }
            | Self::NotConnected => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Busy => CliError::Busy,

            CoreError::ResetRequired { state } => CliError::ResetRequired { state },

            CoreError::Cancelled => CliError::Cancelled,

            CoreError::CredentialExchangeFailed { reason } => {
                CliError::CredentialExchange { reason }
            }

            CoreError::JoinFailed { ssid, reason } => CliError::JoinFailed { ssid, reason },

            CoreError::DeviceUnreachable { url, reason } => CliError::Unreachable { url, reason },

            CoreError::Timeout {
                phase,
                timeout_secs,
            } => CliError::Timeout {
                phase: phase.into(),
                seconds: timeout_secs,
            },

            CoreError::NotConnected => CliError::NotConnected,

            CoreError::UnhealthyDevice { reason } => CliError::Unhealthy { reason },

            CoreError::ActionRejected { action, message } => {
                CliError::Rejected { action, message }
            }

            CoreError::Transport { message } => CliError::Transport { message },

            CoreError::MediaStore { name, source } => CliError::MediaStore { name, source },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },

            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },

            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound { name: profile },

            ConfigError::Io(e) => CliError::Io(e),

            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

use thiserror::Error;

/// Top-level error type for the `glasslink-api` crate.
///
/// Covers every transport-level failure mode: the short-range link, the
/// network join primitive, and the device-local HTTP interface.
/// `glasslink-core` maps these into session-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Short-range link ────────────────────────────────────────────
    /// The short-range link is not paired, powered, or otherwise usable.
    #[error("Short-range link unavailable: {reason}")]
    LinkUnavailable { reason: String },

    /// The credential exchange over the short-range link was refused.
    #[error("Credential exchange refused: {reason}")]
    CredentialsRefused { reason: String },

    // ── Network join ────────────────────────────────────────────────
    /// The host network stack rejected or failed the join operation.
    #[error("Network join failed for '{ssid}': {reason}")]
    NetworkJoin { ssid: String, reason: String },

    // ── HTTP transport ──────────────────────────────────────────────
    /// HTTP transport error (connection refused, reset, DNS, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded its allotted time.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data ────────────────────────────────────────────────────────
    /// Response body could not be parsed, with the raw body for debugging.
    #[error("Malformed device response: {message}")]
    MalformedResponse { message: String, body: String },

    /// The device acknowledged the request but refused to perform it.
    #[error("Device rejected {action}: {message}")]
    DeviceRejected { action: String, message: String },
}

impl Error {
    /// Returns `true` if the failure happened before reaching the device
    /// (as opposed to the device answering and refusing).
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout { .. } | Self::LinkUnavailable { .. }
        )
    }
}

// ── Core error types ──
//
// Session-facing errors. Transport failures never cross this boundary raw:
// the `From<glasslink_api::Error>` impl translates them into domain
// variants, and every variant renders a human-readable message suitable
// for direct display.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Arbitration ──────────────────────────────────────────────────
    /// A negotiation or connection attempt was requested while one was
    /// already in flight. Rejected synchronously; no state change.
    #[error("Another operation is already in progress")]
    Busy,

    /// The session reached Connected or Failed; a fresh attempt needs an
    /// explicit reset first.
    #[error("Session is in state '{state}' -- reset before starting a new attempt")]
    ResetRequired { state: String },

    /// The operation was aborted by an explicit cancellation.
    #[error("Operation cancelled")]
    Cancelled,

    // ── Connection phases ────────────────────────────────────────────
    #[error("Credential exchange failed: {reason}")]
    CredentialExchangeFailed { reason: String },

    #[error("Failed to join network '{ssid}': {reason}")]
    JoinFailed { ssid: String, reason: String },

    #[error("Device unreachable at {url}: {reason}")]
    DeviceUnreachable { url: String, reason: String },

    #[error("{phase} timed out after {timeout_secs}s")]
    Timeout {
        phase: &'static str,
        timeout_secs: u64,
    },

    // ── Transfer preconditions ───────────────────────────────────────
    /// A device operation was issued outside the Connected state.
    #[error("Not connected to the device")]
    NotConnected,

    /// The post-connect health verification came back unhealthy.
    #[error("Device health check failed: {reason}")]
    UnhealthyDevice { reason: String },

    // ── Device operations ────────────────────────────────────────────
    #[error("Device rejected {action}: {message}")]
    ActionRejected { action: String, message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Media handoff to the consumer's sink failed.
    #[error("Failed to store {name}: {source}")]
    MediaStore {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<glasslink_api::Error> for CoreError {
    fn from(err: glasslink_api::Error) -> Self {
        match err {
            glasslink_api::Error::LinkUnavailable { reason }
            | glasslink_api::Error::CredentialsRefused { reason } => {
                CoreError::CredentialExchangeFailed { reason }
            }
            glasslink_api::Error::NetworkJoin { ssid, reason } => {
                CoreError::JoinFailed { ssid, reason }
            }
            glasslink_api::Error::Timeout { timeout_secs } => CoreError::Timeout {
                phase: "device request",
                timeout_secs,
            },
            glasslink_api::Error::DeviceRejected { action, message } => {
                CoreError::ActionRejected { action, message }
            }
            other => CoreError::Transport {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn api_timeout_maps_onto_the_device_request_phase() {
        let err = CoreError::from(glasslink_api::Error::Timeout { timeout_secs: 7 });
        match err {
            CoreError::Timeout {
                phase,
                timeout_secs,
            } => {
                assert_eq!(phase, "device request");
                assert_eq!(timeout_secs, 7);
            }
            other => panic!("expected Timeout, got: {other}"),
        }
    }

    #[test]
    fn link_failures_become_credential_exchange_errors() {
        let err = CoreError::from(glasslink_api::Error::LinkUnavailable {
            reason: "not paired".into(),
        });
        assert!(
            matches!(err, CoreError::CredentialExchangeFailed { ref reason } if reason == "not paired"),
            "got: {err}"
        );

        let err = CoreError::from(glasslink_api::Error::CredentialsRefused {
            reason: "rejected by wearer".into(),
        });
        assert!(matches!(err, CoreError::CredentialExchangeFailed { .. }));
    }

    #[test]
    fn device_rejection_keeps_action_and_message() {
        let err = CoreError::from(glasslink_api::Error::DeviceRejected {
            action: "take_photo".into(),
            message: "battery too low".into(),
        });
        match err {
            CoreError::ActionRejected { action, message } => {
                assert_eq!(action, "take_photo");
                assert_eq!(message, "battery too low");
            }
            other => panic!("expected ActionRejected, got: {other}"),
        }
    }
}

// ── Health probe results ──
//
// A probe always resolves to a structured `HealthReport`; transport
// failures are the caller's to synthesize into one (see the retry layer
// in glasslink-core). Exactly one of `config` / `error` is populated —
// or neither, for a device that answered but isn't serving yet.

use bytes::Bytes;

/// Outcome of a single device health/status check.
///
/// Immutable once constructed; use the constructors to keep the
/// config-xor-error invariant intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    healthy: bool,
    config: Option<Bytes>,
    error: Option<String>,
}

impl HealthReport {
    /// A healthy device, optionally carrying its configuration payload.
    pub fn healthy(config: Option<Bytes>) -> Self {
        Self {
            healthy: true,
            config,
            error: None,
        }
    }

    /// The device answered but reported it is not ready to serve.
    pub fn degraded() -> Self {
        Self {
            healthy: false,
            config: None,
            error: None,
        }
    }

    /// The check failed outright; `message` is suitable for display.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            config: None,
            error: Some(message.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// The device's application layer responded, healthy or not.
    pub fn is_reachable(&self) -> bool {
        self.error.is_none()
    }

    pub fn config(&self) -> Option<&Bytes> {
        self.config.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Validate a device configuration payload.
///
/// A minimal structural sanity check: the payload must be non-empty and
/// carry a parseable JSON object header. Never errors — absent or garbage
/// data is simply invalid.
pub fn validate_device_config(config: Option<&[u8]>) -> bool {
    let Some(data) = config else {
        return false;
    };
    if data.is_empty() {
        return false;
    }
    serde_json::from_slice::<serde_json::Value>(data)
        .map(|v| v.is_object())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_config_is_invalid() {
        assert!(!validate_device_config(None));
    }

    #[test]
    fn empty_config_is_invalid() {
        assert!(!validate_device_config(Some(b"")));
    }

    #[test]
    fn garbage_config_is_invalid() {
        assert!(!validate_device_config(Some(b"\xff\xfenot json")));
    }

    #[test]
    fn non_object_json_is_invalid() {
        assert!(!validate_device_config(Some(b"[1, 2, 3]")));
        assert!(!validate_device_config(Some(b"\"string\"")));
    }

    #[test]
    fn well_formed_config_is_valid() {
        assert!(validate_device_config(Some(
            br#"{"firmware":"1.4.2","battery":87}"#
        )));
    }

    #[test]
    fn report_invariant_config_xor_error() {
        let ok = HealthReport::healthy(Some(Bytes::from_static(b"{}")));
        assert!(ok.config().is_some() && ok.error_message().is_none());

        let bad = HealthReport::unhealthy("link down");
        assert!(bad.config().is_none() && bad.error_message().is_some());

        let waiting = HealthReport::degraded();
        assert!(waiting.config().is_none() && waiting.error_message().is_none());
        assert!(waiting.is_reachable());
        assert!(!waiting.is_healthy());
    }
}

// ── Credential negotiation ──
//
// Retrieves the device's hotspot credentials over the short-range link.
// Single-flight: a second request while one is outstanding is refused
// with `Busy`, never queued. This component reports outcomes only — the
// session owns the state machine and decides what they mean.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use glasslink_api::{ShortRangeLink, WifiCredentials};

use crate::error::CoreError;
use crate::event::StatusPublisher;
use crate::state::ConnectionState;

pub struct CredentialNegotiator {
    timeout: Duration,
    inflight: tokio::sync::Mutex<()>,
}

impl CredentialNegotiator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            inflight: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one credential exchange, bounded by the configured timeout and
    /// the cancellation token.
    pub(crate) async fn request<L: ShortRangeLink>(
        &self,
        link: &L,
        cancel: &CancellationToken,
        publisher: &StatusPublisher,
    ) -> Result<WifiCredentials, CoreError> {
        let Ok(_guard) = self.inflight.try_lock() else {
            return Err(CoreError::Busy);
        };

        publisher.publish(
            ConnectionState::RequestingCredentials,
            "Requesting WiFi credentials from the device",
        );

        let exchange = tokio::time::timeout(self.timeout, link.exchange_credentials());
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled),
            outcome = exchange => match outcome {
                Err(_elapsed) => Err(CoreError::Timeout {
                    phase: "credential exchange",
                    timeout_secs: self.timeout.as_secs(),
                }),
                Ok(Ok(credentials)) => {
                    tracing::info!(ssid = %credentials.ssid, "credentials received");
                    Ok(credentials)
                }
                Ok(Err(e)) => Err(CoreError::CredentialExchangeFailed {
                    reason: e.to_string(),
                }),
            }
        }
    }
}

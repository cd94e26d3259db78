// ── Connection establishment ──
//
// Two phases: (a) join the host to the device's hotspot, (b) verify the
// device's application layer answers at its well-known address. A join
// failure short-circuits — no reachability probes are attempted. Both
// phases report outcomes; the session owns the state transitions.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use glasslink_api::{DeviceClient, NetworkJoiner, WifiCredentials};

use crate::error::CoreError;
use crate::event::StatusPublisher;
use crate::retry::{RetryPolicy, check_with_retry};
use crate::state::ConnectionState;

pub struct ConnectionEstablisher {
    join_timeout: Duration,
    reachability: RetryPolicy,
}

impl ConnectionEstablisher {
    pub fn new(join_timeout: Duration, reachability: RetryPolicy) -> Self {
        Self {
            join_timeout,
            reachability,
        }
    }

    /// Phase (a): make the host a member of the device's network.
    ///
    /// Join latency is inherently variable, so the bound here is the
    /// session's `join_timeout`, not a request timeout.
    pub(crate) async fn join<J: NetworkJoiner>(
        &self,
        joiner: &J,
        credentials: &WifiCredentials,
        cancel: &CancellationToken,
        publisher: &StatusPublisher,
    ) -> Result<(), CoreError> {
        publisher.publish(
            ConnectionState::ConfiguringWifi,
            format!("Joining network '{}'", credentials.ssid),
        );

        let join = tokio::time::timeout(
            self.join_timeout,
            joiner.join(&credentials.ssid, &credentials.password),
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled),
            outcome = join => match outcome {
                Err(_elapsed) => Err(CoreError::Timeout {
                    phase: "network join",
                    timeout_secs: self.join_timeout.as_secs(),
                }),
                Ok(Ok(())) => {
                    tracing::info!(ssid = %credentials.ssid, "network joined");
                    Ok(())
                }
                Ok(Err(glasslink_api::Error::NetworkJoin { ssid, reason })) => {
                    Err(CoreError::JoinFailed { ssid, reason })
                }
                Ok(Err(e)) => Err(CoreError::JoinFailed {
                    ssid: credentials.ssid.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }

    /// Phase (b): bounded reachability probes against the device address.
    ///
    /// Any structured answer counts — a device that responds "not ready"
    /// is still reachable. Health verification proper happens later.
    pub(crate) async fn await_reachable(
        &self,
        client: &DeviceClient,
        cancel: &CancellationToken,
        publisher: &StatusPublisher,
    ) -> Result<(), CoreError> {
        publisher.publish(
            ConnectionState::Connecting,
            format!("Waiting for the device at {}", client.base_url()),
        );

        let probes = check_with_retry(&self.reachability, || client.status());
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CoreError::Cancelled),
            report = probes => {
                if report.is_reachable() {
                    Ok(())
                } else {
                    Err(CoreError::DeviceUnreachable {
                        url: client.base_url().to_string(),
                        reason: report
                            .error_message()
                            .unwrap_or("no response")
                            .to_string(),
                    })
                }
            }
        }
    }
}

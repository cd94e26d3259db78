// ── Runtime session configuration ──
//
// Describes *how* to reach one device: its hotspot address and the timing
// of every asynchronous phase. Nothing here is a hidden constant — the
// internal phases (credential exchange, join, reachability, status check)
// all read their bounds from this struct. The CLI constructs a
// `SessionConfig` from a profile and hands it in; core never touches disk.

use std::time::Duration;

use url::Url;

use glasslink_api::TransportConfig;

use crate::retry::RetryPolicy;

/// Configuration for one device session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device base URL on its own hotspot. The conventional gateway
    /// address for these devices is `http://192.168.4.1`.
    pub device_url: Url,
    /// Bound on the short-range credential exchange.
    pub credential_timeout: Duration,
    /// Bound on the host network join. Joins routinely take tens of
    /// seconds, so this is much larger than a request timeout.
    pub join_timeout: Duration,
    /// Reachability probing after a join: a joined network does not mean
    /// the device's application layer is up yet.
    pub reachability: RetryPolicy,
    /// Health verification before a transfer begins.
    pub status_check: RetryPolicy,
    /// HTTP transport tuning for probes and commands.
    pub transport: TransportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_url: Url::parse("http://192.168.4.1")
                .expect("default device URL is valid"),
            credential_timeout: Duration::from_secs(20),
            join_timeout: Duration::from_secs(45),
            reachability: RetryPolicy::new(3, Duration::from_secs(2)),
            status_check: RetryPolicy::new(2, Duration::from_secs(1)),
            transport: TransportConfig::default(),
        }
    }
}

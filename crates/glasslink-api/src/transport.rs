// Shared transport configuration for building reqwest::Client instances.
//
// The device serves plain HTTP on its own hotspot (a private, link-local
// network), so there is no TLS story here — only timeout tuning. Probes
// want a short connect timeout; media downloads want a generous body one.

use std::time::Duration;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Overall per-request timeout (headers + body).
    pub timeout: Duration,
    /// TCP connect timeout. Kept short so reachability probes fail fast.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(concat!("glasslink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(crate::error::Error::Transport)
    }

    /// A config tuned for bulk media transfer (long body timeout).
    pub fn for_media_transfer(mut self) -> Self {
        self.timeout = Duration::from_secs(300);
        self
    }
}

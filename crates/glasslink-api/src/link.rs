// ── Host-side collaborator contracts ──
//
// The short-range link (BLE pairing, characteristic I/O) and the network
// join primitive (hotspot membership) are platform services, not part of
// this stack. These traits pin down exactly what the orchestration layer
// needs from them and nothing more.

use std::future::Future;

use secrecy::SecretString;

use crate::error::Error;

/// WiFi join credentials retrieved from the device.
///
/// Produced once per negotiation attempt and owned by the session for its
/// lifetime; discarded on reset. The password never appears in Debug output.
#[derive(Debug, Clone)]
pub struct WifiCredentials {
    /// Network name advertised by the device's hotspot.
    pub ssid: String,
    /// Join secret. Exposed only at the join boundary.
    pub password: SecretString,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// The short-range (BLE) channel to the device.
///
/// Assumed already paired and available — discovery and pairing are the
/// platform's concern. Both operations are single-shot request/response
/// exchanges; callers apply their own timeouts and retry policy.
pub trait ShortRangeLink: Send + Sync {
    /// Ask the device for its hotspot credentials.
    fn exchange_credentials(
        &self,
    ) -> impl Future<Output = Result<WifiCredentials, Error>> + Send;

    /// Read the device's raw status/configuration payload.
    ///
    /// Used as the short-range health probe when no shared network exists yet.
    fn read_status(&self) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

/// The host network-join primitive.
///
/// Joining is inherently slow and variable (tens of seconds is normal);
/// implementations should not time out on their own — the caller bounds it.
pub trait NetworkJoiner: Send + Sync {
    /// Make the host a member of the network named by `ssid`.
    fn join(
        &self,
        ssid: &str,
        password: &SecretString,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

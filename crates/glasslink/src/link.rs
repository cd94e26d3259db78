//! Host-side link and joiner implementations.
//!
//! Desktop hosts have no BLE transport to the glasses, so the short-range
//! link is satisfied from pre-shared profile credentials; network joins go
//! through NetworkManager (`nmcli`).

use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;

use glasslink_api::{Error, NetworkJoiner, ShortRangeLink, WifiCredentials};

/// Short-range link backed by pre-shared credentials.
pub struct StaticLink {
    credentials: Option<WifiCredentials>,
}

impl StaticLink {
    pub fn new(credentials: Option<WifiCredentials>) -> Self {
        Self { credentials }
    }
}

impl ShortRangeLink for StaticLink {
    async fn exchange_credentials(&self) -> Result<WifiCredentials, Error> {
        self.credentials
            .clone()
            .ok_or_else(|| Error::LinkUnavailable {
                reason: "no short-range transport on this host; configure \
                         ssid/password in a profile or pass --ssid/--password"
                    .into(),
            })
    }

    async fn read_status(&self) -> Result<Vec<u8>, Error> {
        Err(Error::LinkUnavailable {
            reason: "short-range status probes need a BLE transport; \
                     use --transport wifi instead"
                .into(),
        })
    }
}

/// Joins WiFi networks through `nmcli`.
#[derive(Default)]
pub struct NetworkManagerJoiner;

impl NetworkManagerJoiner {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkJoiner for NetworkManagerJoiner {
    async fn join(&self, ssid: &str, password: &SecretString) -> Result<(), Error> {
        tracing::debug!(%ssid, "nmcli device wifi connect");

        let output = Command::new("nmcli")
            .args(["device", "wifi", "connect", ssid, "password"])
            .arg(password.expose_secret())
            .output()
            .await
            .map_err(|e| Error::NetworkJoin {
                ssid: ssid.into(),
                reason: format!("failed to run nmcli: {e}"),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Error::NetworkJoin {
                ssid: ssid.into(),
                reason: stderr.trim().to_string(),
            })
        }
    }
}

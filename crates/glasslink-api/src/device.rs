// Device-local HTTP client
//
// Wraps `reqwest::Client` with device-specific URL construction and
// response decoding. The device serves a small JSON API from its hotspot
// address once it is in transfer mode:
//
//   GET  /api/status                 → status + optional config payload
//   GET  /api/media                  → media listing envelope
//   GET  /api/media/{name}           → raw media bytes
//   GET  /api/media/{name}/thumbnail → preview bytes (may 404)
//   POST /api/action                 → { ok, message? } acknowledgement

use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::action::DeviceAction;
use crate::error::Error;
use crate::probe::HealthReport;
use crate::transport::TransportConfig;

/// One entry in the device's media listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaEntry {
    pub name: String,
    #[serde(default)]
    pub size_bytes: u64,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
}

/// Acknowledgement envelope for posted actions.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionAck {
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    config: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MediaListResponse {
    media: Vec<MediaEntry>,
}

/// HTTP client for the device's local interface.
///
/// Holds the device base URL (normally the hotspot gateway address) and a
/// pre-built `reqwest::Client`. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DeviceClient {
    /// Create a client for the device at `base_url` from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client` (tests, mostly).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Health / status ──────────────────────────────────────────────

    /// Probe the device's application layer.
    ///
    /// A `status: "ok"` response yields a healthy report carrying the raw
    /// config object; anything else the device answers with is degraded.
    /// Transport failures surface as `Err` — the retry layer decides what
    /// to do with them.
    pub async fn status(&self) -> Result<HealthReport, Error> {
        let url = self.api_url("/api/status")?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let body: StatusResponse = decode(resp).await?;

        if body.status == "ok" {
            let config = body
                .config
                .as_ref()
                .map(|v| serde_json::to_vec(v).unwrap_or_default())
                .map(Bytes::from);
            Ok(HealthReport::healthy(config))
        } else {
            debug!(status = %body.status, "device answered but is not ready");
            Ok(HealthReport::degraded())
        }
    }

    // ── Media ────────────────────────────────────────────────────────

    /// List the media currently stored on the device.
    pub async fn list_media(&self) -> Result<Vec<MediaEntry>, Error> {
        let url = self.api_url("/api/media")?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let listing: MediaListResponse = decode(resp).await?;
        Ok(listing.media)
    }

    /// Download one media item in full.
    pub async fn fetch_media(&self, name: &str) -> Result<Bytes, Error> {
        let url = self.api_url(&format!("/api/media/{name}"))?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?
            .error_for_status()
            .map_err(Error::Transport)?;

        resp.bytes().await.map_err(Error::Transport)
    }

    /// Fetch the preview thumbnail for a media item, if the device has one.
    pub async fn thumbnail(&self, name: &str) -> Result<Option<Bytes>, Error> {
        let url = self.api_url(&format!("/api/media/{name}/thumbnail"))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status().map_err(Error::Transport)?;
        Ok(Some(resp.bytes().await.map_err(Error::Transport)?))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Post an action to the device and unwrap the acknowledgement.
    pub async fn send_action(&self, action: DeviceAction) -> Result<ActionAck, Error> {
        let url = self.api_url("/api/action")?;
        debug!(%action, "POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({ "action": action }))
            .send()
            .await
            .map_err(Error::Transport)?;

        let ack: ActionAck = decode(resp).await?;
        if ack.ok {
            Ok(ack)
        } else {
            Err(Error::DeviceRejected {
                action: action.to_string(),
                message: ack.message.unwrap_or_else(|| "no reason given".into()),
            })
        }
    }
}

/// Decode a JSON response body, keeping the raw text for diagnostics.
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = resp.error_for_status().map_err(Error::Transport)?;
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::MalformedResponse {
        message: e.to_string(),
        body,
    })
}

// ── Device session ──
//
// One end-to-end attempt to reach Connected and optionally transfer,
// bounded by request…reset/cancel. An explicit, constructible object:
// each session owns its own state machine, credentials, cancellation
// token, and event channels — nothing here is process-global, and two
// sessions never observe each other's streams.
//
// Cheaply cloneable via `Arc<SessionInner>`, like a client handle.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use url::Url;

use glasslink_api::{
    DeviceClient, HealthReport, NetworkJoiner, ShortRangeLink, WifiCredentials,
    validate_device_config,
};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::establish::ConnectionEstablisher;
use crate::event::{StatusEvent, StatusPublisher};
use crate::negotiate::CredentialNegotiator;
use crate::retry::{ProbeTransport, RetryPolicy, check_with_retry};
use crate::state::{ConnectionState, StateMachine, TransitionError};

const EVENT_CHANNEL_SIZE: usize = 64;

/// A single provisioning/transfer session against one device.
pub struct DeviceSession<L, J> {
    inner: Arc<SessionInner<L, J>>,
}

impl<L, J> Clone for DeviceSession<L, J> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct SessionInner<L, J> {
    config: SessionConfig,
    link: L,
    joiner: J,
    negotiator: CredentialNegotiator,
    establisher: ConnectionEstablisher,
    machine: Mutex<StateMachine>,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<StatusEvent>,
    publisher: StatusPublisher,
    /// Held for the duration of any negotiation/connection operation;
    /// `try_lock` failure is the Busy rejection.
    op_lock: tokio::sync::Mutex<()>,
    /// Replaced at the start of each operation; cancelled by cancel/reset.
    cancel: Mutex<CancellationToken>,
    credentials: Mutex<Option<WifiCredentials>>,
    /// Device address bound once reachability is confirmed.
    device_url: Mutex<Option<Url>>,
}

impl<L, J> DeviceSession<L, J>
where
    L: ShortRangeLink,
    J: NetworkJoiner,
{
    /// Create a session. Does not touch the device — call
    /// [`connect()`](Self::connect) or [`request_credentials()`](Self::request_credentials).
    pub fn new(config: SessionConfig, link: L, joiner: J) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let publisher = StatusPublisher::new(state_tx.clone(), event_tx.clone());

        let negotiator = CredentialNegotiator::new(config.credential_timeout);
        let establisher = ConnectionEstablisher::new(config.join_timeout, config.reachability);

        Self {
            inner: Arc::new(SessionInner {
                config,
                link,
                joiner,
                negotiator,
                establisher,
                machine: Mutex::new(StateMachine::new()),
                state_tx,
                event_tx,
                publisher,
                op_lock: tokio::sync::Mutex::new(()),
                cancel: Mutex::new(CancellationToken::new()),
                credentials: Mutex::new(None),
                device_url: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ── State observation ────────────────────────────────────────────

    /// The current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock_machine().current()
    }

    /// Subscribe to connection state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to the status event stream. Events arrive in transition
    /// order, at most once each per receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Whether credentials from a previous negotiation are cached.
    pub fn has_credentials(&self) -> bool {
        self.lock(&self.inner.credentials).is_some()
    }

    /// The device address bound by the last successful connection.
    pub fn bound_device_url(&self) -> Option<Url> {
        self.lock(&self.inner.device_url).clone()
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Retrieve WiFi credentials over the short-range link and cache them.
    ///
    /// Accepted only from Idle. On success the session returns to Idle,
    /// ready for [`connect()`](Self::connect); on failure it lands in Failed.
    pub async fn request_credentials(&self) -> Result<WifiCredentials, CoreError> {
        let Ok(_op) = self.inner.op_lock.try_lock() else {
            return Err(CoreError::Busy);
        };
        let cancel = self.begin_op();

        self.transition(StateMachine::begin_request)?;

        match self
            .inner
            .negotiator
            .request(&self.inner.link, &cancel, &self.inner.publisher)
            .await
        {
            Ok(credentials) => {
                *self.lock(&self.inner.credentials) = Some(credentials.clone());
                self.lock_machine().to_idle();
                self.inner
                    .publisher
                    .publish(ConnectionState::Idle, "WiFi credentials received");
                Ok(credentials)
            }
            Err(e) => Err(self.fail_with(e, &cancel)),
        }
    }

    /// Drive the full pipeline to Connected.
    ///
    /// Negotiates credentials first unless a previous negotiation already
    /// cached them, then joins the network and confirms reachability.
    /// Returns the bound device address.
    pub async fn connect(&self) -> Result<Url, CoreError> {
        let Ok(_op) = self.inner.op_lock.try_lock() else {
            return Err(CoreError::Busy);
        };
        let cancel = self.begin_op();

        let cached = self.lock(&self.inner.credentials).clone();
        let credentials = match cached {
            Some(c) => {
                self.transition(StateMachine::begin_configure)?;
                c
            }
            None => {
                self.transition(StateMachine::begin_request)?;
                match self
                    .inner
                    .negotiator
                    .request(&self.inner.link, &cancel, &self.inner.publisher)
                    .await
                {
                    Ok(c) => {
                        *self.lock(&self.inner.credentials) = Some(c.clone());
                        self.advance(&cancel, StateMachine::credentials_ok)?;
                        c
                    }
                    Err(e) => return Err(self.fail_with(e, &cancel)),
                }
            }
        };

        self.establish(&credentials, &cancel).await
    }

    /// Connect with caller-supplied credentials, skipping negotiation.
    pub async fn connect_with(
        &self,
        ssid: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Url, CoreError> {
        let Ok(_op) = self.inner.op_lock.try_lock() else {
            return Err(CoreError::Busy);
        };
        let cancel = self.begin_op();

        let credentials = WifiCredentials::new(ssid, password);
        *self.lock(&self.inner.credentials) = Some(credentials.clone());
        self.transition(StateMachine::begin_configure)?;

        self.establish(&credentials, &cancel).await
    }

    async fn establish(
        &self,
        credentials: &WifiCredentials,
        cancel: &CancellationToken,
    ) -> Result<Url, CoreError> {
        if let Err(e) = self
            .inner
            .establisher
            .join(&self.inner.joiner, credentials, cancel, &self.inner.publisher)
            .await
        {
            return Err(self.fail_with(e, cancel));
        }
        self.advance(cancel, StateMachine::join_ok)?;

        let client = match self.probe_client() {
            Ok(c) => c,
            Err(e) => return Err(self.fail_with(e, cancel)),
        };
        if let Err(e) = self
            .inner
            .establisher
            .await_reachable(&client, cancel, &self.inner.publisher)
            .await
        {
            return Err(self.fail_with(e, cancel));
        }
        self.advance(cancel, StateMachine::reachable)?;

        let url = self.inner.config.device_url.clone();
        *self.lock(&self.inner.device_url) = Some(url.clone());
        self.inner.publisher.publish(
            ConnectionState::Connected,
            format!("Connected to the device at {url}"),
        );
        Ok(url)
    }

    /// Abort any in-flight operation and return to Idle, best-effort.
    ///
    /// Idempotent: cancelling an idle session does nothing, and a late
    /// completion from the aborted operation is discarded, not delivered
    /// (the operation future is dropped at its next suspension point).
    /// Cached credentials survive a cancel; use [`reset()`](Self::reset)
    /// to discard them.
    pub fn cancel(&self) {
        self.abort_to_idle("Operation cancelled");
    }

    /// Cancel, then discard cached credentials and the device binding.
    /// A subsequent connect starts from a clean slate.
    pub fn reset(&self) {
        self.abort_to_idle("Session reset");
        *self.lock(&self.inner.credentials) = None;
        *self.lock(&self.inner.device_url) = None;
    }

    // ── Status checks ────────────────────────────────────────────────

    /// One status probe over the chosen transport. Transport failures
    /// surface as errors here; use
    /// [`check_status_with_retry`](Self::check_status_with_retry) for a
    /// guaranteed structured result.
    pub async fn check_status(&self, transport: ProbeTransport) -> Result<HealthReport, CoreError> {
        match transport {
            ProbeTransport::ShortRange => {
                let payload = self.inner.link.read_status().await?;
                Ok(report_from_link_payload(payload))
            }
            ProbeTransport::LocalNetwork => {
                let client = self.probe_client()?;
                Ok(client.status().await?)
            }
        }
    }

    /// Bounded-retry status check. Always resolves to a report; exhausted
    /// attempts yield an unhealthy report carrying the last error.
    pub async fn check_status_with_retry(
        &self,
        transport: ProbeTransport,
        policy: &RetryPolicy,
    ) -> HealthReport {
        match transport {
            ProbeTransport::ShortRange => {
                check_with_retry(policy, || async {
                    self.inner.link.read_status().await.map(report_from_link_payload)
                })
                .await
            }
            ProbeTransport::LocalNetwork => match self.probe_client() {
                Ok(client) => check_with_retry(policy, || client.status()).await,
                Err(e) => HealthReport::unhealthy(e.to_string()),
            },
        }
    }

    // ── Device access ────────────────────────────────────────────────

    /// An HTTP client for the connected device. Fails with `NotConnected`
    /// until a connection has bound the device address.
    pub fn device_client(&self) -> Result<DeviceClient, CoreError> {
        let url = self
            .lock(&self.inner.device_url)
            .clone()
            .ok_or(CoreError::NotConnected)?;
        DeviceClient::new(url, &self.inner.config.transport).map_err(CoreError::from)
    }

    /// Like [`device_client`](Self::device_client), but tuned for bulk
    /// media transfer (long body timeout).
    pub fn media_client(&self) -> Result<DeviceClient, CoreError> {
        let url = self
            .lock(&self.inner.device_url)
            .clone()
            .ok_or(CoreError::NotConnected)?;
        let transport = self.inner.config.transport.clone().for_media_transfer();
        DeviceClient::new(url, &transport).map_err(CoreError::from)
    }

    /// The token guarding the current operation, for cooperative
    /// cancellation checks in longer sequences (media transfer).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.lock(&self.inner.cancel).clone()
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Probe target before any binding exists: the configured address.
    fn probe_client(&self) -> Result<DeviceClient, CoreError> {
        let url = self
            .lock(&self.inner.device_url)
            .clone()
            .unwrap_or_else(|| self.inner.config.device_url.clone());
        DeviceClient::new(url, &self.inner.config.transport).map_err(CoreError::from)
    }

    pub(crate) fn publisher(&self) -> &StatusPublisher {
        &self.inner.publisher
    }

    /// Move to Failed and publish, used when a post-connect operation
    /// discovers the device is gone.
    pub(crate) fn mark_failed(&self, message: impl Into<String>) {
        let failed = self.lock_machine().fail().is_ok();
        if failed {
            self.inner
                .publisher
                .publish(ConnectionState::Failed, message);
        }
    }

    fn lock_machine(&self) -> MutexGuard<'_, StateMachine> {
        self.inner
            .machine
            .lock()
            .expect("state machine lock poisoned")
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        mutex.lock().expect("session lock poisoned")
    }

    /// Install a fresh cancellation token for a new operation.
    fn begin_op(&self) -> CancellationToken {
        let mut guard = self.lock(&self.inner.cancel);
        *guard = CancellationToken::new();
        guard.clone()
    }

    fn abort_to_idle(&self, message: &str) {
        self.lock(&self.inner.cancel).cancel();
        let left = self.lock_machine().to_idle();
        if left != ConnectionState::Idle {
            self.inner.publisher.publish(ConnectionState::Idle, message);
        }
    }

    fn transition(
        &self,
        f: impl FnOnce(&mut StateMachine) -> Result<(), TransitionError>,
    ) -> Result<(), CoreError> {
        let mut machine = self.lock_machine();
        f(&mut machine).map_err(|te| match te {
            TransitionError::Busy => CoreError::Busy,
            TransitionError::ResetRequired => CoreError::ResetRequired {
                state: machine.current().to_string(),
            },
            TransitionError::OutOfOrder => CoreError::Internal(format!(
                "transition out of order from state '{}'",
                machine.current()
            )),
        })
    }

    /// Mid-pipeline transition: a concurrent cancel takes precedence over
    /// whatever the machine would say.
    fn advance(
        &self,
        cancel: &CancellationToken,
        f: impl FnOnce(&mut StateMachine) -> Result<(), TransitionError>,
    ) -> Result<(), CoreError> {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        self.transition(f)
    }

    /// Convert a phase failure into the terminal outcome: Cancelled wins
    /// if a cancel raced in, otherwise Failed is published.
    fn fail_with(&self, e: CoreError, cancel: &CancellationToken) -> CoreError {
        if matches!(e, CoreError::Cancelled) || cancel.is_cancelled() {
            return CoreError::Cancelled;
        }
        let failed = self.lock_machine().fail().is_ok();
        if failed {
            self.inner
                .publisher
                .publish(ConnectionState::Failed, e.to_string());
        }
        e
    }
}

fn report_from_link_payload(payload: Vec<u8>) -> HealthReport {
    if validate_device_config(Some(&payload)) {
        HealthReport::healthy(Some(Bytes::from(payload)))
    } else {
        HealthReport::unhealthy("device configuration payload failed validation")
    }
}

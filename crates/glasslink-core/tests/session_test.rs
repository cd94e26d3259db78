// End-to-end session and orchestrator tests against a scripted
// short-range link, a scripted joiner, and a wiremock device.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use glasslink_api::{
    Error as ApiError, MediaEntry, NetworkJoiner, ShortRangeLink, TransportConfig,
    WifiCredentials,
};
use glasslink_core::{
    ConnectionState, CoreError, DeviceSession, MediaSink, ProbeTransport, RetryPolicy,
    SessionConfig, StatusEvent, TransferOrchestrator,
};

// ── Scripted collaborators ──────────────────────────────────────────

#[derive(Clone, Copy, PartialEq)]
enum LinkScript {
    Succeed,
    Fail,
    Hang,
}

#[derive(Clone)]
struct ScriptedLink {
    script: LinkScript,
    status_payload: Vec<u8>,
    exchange_calls: Arc<AtomicU32>,
}

impl ScriptedLink {
    fn new(script: LinkScript) -> Self {
        Self {
            script,
            status_payload: br#"{"firmware":"1.4.2","battery":80}"#.to_vec(),
            exchange_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn with_status_payload(mut self, payload: &[u8]) -> Self {
        self.status_payload = payload.to_vec();
        self
    }

    fn exchanges(&self) -> u32 {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

impl ShortRangeLink for ScriptedLink {
    async fn exchange_credentials(&self) -> Result<WifiCredentials, ApiError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            LinkScript::Succeed => Ok(WifiCredentials::new("GLASSES-1F2A", "hotspot-pass")),
            LinkScript::Fail => Err(ApiError::LinkUnavailable {
                reason: "link dropped".into(),
            }),
            LinkScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ApiError::LinkUnavailable {
                    reason: "woke from hang".into(),
                })
            }
        }
    }

    async fn read_status(&self) -> Result<Vec<u8>, ApiError> {
        Ok(self.status_payload.clone())
    }
}

#[derive(Clone)]
struct ScriptedJoiner {
    fail: bool,
    join_calls: Arc<AtomicU32>,
}

impl ScriptedJoiner {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            join_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn joins(&self) -> u32 {
        self.join_calls.load(Ordering::SeqCst)
    }
}

impl NetworkJoiner for ScriptedJoiner {
    async fn join(&self, ssid: &str, _password: &SecretString) -> Result<(), ApiError> {
        self.join_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(ApiError::NetworkJoin {
                ssid: ssid.into(),
                reason: "association rejected".into(),
            })
        } else {
            Ok(())
        }
    }
}

struct VecSink(std::sync::Mutex<Vec<(String, usize)>>);

impl VecSink {
    fn new() -> Self {
        Self(std::sync::Mutex::new(Vec::new()))
    }

    fn stored(&self) -> Vec<(String, usize)> {
        self.0.lock().unwrap().clone()
    }
}

impl MediaSink for VecSink {
    async fn store(&self, entry: &MediaEntry, bytes: Bytes) -> std::io::Result<()> {
        self.0.lock().unwrap().push((entry.name.clone(), bytes.len()));
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn test_config(device_url: &str) -> SessionConfig {
    SessionConfig {
        device_url: Url::parse(device_url).unwrap(),
        credential_timeout: Duration::from_secs(5),
        join_timeout: Duration::from_secs(5),
        reachability: RetryPolicy::new(2, Duration::from_millis(20)),
        status_check: RetryPolicy::new(2, Duration::from_millis(20)),
        transport: TransportConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        },
    }
}

async fn mount_healthy_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "config": { "firmware": "1.4.2" }
        })))
        .mount(server)
        .await;
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

fn states(events: &[StatusEvent]) -> Vec<ConnectionState> {
    events.iter().map(|e| e.state).collect()
}

// ── Connection pipeline ─────────────────────────────────────────────

#[tokio::test]
async fn full_happy_path_delivers_events_in_order() {
    let server = MockServer::start().await;
    mount_healthy_status(&server).await;

    let link = ScriptedLink::new(LinkScript::Succeed);
    let joiner = ScriptedJoiner::new(false);
    let session = DeviceSession::new(test_config(&server.uri()), link.clone(), joiner.clone());
    let mut rx = session.subscribe();

    let url = session.connect().await.expect("connect");
    assert_eq!(url.as_str(), session.bound_device_url().unwrap().as_str());
    assert_eq!(session.state(), ConnectionState::Connected);
    assert_eq!(link.exchanges(), 1);
    assert_eq!(joiner.joins(), 1);

    let events = drain(&mut rx);
    assert_eq!(
        states(&events),
        vec![
            ConnectionState::RequestingCredentials,
            ConnectionState::ConfiguringWifi,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ]
    );
}

#[tokio::test]
async fn join_failure_short_circuits_reachability() {
    let server = MockServer::start().await;
    // the reachability probe must never be attempted
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = DeviceSession::new(
        test_config(&server.uri()),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(true),
    );
    let mut rx = session.subscribe();

    let err = session.connect().await.expect_err("join should fail");
    match err {
        CoreError::JoinFailed { ssid, .. } => assert_eq!(ssid, "GLASSES-1F2A"),
        other => panic!("expected JoinFailed, got: {other}"),
    }
    assert_eq!(session.state(), ConnectionState::Failed);

    let events = drain(&mut rx);
    assert_eq!(events.last().unwrap().state, ConnectionState::Failed);
}

#[tokio::test]
async fn credential_failure_moves_to_failed() {
    let session = DeviceSession::new(
        test_config("http://192.0.2.1"),
        ScriptedLink::new(LinkScript::Fail),
        ScriptedJoiner::new(false),
    );

    let err = session.connect().await.expect_err("exchange should fail");
    assert!(matches!(err, CoreError::CredentialExchangeFailed { .. }));
    assert_eq!(session.state(), ConnectionState::Failed);
}

#[tokio::test]
async fn credential_timeout_is_a_failure_not_a_wedge() {
    let mut config = test_config("http://192.0.2.1");
    config.credential_timeout = Duration::from_millis(50);

    let session = DeviceSession::new(
        config,
        ScriptedLink::new(LinkScript::Hang),
        ScriptedJoiner::new(false),
    );

    let err = session.connect().await.expect_err("should time out");
    assert!(matches!(
        err,
        CoreError::Timeout {
            phase: "credential exchange",
            ..
        }
    ));
    assert_eq!(session.state(), ConnectionState::Failed);
}

#[tokio::test]
async fn connect_with_skips_negotiation() {
    let server = MockServer::start().await;
    mount_healthy_status(&server).await;

    let link = ScriptedLink::new(LinkScript::Succeed);
    let session = DeviceSession::new(
        test_config(&server.uri()),
        link.clone(),
        ScriptedJoiner::new(false),
    );
    let mut rx = session.subscribe();

    session
        .connect_with("GLASSES-AB12", "supplied-pass")
        .await
        .expect("connect");

    assert_eq!(link.exchanges(), 0);
    let events = drain(&mut rx);
    assert_eq!(
        states(&events),
        vec![
            ConnectionState::ConfiguringWifi,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ]
    );
}

#[tokio::test]
async fn cached_credentials_are_reused_by_connect() {
    let server = MockServer::start().await;
    mount_healthy_status(&server).await;

    let link = ScriptedLink::new(LinkScript::Succeed);
    let session = DeviceSession::new(
        test_config(&server.uri()),
        link.clone(),
        ScriptedJoiner::new(false),
    );

    let creds = session.request_credentials().await.expect("negotiation");
    assert_eq!(creds.ssid, "GLASSES-1F2A");
    assert_eq!(session.state(), ConnectionState::Idle);
    assert!(session.has_credentials());

    session.connect().await.expect("connect");
    // one exchange total — connect used the cache
    assert_eq!(link.exchanges(), 1);
}

// ── Arbitration, cancellation, reset ────────────────────────────────

#[tokio::test]
async fn second_request_while_in_flight_is_busy() {
    let session = DeviceSession::new(
        test_config("http://192.0.2.1"),
        ScriptedLink::new(LinkScript::Hang),
        ScriptedJoiner::new(false),
    );

    let bg = session.clone();
    let handle = tokio::spawn(async move { bg.connect().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.state(), ConnectionState::RequestingCredentials);

    let err = session.connect().await.expect_err("should be busy");
    assert!(matches!(err, CoreError::Busy));
    let err = session.request_credentials().await.expect_err("busy too");
    assert!(matches!(err, CoreError::Busy));

    // the original operation is unaffected by the rejection
    assert_eq!(session.state(), ConnectionState::RequestingCredentials);

    session.cancel();
    let result = handle.await.expect("task");
    assert!(matches!(result, Err(CoreError::Cancelled)));
}

#[tokio::test]
async fn cancel_lands_in_idle_and_absorbs_the_late_outcome() {
    let session = DeviceSession::new(
        test_config("http://192.0.2.1"),
        ScriptedLink::new(LinkScript::Hang),
        ScriptedJoiner::new(false),
    );
    let mut rx = session.subscribe();

    let bg = session.clone();
    let handle = tokio::spawn(async move { bg.connect().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    session.cancel();
    assert_eq!(session.state(), ConnectionState::Idle);

    let result = handle.await.expect("task");
    assert!(matches!(result, Err(CoreError::Cancelled)));

    // a second cancel is a no-op
    session.cancel();

    let events = drain(&mut rx);
    let cancelled: Vec<_> = events
        .iter()
        .filter(|e| e.message.contains("cancelled"))
        .collect();
    assert_eq!(cancelled.len(), 1, "cancel reported exactly once");
    // no Failed event sneaks in after the cancel
    assert!(events.iter().all(|e| e.state != ConnectionState::Failed));
}

#[tokio::test]
async fn reset_clears_cached_credentials() {
    let server = MockServer::start().await;
    mount_healthy_status(&server).await;

    let link = ScriptedLink::new(LinkScript::Succeed);
    let joiner = ScriptedJoiner::new(true);
    let session = DeviceSession::new(test_config(&server.uri()), link.clone(), joiner.clone());

    // negotiation succeeds, join fails → Failed with credentials cached
    let err = session.connect().await.expect_err("join fails");
    assert!(matches!(err, CoreError::JoinFailed { .. }));
    assert_eq!(session.state(), ConnectionState::Failed);
    assert!(session.has_credentials());

    // Failed is terminal until reset
    let err = session.connect().await.expect_err("reset required");
    assert!(matches!(err, CoreError::ResetRequired { .. }));

    session.reset();
    assert_eq!(session.state(), ConnectionState::Idle);
    assert!(!session.has_credentials());
    assert!(session.bound_device_url().is_none());

    // a fresh connect cannot reuse stale values — it negotiates again
    let _ = session.connect().await;
    assert_eq!(link.exchanges(), 2);
}

// ── Status checks ───────────────────────────────────────────────────

#[tokio::test]
async fn short_range_probe_validates_the_config_payload() {
    let session = DeviceSession::new(
        test_config("http://192.0.2.1"),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );

    let report = session
        .check_status(ProbeTransport::ShortRange)
        .await
        .expect("probe");
    assert!(report.is_healthy());
    assert!(report.config().is_some());

    let empty = DeviceSession::new(
        test_config("http://192.0.2.1"),
        ScriptedLink::new(LinkScript::Succeed).with_status_payload(b""),
        ScriptedJoiner::new(false),
    );
    let report = empty
        .check_status(ProbeTransport::ShortRange)
        .await
        .expect("probe");
    assert!(!report.is_healthy());
    assert!(report.error_message().unwrap().contains("validation"));
}

#[tokio::test]
async fn local_network_retry_recovers_from_transient_failures() {
    let server = MockServer::start().await;

    // two 500s, then a healthy answer
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_healthy_status(&server).await;

    let session = DeviceSession::new(
        test_config(&server.uri()),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );

    let policy = RetryPolicy::new(2, Duration::from_millis(10));
    let report = session
        .check_status_with_retry(ProbeTransport::LocalNetwork, &policy)
        .await;
    assert!(report.is_healthy());
}

#[tokio::test]
async fn exhausted_local_probe_reports_last_error() {
    // nothing listening at this address
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let session = DeviceSession::new(
        test_config(&uri),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );

    let policy = RetryPolicy::new(1, Duration::from_millis(10));
    let report = session
        .check_status_with_retry(ProbeTransport::LocalNetwork, &policy)
        .await;
    assert!(!report.is_healthy());
    assert!(report.error_message().is_some());
}

// ── Transfer orchestration ──────────────────────────────────────────

async fn mount_media_endpoints(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/action"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/media"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media": [
                { "name": "IMG_0001.jpg", "size_bytes": 9, "kind": "photo" },
                { "name": "VID_0002.mp4", "size_bytes": 12, "kind": "video" },
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/media/IMG_0001.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"photodata".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/media/VID_0002.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"videodata!!!".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/media/IMG_0001.jpg/thumbnail"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb".to_vec()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/media/VID_0002.mp4/thumbnail"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn download_connects_verifies_then_transfers() {
    let server = MockServer::start().await;
    mount_healthy_status(&server).await;
    mount_media_endpoints(&server).await;

    let session = DeviceSession::new(
        test_config(&server.uri()),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );
    let mut rx = session.subscribe();
    let orchestrator = TransferOrchestrator::new(session.clone());
    let sink = VecSink::new();

    let count = orchestrator
        .download_media_over_wifi(&sink)
        .await
        .expect("download");

    assert_eq!(count, 2);
    assert_eq!(
        sink.stored(),
        vec![("IMG_0001.jpg".to_string(), 9), ("VID_0002.mp4".to_string(), 12)]
    );
    assert_eq!(session.state(), ConnectionState::Connected);

    let events = drain(&mut rx);
    // connection events first, in order, then transfer progress
    assert_eq!(
        states(&events)[..4],
        [
            ConnectionState::RequestingCredentials,
            ConnectionState::ConfiguringWifi,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ]
    );
    let with_preview: Vec<_> = events.iter().filter(|e| e.preview.is_some()).collect();
    assert_eq!(with_preview.len(), 1, "one item had a thumbnail");
    assert!(
        events
            .iter()
            .any(|e| e.message.contains("download complete")),
        "final progress message delivered"
    );
}

#[tokio::test]
async fn unhealthy_device_aborts_before_any_transfer() {
    let server = MockServer::start().await;

    // reachable but never ready
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "starting" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/media"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/action"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = DeviceSession::new(
        test_config(&server.uri()),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );
    let orchestrator = TransferOrchestrator::new(session.clone());
    let sink = VecSink::new();

    let err = orchestrator
        .download_media_over_wifi(&sink)
        .await
        .expect_err("health check must fail");
    assert!(matches!(err, CoreError::UnhealthyDevice { .. }));
    assert_eq!(session.state(), ConnectionState::Failed);
    assert!(sink.stored().is_empty());
}

#[tokio::test]
async fn mode_switches_require_connected() {
    let session = DeviceSession::new(
        test_config("http://192.0.2.1"),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );
    let orchestrator = TransferOrchestrator::new(session);

    for result in [
        orchestrator.switch_to_capture_mode().await,
        orchestrator.switch_to_transfer_mode().await,
        orchestrator.open_media_gallery().await,
    ] {
        assert!(matches!(result, Err(CoreError::NotConnected)));
    }
}

#[tokio::test]
async fn mode_switch_issues_the_device_command() {
    let server = MockServer::start().await;
    mount_healthy_status(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/action"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let session = DeviceSession::new(
        test_config(&server.uri()),
        ScriptedLink::new(LinkScript::Succeed),
        ScriptedJoiner::new(false),
    );
    session.connect().await.expect("connect");

    let orchestrator = TransferOrchestrator::new(session);
    orchestrator
        .switch_to_capture_mode()
        .await
        .expect("mode switch");
}

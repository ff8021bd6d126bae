//! Integration tests for the record-replay cycle

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use bytes::Bytes;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use httptape::{
    HttpRequest, HttpResponse, LiveTransport, Mode, Result, TapeError, VcrConfig, VcrTransport,
};

static TRACING: Once = Once::new();

/// Install a test subscriber once so transport decisions show up under
/// `RUST_LOG=httptape=debug`
fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Live transport stub standing in for a real server; counts calls so tests
/// can assert how often the network was reached
struct StubServer {
    calls: Arc<AtomicUsize>,
    status_code: u16,
    body: &'static str,
}

impl StubServer {
    fn new(status_code: u16, body: &'static str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            status_code,
            body,
        }
    }

    /// Handle onto the server-side call counter
    fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl LiveTransport for StubServer {
    async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status_code: self.status_code,
            status: format!("{} OK", self.status_code),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Bytes::from_static(self.body.as_bytes()),
        })
    }
}

/// Live transport that fails every call, modeling a stopped server
struct DownServer;

impl LiveTransport for DownServer {
    async fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse> {
        Err(TapeError::Transport("connection refused".to_string()))
    }
}

fn test_config(mode: Mode, dir: &TempDir) -> VcrConfig {
    init_tracing();
    VcrConfig {
        enabled: true,
        mode,
        cassette_dir: dir.path().to_path_buf(),
        ..VcrConfig::default()
    }
}

fn authorized_request() -> HttpRequest {
    HttpRequest {
        method: "GET".to_string(),
        url: "https://api.example.com/test?param=value".to_string(),
        headers: vec![(
            "Authorization".to_string(),
            "Bearer secret-token".to_string(),
        )],
        body: Bytes::new(),
    }
}

/// Record a request carrying a bearer token, then replay it with the server
/// stopped. The persisted file must hold the redaction marker and never the
/// token, and playback must return the recorded response.
#[tokio::test]
async fn test_record_redacts_and_replays_without_server() {
    let dir = TempDir::new().unwrap();

    // Record against a live stub
    {
        let recorder = VcrTransport::new(
            test_config(Mode::Record, &dir),
            StubServer::new(200, "{\"message\":\"test response\"}"),
        );
        let response = recorder.intercept(&authorized_request()).await.unwrap();
        assert_eq!(response.status_code, 200);
    }

    // Inspect the persisted cassette
    let cassette_path = std::fs::read_dir(dir.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    let contents = std::fs::read_to_string(&cassette_path).unwrap();
    assert!(contents.contains("[REDACTED]"));
    assert!(!contents.contains("secret-token"));
    assert!(contents.contains("test response"));

    // Replay with the server stopped
    let player = VcrTransport::new(test_config(Mode::Playback, &dir), DownServer);
    let response = player.intercept(&authorized_request()).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert!(String::from_utf8_lossy(&response.body).contains("test response"));
}

/// Playback against a cassette with no matching interaction must name the
/// cassette and the requested method/URL, not fail with a raw I/O error.
#[tokio::test]
async fn test_playback_miss_is_diagnosable() {
    let dir = TempDir::new().unwrap();

    // Record one request, then play back a different one against the same
    // pinned cassette
    let mut record_config = test_config(Mode::Record, &dir);
    record_config.cassette_name = Some("pinned.json".to_string());
    {
        let recorder = VcrTransport::new(record_config.clone(), StubServer::new(200, "{}"));
        recorder.intercept(&authorized_request()).await.unwrap();
    }

    let mut playback_config = test_config(Mode::Playback, &dir);
    playback_config.cassette_name = Some("pinned.json".to_string());
    let player = VcrTransport::new(playback_config, DownServer);

    let other = HttpRequest {
        method: "DELETE".to_string(),
        url: "https://api.example.com/other".to_string(),
        headers: vec![],
        body: Bytes::new(),
    };
    let err = player.intercept(&other).await.unwrap_err();
    assert!(matches!(err, TapeError::PlaybackMiss { .. }));
    let message = err.to_string();
    assert!(message.contains("pinned.json"));
    assert!(message.contains("DELETE"));
}

/// A missing cassette file must surface the recording workflow, not a bare
/// filesystem error.
#[tokio::test]
async fn test_missing_cassette_suggests_recording() {
    let dir = TempDir::new().unwrap();
    let player = VcrTransport::new(test_config(Mode::Playback, &dir), DownServer);

    let err = player.intercept(&authorized_request()).await.unwrap_err();
    assert!(matches!(err, TapeError::CassetteMissing { .. }));
    let message = err.to_string();
    assert!(message.contains("cassette not found"));
    assert!(message.contains("HTTPTAPE_MODE=record"));
}

/// Two record-once invocations against a call-counting server leave the
/// counter at exactly 1, and both client-observed responses carry the first
/// recorded payload.
#[tokio::test]
async fn test_record_once_hits_server_exactly_once() {
    let dir = TempDir::new().unwrap();
    let server = StubServer::new(200, "{\"counter\":1}");
    let counter = server.counter();
    let transport = VcrTransport::new(test_config(Mode::RecordOnce, &dir), server);

    let first = transport.intercept(&authorized_request()).await.unwrap();
    let second = transport.intercept(&authorized_request()).await.unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(first.body, second.body);
    assert_eq!(&first.body[..], b"{\"counter\":1}");

    // A fresh transport over the same directory also plays back instead of
    // re-recording, even though its server would answer differently
    let fresh_server = StubServer::new(200, "{\"counter\":2}");
    let fresh_counter = fresh_server.counter();
    let fresh = VcrTransport::new(test_config(Mode::RecordOnce, &dir), fresh_server);
    let replayed = fresh.intercept(&authorized_request()).await.unwrap();

    assert_eq!(&replayed.body[..], b"{\"counter\":1}");
    assert_eq!(fresh_counter.load(Ordering::SeqCst), 0);
}

/// Recorded then replayed with the same signature: the playback response is
/// byte-identical to the original live response.
#[tokio::test]
async fn test_replay_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(Mode::Record, &dir);
    config.match_query = true;
    config.match_body = true;

    let original = {
        let recorder = VcrTransport::new(
            config.clone(),
            StubServer::new(201, "{\"id\":42,\"name\":\"\u{e9}clair\"}"),
        );
        recorder.intercept(&authorized_request()).await.unwrap()
    };

    config.mode = Mode::Playback;
    let player = VcrTransport::new(config, DownServer);
    let replayed = player.intercept(&authorized_request()).await.unwrap();

    assert_eq!(original.status_code, replayed.status_code);
    assert_eq!(original.status, replayed.status);
    assert_eq!(original.body, replayed.body);
}

/// Off mode is byte-identical to calling the live transport directly and
/// leaves the cassette directory untouched.
#[tokio::test]
async fn test_off_mode_is_transparent() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(Mode::Off, &dir);
    config.enabled = false;

    let server = StubServer::new(200, "direct");
    let direct = server.execute(&authorized_request()).await.unwrap();

    let transport = VcrTransport::new(config, StubServer::new(200, "direct"));
    let intercepted = transport.intercept(&authorized_request()).await.unwrap();

    assert_eq!(direct.status_code, intercepted.status_code);
    assert_eq!(direct.body, intercepted.body);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

/// Requests that differ only in a sensitive parameter's value land in the
/// same cassette, and the sensitive value never reaches disk through the
/// name or the recorded URL path handling.
#[tokio::test]
async fn test_sensitive_param_does_not_split_cassettes() {
    let dir = TempDir::new().unwrap();
    let transport = VcrTransport::new(
        test_config(Mode::Record, &dir),
        StubServer::new(200, "{}"),
    );

    for key in ["alpha", "beta"] {
        let request = HttpRequest {
            method: "GET".to_string(),
            url: format!("https://api.example.com/items?page=1&api_key={key}"),
            headers: vec![],
            body: Bytes::new(),
        };
        transport.intercept(&request).await.unwrap();
    }

    // Both recordings landed in one cassette file
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    assert_eq!(transport.stats().total_interactions, 2);
}

/// A legacy YAML cassette plays back through the same pipeline as a native
/// one: multi-valued headers collapse and a missing status code becomes 200.
#[tokio::test]
async fn test_legacy_yaml_cassette_playback() {
    let dir = TempDir::new().unwrap();
    let yaml = r#"
interactions:
- request:
    headers:
      Accept:
      - application/json
    uri: https://api.example.com/test?param=value
    method: GET
  response:
    body:
      string: '{"message":"from legacy"}'
    headers:
      Content-Type:
      - application/json
      - application/problem+json
"#;
    std::fs::write(dir.path().join("old.yaml"), yaml).unwrap();

    let mut config = test_config(Mode::Playback, &dir);
    config.cassette_name = Some("old.yaml".to_string());

    let player = VcrTransport::new(config, DownServer);
    let response = player.intercept(&authorized_request()).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.status, "200 OK");
    assert_eq!(&response.body[..], b"{\"message\":\"from legacy\"}");
    let content_type = response
        .headers
        .iter()
        .find(|(name, _)| name == "Content-Type")
        .map(|(_, value)| value.as_str());
    assert_eq!(content_type, Some("application/json"));
}

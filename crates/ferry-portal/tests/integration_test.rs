//! Integration tests for the configuration portal.
//!
//! These tests run the real lifecycle on a loopback port with fake radio and
//! settings collaborators and drive it with raw HTTP over TCP.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use ferry_core::{
    DisplayController, DisplayMode, DrawCommand, FerrySettings, Geometry, MemorySettingsStore,
    RenderError, Renderer, RouteTable, SettingsStore, StoredSettings, WifiCredentials,
};
use ferry_portal::lifecycle::configure;
use ferry_portal::{AccessPointConfig, PortalConfig, PortalError, RadioError, ScanResult, WifiRadio};

/// Radio that accepts one password and records what it was asked to do.
struct FakeRadio {
    password: &'static str,
    online: bool,
    joins: Mutex<Vec<String>>,
    ap_starts: AtomicUsize,
    ap_stops: AtomicUsize,
}

impl FakeRadio {
    fn new() -> Self {
        Self {
            password: "hunter2",
            online: true,
            joins: Mutex::new(Vec::new()),
            ap_starts: AtomicUsize::new(0),
            ap_stops: AtomicUsize::new(0),
        }
    }
}

impl WifiRadio for FakeRadio {
    async fn scan(&self) -> Result<Vec<ScanResult>, RadioError> {
        Ok(vec![
            ScanResult { ssid: "Neighbor".to_string(), rssi: -75, channel: 11 },
            ScanResult { ssid: "HomeNet".to_string(), rssi: -42, channel: 6 },
            ScanResult { ssid: "HomeNet".to_string(), rssi: -80, channel: 1 },
        ])
    }

    async fn connect(&self, ssid: &str, password: &str) -> Result<(), RadioError> {
        self.joins.lock().unwrap().push(ssid.to_string());
        if password == self.password {
            Ok(())
        } else {
            Err(RadioError::Join("wrong password".to_string()))
        }
    }

    async fn ping(&self) -> Result<(), RadioError> {
        Ok(())
    }

    async fn has_internet(&self) -> bool {
        self.online
    }

    async fn start_access_point(&self, _config: &AccessPointConfig) -> Result<(), RadioError> {
        self.ap_starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_access_point(&self) -> Result<(), RadioError> {
        self.ap_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct Recorder {
    commands: Vec<DrawCommand>,
}

impl Renderer for Recorder {
    fn relayout(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        self.commands.push(command.clone());
        Ok(())
    }
}

/// Find an available port for testing.
async fn find_available_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn test_config() -> PortalConfig {
    PortalConfig {
        bind_addr: find_available_port().await,
        accept_timeout: Duration::from_millis(50),
        chunk_pause: Duration::ZERO,
        handoff_delay: Duration::from_millis(10),
        ..PortalConfig::default()
    }
}

/// Send one raw request and return (headers, body).
async fn request(addr: SocketAddr, raw: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("Timeout waiting for response")
        .unwrap();

    let text = String::from_utf8(response).unwrap();
    let (head, body) = text.split_once("\n\n").expect("header separator");
    (head.to_string(), body.to_string())
}

/// Run the configuration phase, failing the test if it never completes.
async fn run_setup(
    config: &PortalConfig,
    store: &MemorySettingsStore,
    radio: &FakeRadio,
    display: &mut DisplayController<Recorder>,
) -> Result<FerrySettings, PortalError> {
    timeout(
        Duration::from_secs(10),
        configure(config, RouteTable::nyc_ferry(), store, radio, display),
    )
    .await
    .expect("Setup did not complete")
}

fn post(body: &str) -> String {
    format!(
        "POST / HTTP/1.1\r\nHost: 192.168.4.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|l| l.strip_prefix("Content-Length: "))
        .and_then(|v| v.parse().ok())
        .expect("Content-Length header")
}

#[tokio::test]
async fn test_full_setup_flow() {
    let config = test_config().await;
    let addr = config.bind_addr;
    let store = MemorySettingsStore::default();
    let radio = FakeRadio::new();
    let mut display = DisplayController::new(Recorder::default(), Geometry::default());

    let client = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;

        // WiFi page lists each network once, strongest first.
        let (head, body) = request(addr, "GET / HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n").await;
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains("Content-Type: text/html"));
        assert_eq!(content_length(&head), body.len());
        assert_eq!(body.matches("value=\"HomeNet\"").count(), 1);
        assert!(body.find("HomeNet").unwrap() < body.find("Neighbor").unwrap());

        // Wrong password keeps the WiFi form.
        let (_, body) = request(addr, &post("wifi_name=HomeNet&wifi_password=nope")).await;
        assert!(!body.contains("NYC Ferry Configuration"));

        // Correct password answers with the ferry form inline.
        let (head, body) = request(addr, &post("wifi_name=HomeNet&wifi_password=hunter2")).await;
        assert!(body.contains("NYC Ferry Configuration"));
        assert_eq!(content_length(&head), body.len());

        // Route preselection fills stops and directions.
        let (_, body) = request(addr, "GET /?route=AS HTTP/1.1\r\n\r\n").await;
        assert!(body.contains("<option value=\"AS\" selected>AS (Astoria)</option>"));
        assert!(body.contains("<option value=\"astoria\">Astoria</option>"));

        // Saving the ferry form completes setup.
        let (_, body) = request(
            addr,
            &post("route=AS&stop_id=astoria&headsign=Wall+St.%2FPier+11"),
        )
        .await;
        assert!(body.contains("Setup Complete"));
    });

    let ferry = run_setup(&config, &store, &radio, &mut display).await.unwrap();
    client.await.unwrap();

    assert_eq!(ferry.route_id, "r-dr5ru-as");
    assert_eq!(ferry.stop_id, "s-dr5rvw38kz-astoria");
    assert_eq!(ferry.headsign, "Wall St./Pier 11");
    assert_eq!(ferry.color, "orange");

    let stored = store.load().unwrap();
    assert_eq!(stored.wifi, Some(WifiCredentials::new("HomeNet", "hunter2")));
    assert_eq!(stored.ferry, Some(ferry));

    // Wrong password, right password, then the handoff join.
    assert_eq!(*radio.joins.lock().unwrap(), vec!["HomeNet", "HomeNet", "HomeNet"]);
    assert_eq!(radio.ap_starts.load(Ordering::SeqCst), 1);
    // One stop before starting, one after setup.
    assert_eq!(radio.ap_stops.load(Ordering::SeqCst), 2);
    assert_eq!(display.mode(), Some(DisplayMode::Idle));
}

#[tokio::test]
async fn test_stored_wifi_starts_at_ferry_form() {
    let config = test_config().await;
    let addr = config.bind_addr;
    let store = MemorySettingsStore::new(StoredSettings {
        wifi: Some(WifiCredentials::new("HomeNet", "hunter2")),
        ferry: None,
    });
    let radio = FakeRadio::new();
    let mut display = DisplayController::new(Recorder::default(), Geometry::default());

    let client = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (_, body) = request(addr, "GET / HTTP/1.1\r\n\r\n").await;
        assert!(body.contains("NYC Ferry Configuration"));

        // Incomplete form is rejected and nothing is stored.
        let (_, body) = request(addr, &post("route=SG&stop_id=&headsign=St.+George")).await;
        assert!(body.contains("Something went wrong"));

        let (_, body) = request(addr, &post("route=SG&stop_id=stgeorge&headsign=St.+George")).await;
        assert!(body.contains("Setup Complete"));
    });

    let ferry = run_setup(&config, &store, &radio, &mut display).await.unwrap();
    client.await.unwrap();

    assert_eq!(ferry.stop_name, "St. George");
    assert_eq!(ferry.headsign, "St. George");
    // Only the handoff join.
    assert_eq!(radio.joins.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_offline_after_setup_halts() {
    let config = test_config().await;
    let addr = config.bind_addr;
    let store = MemorySettingsStore::new(StoredSettings {
        wifi: Some(WifiCredentials::new("HomeNet", "hunter2")),
        ferry: None,
    });
    let radio = FakeRadio {
        online: false,
        ..FakeRadio::new()
    };
    let mut display = DisplayController::new(Recorder::default(), Geometry::default());

    let client = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        request(addr, &post("route=ER&stop_id=dumbo~fultonferry&headsign=Wall+St.%2FPier+11")).await
    });

    let result = run_setup(&config, &store, &radio, &mut display).await;
    let (_, body) = client.await.unwrap();

    assert!(body.contains("Setup Complete"));
    assert!(matches!(result, Err(PortalError::Halted("no internet connection"))));
    // Settings were still stored before the handoff failed.
    assert!(store.load().unwrap().ferry.is_some());
}

#[tokio::test]
async fn test_garbage_request_keeps_serving() {
    let config = test_config().await;
    let addr = config.bind_addr;
    let store = MemorySettingsStore::new(StoredSettings {
        wifi: Some(WifiCredentials::new("HomeNet", "hunter2")),
        ferry: None,
    });
    let radio = FakeRadio::new();
    let mut display = DisplayController::new(Recorder::default(), Geometry::default());

    let client = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Blank request: the connection is dropped without a response.
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"\r\n\r\n").await.unwrap();
        let mut response = Vec::new();
        let _ = timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
        assert!(response.is_empty());

        // Connect and hang up without sending anything.
        drop(TcpStream::connect(addr).await.unwrap());

        let (_, body) = request(addr, &post("route=GI&stop_id=govisland~yankeepier&headsign=Governors+Island")).await;
        assert!(body.contains("Setup Complete"));
    });

    let ferry = run_setup(&config, &store, &radio, &mut display).await.unwrap();
    client.await.unwrap();
    assert_eq!(ferry.stop_name, "Gov. Island/Yankee Pier");
}

#[tokio::test]
async fn test_post_body_in_separate_segment() {
    let config = test_config().await;
    let addr = config.bind_addr;
    let store = MemorySettingsStore::new(StoredSettings {
        wifi: Some(WifiCredentials::new("HomeNet", "hunter2")),
        ferry: None,
    });
    let radio = FakeRadio::new();
    let mut display = DisplayController::new(Recorder::default(), Geometry::default());

    let client = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;

        let raw = post("route=SG&stop_id=stgeorge&headsign=St.+George");
        let (head, body) = raw.split_at(raw.find("\r\n\r\n").unwrap() + 4);

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.set_nodelay(true).unwrap();
        stream.write_all(head.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        stream.write_all(body.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
            .await
            .expect("Timeout waiting for response")
            .unwrap();
        String::from_utf8(response).unwrap()
    });

    let ferry = run_setup(&config, &store, &radio, &mut display).await.unwrap();
    let response = client.await.unwrap();

    assert!(response.contains("Setup Complete"));
    assert_eq!(ferry.stop_name, "St. George");
    assert_eq!(store.load().unwrap().ferry, Some(ferry));
}

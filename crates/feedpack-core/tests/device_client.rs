//! Device client tests against a one-shot local HTTP responder.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

use feedpack_core::device::{Calibration, DeviceClient, DeviceError, NewSchedule};
use serde_json::{Value, json};

/// What the fake device saw.
#[derive(Debug)]
struct RecordedRequest {
    method: String,
    path: String,
    body: String,
}

/// Serve exactly one request with `status` and `body`, returning the base URL.
fn serve_once(status: &str, body: &str) -> (String, JoinHandle<RecordedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("local_addr should succeed");
    let status = status.to_string();
    let body = body.to_string();

    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .expect("write should succeed");
        request
    });

    (format!("http://{}", addr), handle)
}

fn read_request(stream: &mut std::net::TcpStream) -> RecordedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read should succeed");
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).expect("read should succeed");
        assert!(n > 0, "connection closed before body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    RecordedRequest {
        method: request_line.next().unwrap_or_default().to_string(),
        path: request_line.next().unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string(),
    }
}

#[tokio::test]
async fn status_reports_online() {
    let (url, server) = serve_once("200 OK", r#"{"status": "ok", "message": "Server is running"}"#);
    let client = DeviceClient::new(&url).unwrap();

    let status = client.status().await.unwrap();

    assert!(status.is_online());
    assert_eq!(status.message.as_deref(), Some("Server is running"));
    let request = server.join().unwrap();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/api/status");
}

#[tokio::test]
async fn add_schedule_posts_time_and_amount() {
    let (url, server) = serve_once("200 OK", r#"{"status": "ok"}"#);
    let client = DeviceClient::new(&url).unwrap();

    let ack = client
        .add_schedule(&NewSchedule::new("08:30", 5).unwrap())
        .await
        .unwrap();

    assert_eq!(ack.status.as_deref(), Some("ok"));
    let request = server.join().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/schedule");
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body, json!({"time": "08:30", "amount": 5}));
}

#[tokio::test]
async fn delete_schedule_targets_id_path() {
    let (url, server) = serve_once("200 OK", r#"{"status": "ok", "message": "Schedule deleted"}"#);
    let client = DeviceClient::new(&url).unwrap();

    client.delete_schedule("morning 1").await.unwrap();

    let request = server.join().unwrap();
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path, "/api/schedule/morning%201");
}

#[tokio::test]
async fn feed_returns_remaining_quantity() {
    let (url, server) = serve_once("200 OK", r#"{"status": "ok", "quantity": 9}"#);
    let client = DeviceClient::new(&url).unwrap();

    let response = client.feed().await.unwrap();

    assert_eq!(response.quantity, Some(9));
    assert_eq!(server.join().unwrap().path, "/api/feed");
}

#[tokio::test]
async fn adjust_duty_sends_increment() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status": "ok", "duty_cycle": 82, "pulse_duration": 400}"#,
    );
    let client = DeviceClient::new(&url).unwrap();

    let update = client.adjust_duty(-5).await.unwrap();

    assert_eq!(update.calibration.duty_cycle, 82);
    let request = server.join().unwrap();
    assert_eq!(request.path, "/api/calibration/adjust_duty");
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body, json!({"increment": -5}));
}

#[tokio::test]
async fn save_calibration_sends_both_values() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"status": "ok", "duty_cycle": 77, "pulse_duration": 450}"#,
    );
    let client = DeviceClient::new(&url).unwrap();

    client
        .save_calibration(Calibration {
            duty_cycle: 77,
            pulse_duration: 450,
        })
        .await
        .unwrap();

    let request = server.join().unwrap();
    assert_eq!(request.path, "/api/calibration/save");
    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body, json!({"duty_cycle": 77, "pulse_duration": 450}));
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (url, server) = serve_once(
        "500 Internal Server Error",
        r#"{"status": "error", "message": "Failed to dispense food"}"#,
    );
    let client = DeviceClient::new(&url).unwrap();

    let err = client.feed().await.unwrap_err();

    match err {
        DeviceError::Status {
            status,
            endpoint,
            body,
        } => {
            assert_eq!(status, 500);
            assert_eq!(endpoint, "/api/feed");
            assert!(body.contains("Failed to dispense food"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
    server.join().unwrap();
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let (url, server) = serve_once("200 OK", "not json");
    let client = DeviceClient::new(&url).unwrap();

    let err = client.calibration().await.unwrap_err();

    assert!(matches!(err, DeviceError::Decode { .. }));
    server.join().unwrap();
}

#[tokio::test]
async fn zero_quantity_is_rejected_locally() {
    let client = DeviceClient::new("http://127.0.0.1:9").unwrap();
    let err = client.set_quantity(0).await.unwrap_err();
    assert!(matches!(err, DeviceError::InvalidRequest(_)));
}

#[tokio::test]
async fn unreachable_device_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = DeviceClient::new(&format!("http://{}", addr)).unwrap();

    let err = client.status().await.unwrap_err();

    assert!(matches!(err, DeviceError::Transport { .. }));
}

//! Integration tests for HttpBomSource against a canned local HTTP server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bomviz::application::services::{BomService, RoutingService};
use bomviz::domain::Complexity;
use bomviz::infrastructure::http::HttpBomSource;
use bomviz::infrastructure::traits::{BomSource, FetchError};

/// Serves one canned response per connection and records request lines.
struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(status: &'static str, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf);
                if let Some(line) = request.lines().next() {
                    seen.lock().unwrap().push(line.to_string());
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn complexity(s: &str) -> Complexity {
    Complexity::parse(s).unwrap()
}

#[tokio::test]
async fn given_200_when_fetching_tree_then_returns_body_from_bom_path() {
    let server = CannedServer::start(
        "200 OK",
        r#"{"item_no":"A0001","cost":12,"level":0,"children":[]}"#,
    )
    .await;
    let source = HttpBomSource::new(&server.base_url, Some(Duration::from_secs(5))).unwrap();

    let tree = BomService::new(Arc::new(source))
        .fetch_tree(&complexity("simple"))
        .await
        .expect("fetch tree");

    assert_eq!(tree.item_no, "A0001");
    assert_eq!(server.requests(), vec!["GET /api/bom/simple/ HTTP/1.1"]);
}

#[tokio::test]
async fn given_404_with_error_body_when_fetching_then_status_error_with_server_message() {
    let server = CannedServer::start(
        "404 Not Found",
        r#"{"error": "No top-level assemblies found with complexity 'exotic'"}"#,
    )
    .await;
    let source = HttpBomSource::new(&server.base_url, None).unwrap();

    let err = source.fetch_tree(&complexity("exotic")).await.unwrap_err();

    match err {
        FetchError::Status {
            status, message, ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "No top-level assemblies found with complexity 'exotic'");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_reserved_chars_when_fetching_then_request_path_is_percent_encoded() {
    let server = CannedServer::start("404 Not Found", "").await;
    let source = HttpBomSource::new(&server.base_url, None).unwrap();

    let err = source.fetch_tree(&complexity("a b/c?d")).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { ref message, .. } if message == "empty response"));
    assert_eq!(server.requests(), vec!["GET /api/bom/a%20b%2Fc%3Fd/ HTTP/1.1"]);
}

#[tokio::test]
async fn given_routing_report_when_fetching_then_uses_routing_path() {
    let server = CannedServer::start(
        "200 OK",
        r#"{"work_centers":[{"wc_no":"WC01","name":"Assembly"}],
            "routing_data":{"item_no":"A0001","description":"Frame","item_type":"A","level":0,
                            "work_centers":{"WC01":30},"total_time":30,"children":[]}}"#,
    )
    .await;
    let source = HttpBomSource::new(&server.base_url, None).unwrap();

    let report = RoutingService::new(Arc::new(source))
        .fetch(&complexity("part"))
        .await
        .unwrap();

    assert_eq!(report.routing_data.total_time, 30);
    assert_eq!(server.requests(), vec!["GET /api/bom-routing/part/ HTTP/1.1"]);
}

#[tokio::test]
async fn given_closed_port_when_fetching_then_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source = HttpBomSource::new(&format!("http://{}", addr), Some(Duration::from_secs(2))).unwrap();
    let err = source.fetch_tree(&complexity("simple")).await.unwrap_err();

    assert!(matches!(err, FetchError::Network { .. }));
}

#[tokio::test]
async fn given_silent_server_when_timeout_elapses_then_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept and hold connections without answering
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let source =
        HttpBomSource::new(&format!("http://{}", addr), Some(Duration::from_millis(200))).unwrap();
    let err = source.fetch_tree(&complexity("simple")).await.unwrap_err();

    match err {
        FetchError::Network { source, .. } => assert!(source.is_timeout()),
        other => panic!("expected network error, got {other:?}"),
    }
}

mod common;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sim_client::{ClientConfig, ClientError, SimulationClient};
use sim_proto::{SimulationEvent, SimulationRequest};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Reads one request (headers plus a `Content-Length` body) and returns it.
async fn read_request(socket: &mut TcpStream) -> anyhow::Result<String> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    let header_end = loop {
        let read = socket.read(&mut buf).await?;
        anyhow::ensure!(read > 0, "client closed before sending headers");
        raw.extend_from_slice(&buf[..read]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let headers = String::from_utf8_lossy(&raw[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|value| value.trim().parse::<usize>())
        .transpose()?
        .unwrap_or(0);
    while raw.len() < header_end + length {
        let read = socket.read(&mut buf).await?;
        anyhow::ensure!(read > 0, "client closed mid-body");
        raw.extend_from_slice(&buf[..read]);
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

/// How the fake backend answers one connection.
#[derive(Clone)]
enum Reply {
    /// Streamed body written in pieces, closed at the end.
    Stream(Vec<String>),
    Fixed { status: u16, body: String },
}

struct FakeBackend {
    addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<String>,
    connections: Arc<AtomicUsize>,
}

impl FakeBackend {
    async fn start(reply: Reply) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, requests) = mpsc::unbounded_channel();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = connections.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let reply = reply.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Ok(request) = read_request(&mut socket).await {
                        let _ = tx.send(request);
                        let _ = answer(&mut socket, reply).await;
                    }
                });
            }
        });
        Ok(Self {
            addr,
            requests,
            connections,
        })
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::default().with_base_url(format!("http://{}", self.addr))
    }
}

async fn answer(socket: &mut TcpStream, reply: Reply) -> std::io::Result<()> {
    match reply {
        Reply::Stream(parts) => {
            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n",
                )
                .await?;
            for part in parts {
                socket.write_all(part.as_bytes()).await?;
                socket.flush().await?;
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
        Reply::Fixed { status, body } => {
            let head = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await?;
            socket.write_all(body.as_bytes()).await?;
        }
    }
    socket.shutdown().await
}

fn request() -> SimulationRequest {
    SimulationRequest {
        prompt: "Add a tram line".into(),
        selected_zones: vec!["Harbor".into()],
        ..SimulationRequest::default()
    }
}

#[tokio::test]
async fn simulate_streams_frames_split_across_writes() -> anyhow::Result<()> {
    let event = common::event_frame("e1", "Harbor", 0.5, 0.5, "{}");
    let (head, tail) = event.split_at(event.len() / 2);
    let mut backend = FakeBackend::start(Reply::Stream(vec![
        common::update_frame("Analyzing", 1),
        head.to_string(),
        format!("{tail}{}", common::complete_frame("done")),
    ]))
    .await?;
    let client = SimulationClient::new(Arc::new(backend.config()))?;

    let mut chunks = client.simulate(&request()).await?;
    let mut kinds = Vec::new();
    while let Some(chunk) = chunks.next_chunk().await {
        let chunk = chunk?;
        if let sim_proto::StreamChunk::Event(event) = &chunk {
            assert!((2..=5).contains(&event.comments.len()), "reactions attached");
        }
        kinds.push(chunk.kind());
    }
    assert_eq!(kinds, vec!["update", "event", "complete"]);

    let sent = backend.requests.recv().await.expect("request recorded");
    assert!(sent.starts_with("POST /api/simulate "), "{sent}");
    assert!(sent.contains("\"prompt\":\"Add a tram line\""), "{sent}");
    assert!(sent.contains("\"selectedZones\":[\"Harbor\"]"), "{sent}");
    Ok(())
}

#[tokio::test]
async fn error_status_fails_before_any_chunk() -> anyhow::Result<()> {
    let backend = FakeBackend::start(Reply::Fixed {
        status: 500,
        body: "{\"error\":\"boom\"}".into(),
    })
    .await?;
    let client = SimulationClient::new(Arc::new(backend.config()))?;

    match client.simulate(&request()).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("a 500 must not produce a stream"),
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let config = ClientConfig::default().with_base_url(format!("http://{addr}"));
    let client = SimulationClient::new(Arc::new(config))?;
    let err = client
        .simulate(&request())
        .await
        .err()
        .expect("connection refused");
    assert!(err.is_transport());
    Ok(())
}

#[tokio::test]
async fn zone_directory_is_fetched_once() -> anyhow::Result<()> {
    let backend = FakeBackend::start(Reply::Fixed {
        status: 200,
        body: common::ZONES_GEOJSON.to_string(),
    })
    .await?;
    let config = ClientConfig {
        zones_url: Some(format!("http://{}/zones.geojson", backend.addr)),
        ..backend.config()
    };
    let client = SimulationClient::new(Arc::new(config))?;

    let first = client.zone_directory().await?;
    let second = client.zone_directory().await?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 3);
    assert_eq!(backend.connections.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn reactions_round_trip_through_messages_endpoint() -> anyhow::Result<()> {
    let mut backend = FakeBackend::start(Reply::Fixed {
        status: 200,
        body: r#"[{"name":"Dana","message":"Finally!"},{"name":"Lee","message":"Too loud."}]"#
            .into(),
    })
    .await?;
    let client = SimulationClient::new(Arc::new(backend.config()))?;
    let event: SimulationEvent = serde_json::from_value(serde_json::json!({
        "id": "e1",
        "zoneName": "Harbor",
        "type": "transportation",
        "title": "Tram opens",
        "positivity": 0.6,
        "coordinates": [0.5, 0.5]
    }))?;

    let replies = client.fetch_reactions(&event).await?;
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].name, "Dana");

    let sent = backend.requests.recv().await.expect("request recorded");
    assert!(sent.starts_with("POST /api/messages "), "{sent}");
    assert!(sent.contains("\"title\":\"Tram opens\""), "{sent}");
    assert!(sent.contains("\"zone\":\"Harbor\""), "{sent}");
    Ok(())
}

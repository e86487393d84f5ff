//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use sse_relay::config::{ExtraConfig, HostConfig, HANDLER_NAME};
use sse_relay::http::HttpServer;
use sse_relay::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Request lines seen by a mock backend, e.g. `GET /events-stream/x HTTP/1.1`.
pub type SeenRequests = Arc<Mutex<Vec<String>>>;

/// Activation mapping pointing the relay at `backend_host`.
pub fn extra_config(backend_host: &str) -> ExtraConfig {
    let mut extra = ExtraConfig::new();
    extra.insert(
        HANDLER_NAME.to_string(),
        json!({
            "endpoint": "/sse/{id}",
            "backend_url_pattern": "/events-stream/{id}",
            "backend_host": backend_host,
        }),
    );
    extra
}

/// Start the relay host in front of `backend`.
pub async fn start_relay(backend: SocketAddr) -> (SocketAddr, Shutdown) {
    let mut config = HostConfig::default();
    config.extra_config = extra_config(&format!("http://{}", backend));
    start_host(config).await
}

/// Start the relay host with an arbitrary config on an ephemeral port.
pub async fn start_host(config: HostConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, shutdown.token()).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start a backend that writes `chunks` one by one, sleeping `delay` after
/// each, then closes the connection.
pub async fn start_sse_backend(chunks: Vec<String>, delay: Duration) -> (SocketAddr, SeenRequests) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = SeenRequests::default();
    let seen_by_backend = seen.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let chunks = chunks.clone();
            let seen = seen_by_backend.clone();
            tokio::spawn(async move {
                let request_line = read_request_head(&mut socket).await;
                seen.lock().unwrap().push(request_line);

                if write_stream_head(&mut socket).await.is_err() {
                    return;
                }
                for chunk in chunks {
                    if socket.write_all(chunk.as_bytes()).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(delay).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}

/// Start a backend that emits an event every `interval` forever and reports
/// on the returned channel once a write fails (the relay hung up).
pub async fn start_endless_backend(interval: Duration) -> (SocketAddr, mpsc::UnboundedReceiver<u64>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                if write_stream_head(&mut socket).await.is_err() {
                    return;
                }
                let mut sent = 0u64;
                loop {
                    let event = format!("data: tick {}\n\n", sent);
                    if socket.write_all(event.as_bytes()).await.is_err() {
                        let _ = tx.send(sent);
                        return;
                    }
                    sent += 1;
                    tokio::time::sleep(interval).await;
                }
            });
        }
    });

    (addr, rx)
}

/// Start a backend that answers every request with `status` and `body`.
pub async fn start_status_backend(status: &'static str, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                if write_head(&mut socket, status).await.is_ok() {
                    let _ = socket.write_all(body.as_bytes()).await;
                }
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a backend that accepts connections and reads the request but never
/// answers. Each accepted request line is reported on the channel.
pub async fn start_silent_backend() -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let request_line = read_request_head(&mut socket).await;
                let _ = tx.send(request_line);
                // Hold the socket open until the peer goes away.
                let mut buf = [0u8; 64];
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });

    (addr, rx)
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

async fn write_stream_head(socket: &mut TcpStream) -> std::io::Result<()> {
    write_head(socket, "200 OK").await
}

async fn write_head(socket: &mut TcpStream, status: &str) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n"
    );
    socket.write_all(head.as_bytes()).await
}

//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use image_proxy::config::ProxyConfig;
use image_proxy::{HttpServer, Shutdown};

/// What the mock origin answers with.
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub location: Option<String>,
    pub body: Vec<u8>,
    pub delay: Duration,
}

impl MockResponse {
    pub fn image(content_type: &'static str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type),
            location: None,
            body: body.to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: Some("text/html"),
            location: None,
            body: b"<html>error</html>".to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            content_type: None,
            location: Some(location.to_string()),
            body: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Handle onto a running mock origin.
#[derive(Clone)]
pub struct MockOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    targets: Arc<Mutex<Vec<String>>>,
}

impl MockOrigin {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `METHOD target` of every request received, in order.
    pub fn requests(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

/// Start a mock origin that answers every request the same way.
pub async fn start_mock_origin(response: MockResponse) -> MockOrigin {
    start_routed_origin(move |_| response.clone()).await
}

/// Start a programmable mock origin on an ephemeral port. `route` picks the
/// response from the request target.
pub async fn start_routed_origin<F>(route: F) -> MockOrigin
where
    F: Fn(&str) -> MockResponse + Send + Sync + 'static,
{
    let route = Arc::new(route);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = MockOrigin {
        addr: listener.local_addr().unwrap(),
        hits: Arc::new(AtomicUsize::new(0)),
        targets: Arc::new(Mutex::new(Vec::new())),
    };

    let handle = origin.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handle = handle.clone();
                    let route = route.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let mut read = 0;
                        while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf[read..]).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => read += n,
                            }
                        }
                        let head = String::from_utf8_lossy(&buf[..read]);
                        let request_line = head.lines().next().unwrap_or_default();
                        let mut parts = request_line.split_whitespace();
                        let method = parts.next().unwrap_or_default();
                        let target = parts.next().unwrap_or_default();
                        handle.targets.lock().unwrap().push(format!("{method} {target}"));
                        handle.hits.fetch_add(1, Ordering::SeqCst);
                        let response = route(target);

                        tokio::time::sleep(response.delay).await;

                        let mut head = format!(
                            "HTTP/1.1 {} {}\r\nConnection: close\r\n",
                            response.status,
                            reason(response.status),
                        );
                        if response.status != 204 {
                            head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
                        }
                        if let Some(content_type) = response.content_type {
                            head.push_str(&format!("Content-Type: {content_type}\r\n"));
                        }
                        if let Some(location) = &response.location {
                            head.push_str(&format!("Location: {location}\r\n"));
                        }
                        head.push_str("\r\n");

                        let _ = socket.write_all(head.as_bytes()).await;
                        if method != "HEAD" && response.status != 204 {
                            let _ = socket.write_all(&response.body).await;
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    origin
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        307 => "Temporary Redirect",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config pointing at `origin` with short upstream timeouts.
pub fn config_for(origin: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.origin = origin.into();
    config.upstream.connect_timeout_secs = 1;
    config.upstream.request_timeout_secs = 1;
    config
}

/// A proxy running on an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestProxy {
        addr,
        shutdown,
        handle,
    }
}

/// reqwest client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

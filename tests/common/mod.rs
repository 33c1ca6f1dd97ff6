//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use photo_gateway::config::GatewayConfig;
use photo_gateway::{HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// A running gateway bound to an ephemeral port.
pub struct Gateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub root: TempDir,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `worker`, with storage under `root` and short deadlines.
pub fn test_config(root: &Path, worker: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.worker.host = worker.ip().to_string();
    config.worker.port = worker.port();
    config.worker.connect_timeout_ms = 500;
    config.worker.read_timeout_ms = 1_000;
    config.storage.upload_dir = root.join("uploads");
    config.storage.output_dir = root.join("uploads_output");
    config.limits.request_secs = 5;
    config
}

/// Start a gateway talking to `worker` with default test settings.
pub async fn start_gateway(worker: SocketAddr) -> Gateway {
    start_gateway_with(worker, |_| {}).await
}

/// Start a gateway after letting the caller adjust its config.
pub async fn start_gateway_with<F>(worker: SocketAddr, adjust: F) -> Gateway
where
    F: FnOnce(&mut GatewayConfig),
{
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path(), worker);
    adjust(&mut config);

    let server = HttpServer::new(config).unwrap();
    let upload_dir = std::fs::canonicalize(&server.config().storage.upload_dir).unwrap();
    let output_dir = std::fs::canonicalize(&server.config().storage.output_dir).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    Gateway {
        addr,
        shutdown,
        upload_dir,
        output_dir,
        root,
    }
}

/// A scripted worker that records every command line it receives.
pub struct MockWorker {
    pub addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
}

impl MockWorker {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Start a worker that answers every command with `reply` and closes.
pub async fn start_worker(reply: Vec<u8>) -> MockWorker {
    start_programmable_worker(move |_| {
        let reply = reply.clone();
        async move { reply }
    })
    .await
}

/// Start a worker whose reply is computed from the received command line.
pub async fn start_programmable_worker<F, Fut>(f: F) -> MockWorker
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<u8>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let connections = Arc::new(AtomicUsize::new(0));
    let f = Arc::new(f);

    let seen = commands.clone();
    let count = connections.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    count.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        // The gateway half-closes after sending, so EOF ends the command.
                        let mut raw = Vec::new();
                        if socket.read_to_end(&mut raw).await.is_err() {
                            return;
                        }
                        let line = String::from_utf8_lossy(&raw).into_owned();
                        seen.lock().unwrap().push(line.clone());

                        let reply = f(line).await;
                        let _ = socket.write_all(&reply).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockWorker {
        addr,
        commands,
        connections,
    }
}

/// Start a worker that accepts connections and never answers.
pub async fn start_silent_worker() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });
    addr
}

/// Start a worker that drops every connection without reading or replying.
pub async fn start_closing_worker() -> MockWorker {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let count = connections.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });
    MockWorker {
        addr,
        commands: Arc::new(Mutex::new(Vec::new())),
        connections,
    }
}

/// A worker whose accept queue is full, so connection attempts hang.
pub struct SaturatedWorker {
    pub addr: SocketAddr,
    _listener: TcpListener,
    _held: Vec<TcpStream>,
}

pub async fn start_saturated_worker() -> SaturatedWorker {
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    for _ in 0..32 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => held.push(stream),
            Ok(Err(e)) => panic!("filler connect failed: {e}"),
            Err(_) => {
                return SaturatedWorker {
                    addr,
                    _listener: listener,
                    _held: held,
                }
            }
        }
    }
    panic!("accept queue never filled");
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Post a multipart upload; `mode: None` omits the `type` field.
pub async fn upload(
    client: &reqwest::Client,
    gateway: &Gateway,
    photo: &[u8],
    mode: Option<&str>,
) -> reqwest::Response {
    let mut form = reqwest::multipart::Form::new().part(
        "photo",
        reqwest::multipart::Part::bytes(photo.to_vec()).file_name("photo.jpg"),
    );
    if let Some(mode) = mode {
        form = form.text("type", mode.to_string());
    }
    client
        .post(gateway.url("/send_photo"))
        .multipart(form)
        .send()
        .await
        .expect("gateway unreachable")
}

/// Split a command line into its three fields.
pub fn split_command(line: &str) -> (String, String, String) {
    let parts: Vec<_> = line.splitn(3, ',').collect();
    assert_eq!(parts.len(), 3, "malformed command line {line:?}");
    (parts[0].into(), parts[1].into(), parts[2].into())
}

//! Single-shot TCP exchange with the image worker.
//!
//! # Responsibilities
//! - Open a fresh connection per job (no pooling, no keep-alive)
//! - Send the command line only once the connection is established
//! - Accumulate the response until the worker closes its end
//! - Bound connect and send/receive with deadlines
//!
//! # State Machine
//! ```text
//! Idle → Connecting → Sent → Receiving → Closed
//!            │          │         │
//!            └──────────┴─────────┴────→ Failed
//! ```

use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::WorkerConfig;
use crate::resilience::Deadline;
use crate::worker::protocol::Command;
use crate::worker::BridgeError;

/// Where a single exchange currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Idle,
    Connecting,
    Sent,
    Receiving,
    Closed,
    Failed,
}

impl BridgeState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: BridgeState) -> bool {
        use BridgeState::*;
        match (self, next) {
            (Idle, Connecting) | (Connecting, Sent) | (Sent, Receiving) | (Receiving, Closed) => {
                true
            }
            (Connecting | Sent | Receiving, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BridgeState::Closed | BridgeState::Failed)
    }
}

/// Bookkeeping for one exchange; never reused.
#[derive(Debug)]
struct Exchange<'a> {
    worker: &'a str,
    state: BridgeState,
}

impl<'a> Exchange<'a> {
    fn new(worker: &'a str) -> Self {
        Self {
            worker,
            state: BridgeState::Idle,
        }
    }

    fn advance(&mut self, next: BridgeState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal bridge transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(worker = %self.worker, from = ?self.state, to = ?next, "Bridge transition");
        self.state = next;
    }

    fn fail(&mut self, error: BridgeError) -> BridgeError {
        tracing::debug!(worker = %self.worker, state = ?self.state, error = %error, "Worker exchange failed");
        self.advance(BridgeState::Failed);
        error
    }
}

/// Talks to the worker configured at construction.
#[derive(Debug, Clone)]
pub struct WorkerBridge {
    config: WorkerConfig,
}

impl WorkerBridge {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// `host:port` of the worker.
    pub fn address(&self) -> String {
        self.config.address()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.config.connect_timeout()
    }

    pub fn read_timeout(&self) -> Duration {
        self.config.read_timeout()
    }

    /// Run one request/response exchange and return the raw response bytes.
    ///
    /// An empty buffer is returned as-is, also when the worker drops the
    /// connection without sending anything. Deciding that it is an error is
    /// the translator's job. A reset after some bytes arrived is `Reset`.
    pub async fn exchange(&self, command: &Command) -> Result<Vec<u8>, BridgeError> {
        let addr = self.config.address();
        let mut exchange = Exchange::new(&addr);

        exchange.advance(BridgeState::Connecting);
        let connect = Deadline::after(self.config.connect_timeout());
        let mut stream = match connect.run(TcpStream::connect(addr.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(exchange.fail(BridgeError::Unavailable {
                    addr: addr.clone(),
                    source,
                }))
            }
            Err(elapsed) => {
                return Err(exchange.fail(BridgeError::ConnectTimeout {
                    addr: addr.clone(),
                    after: elapsed.budget,
                }))
            }
        };
        // Small single write; don't let Nagle hold it back.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(worker = %addr, error = %e, "Could not disable Nagle on worker socket");
        }

        let deadline = Deadline::after(self.config.read_timeout());
        let line = command.encode();
        let sent = deadline
            .run(async {
                stream.write_all(&line).await?;
                stream.flush().await?;
                // Half-close so workers that read to EOF see the end of the line.
                stream.shutdown().await
            })
            .await;
        match sent {
            Ok(Ok(())) => {}
            // The worker may close before reading the line; whatever it
            // managed to send back is still decided by the receive phase.
            Ok(Err(e)) if is_peer_gone(&e) => {
                tracing::debug!(worker = %addr, error = %e, "Worker closed before the command was sent");
            }
            Ok(Err(e)) => return Err(exchange.fail(BridgeError::Reset(e))),
            Err(elapsed) => {
                return Err(exchange.fail(BridgeError::Timeout {
                    after: elapsed.budget,
                }))
            }
        }
        exchange.advance(BridgeState::Sent);
        tracing::debug!(worker = %addr, bytes = line.len(), "Command sent to worker");

        exchange.advance(BridgeState::Receiving);
        let limit = self.config.max_response_bytes;
        let mut response = Vec::new();
        let received = deadline
            .run(async {
                let mut capped = (&mut stream).take(limit as u64 + 1);
                capped.read_to_end(&mut response).await
            })
            .await;
        match received {
            Ok(Ok(_)) if response.len() > limit => {
                return Err(exchange.fail(BridgeError::ResponseTooLarge { limit }))
            }
            Ok(Ok(_)) => {}
            // A worker that closes without reading the line resets the
            // connection; with nothing received that is an empty reply.
            Ok(Err(e)) if response.is_empty() && is_peer_gone(&e) => {
                tracing::debug!(worker = %addr, error = %e, "Worker reset the connection without replying");
            }
            Ok(Err(e)) => return Err(exchange.fail(BridgeError::Reset(e))),
            Err(elapsed) => {
                return Err(exchange.fail(BridgeError::Timeout {
                    after: elapsed.budget,
                }))
            }
        }

        exchange.advance(BridgeState::Closed);
        tracing::debug!(worker = %addr, bytes = response.len(), "Worker closed connection");
        Ok(response)
    }
}

fn is_peer_gone(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    fn command() -> Command {
        Command::new(Path::new("/in/abc"), Path::new("/out/abc.png"), "grayscale").unwrap()
    }

    fn bridge_for(port: u16) -> WorkerBridge {
        WorkerBridge::new(WorkerConfig {
            host: "127.0.0.1".into(),
            port,
            connect_timeout_ms: 500,
            read_timeout_ms: 500,
            max_response_bytes: 16,
        })
    }

    /// Accept one connection, record what was sent, reply with `reply`.
    async fn one_shot_worker(reply: Vec<u8>) -> (u16, Arc<Mutex<Vec<u8>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            *sink.lock().await = buf;
            socket.write_all(&reply).await.unwrap();
        });
        (port, seen)
    }

    #[test]
    fn state_transitions() {
        use BridgeState::*;
        assert!(Idle.can_advance_to(Connecting));
        assert!(Connecting.can_advance_to(Sent));
        assert!(Receiving.can_advance_to(Closed));
        assert!(Sent.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(Sent));
        assert!(!Closed.can_advance_to(Idle));
        assert!(!Failed.can_advance_to(Idle));
        assert!(Closed.is_terminal() && Failed.is_terminal());
        assert!(!Receiving.is_terminal());
    }

    #[tokio::test]
    async fn sends_line_and_reads_until_close() {
        let (port, seen) = one_shot_worker(vec![1, 0]).await;

        let raw = bridge_for(port).exchange(&command()).await.unwrap();
        assert_eq!(raw, vec![1, 0]);
        assert_eq!(&*seen.lock().await, b"/in/abc,/out/abc.png,grayscale");
    }

    #[tokio::test]
    async fn accumulates_multiple_segments() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            socket.write_all(&[5]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            socket.write_all(b"tail").await.unwrap();
        });

        let raw = bridge_for(port).exchange(&command()).await.unwrap();
        assert_eq!(raw, b"\x05tail".to_vec());
    }

    #[tokio::test]
    async fn empty_close_yields_empty_buffer() {
        let (port, _) = one_shot_worker(Vec::new()).await;
        let raw = bridge_for(port).exchange(&command()).await.unwrap();
        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = bridge_for(port).exchange(&command()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Unavailable { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn silent_worker_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let started = std::time::Instant::now();
        let err = bridge_for(port).exchange(&command()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Timeout { .. }), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn worker_closing_without_reading_is_an_empty_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        let bridge = bridge_for(port);
        for _ in 0..20 {
            let raw = bridge.exchange(&command()).await.unwrap();
            assert!(raw.is_empty());
            assert!(matches!(
                crate::worker::translate(&raw),
                Err(BridgeError::EmptyResponse)
            ));
        }
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn reset_after_partial_reply_is_reset() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            socket.read_to_end(&mut buf).await.unwrap();
            socket.write_all(&[1]).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            // Zero linger turns the close into an RST.
            socket.set_linger(Some(Duration::ZERO)).unwrap();
            drop(socket);
        });

        let err = bridge_for(port).exchange(&command()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Reset(_)), "got {err:?}");
    }

    /// A listener whose accept queue is full, so new SYNs go unanswered.
    async fn saturated_listener() -> (TcpListener, u16, Vec<TcpStream>) {
        let socket = tokio::net::TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(1).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut held = Vec::new();
        for _ in 0..32 {
            match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => held.push(stream),
                Ok(Err(e)) => panic!("filler connect failed: {e}"),
                Err(_) => return (listener, addr.port(), held),
            }
        }
        panic!("accept queue never filled");
    }

    #[tokio::test]
    async fn unanswered_connect_times_out() {
        let (_listener, port, _held) = saturated_listener().await;
        let bridge = WorkerBridge::new(WorkerConfig {
            connect_timeout_ms: 300,
            ..bridge_for(port).config
        });

        let started = std::time::Instant::now();
        let err = bridge.exchange(&command()).await.unwrap_err();
        assert!(matches!(err, BridgeError::ConnectTimeout { .. }), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn oversized_response_is_rejected() {
        let (port, _) = one_shot_worker(vec![1; 64]).await;
        let err = bridge_for(port).exchange(&command()).await.unwrap_err();
        assert!(matches!(err, BridgeError::ResponseTooLarge { limit: 16 }));
    }
}

//! Stand-in image worker for manual end-to-end runs.
//!
//! Speaks the worker protocol: reads `input,output,mode`, "processes" the
//! image by copying input to output, replies `[status, 0]` and closes.
//! Status is 1 when the copy succeeded and 0 otherwise.
//!
//! ```text
//! cargo run --example mock_worker -- 127.0.0.1:9000
//! ```

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// The reference worker reads one segment of at most this many bytes.
const MAX_COMMAND: usize = 4069;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:9000".to_string())
        .parse()?;

    let listener = TcpListener::bind(addr).await?;
    println!("Mock worker listening on {}", addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        tokio::spawn(async move {
            if let Err(e) = handle(socket).await {
                eprintln!("{peer}: {e}");
            }
        });
    }
}

async fn handle(mut socket: TcpStream) -> std::io::Result<()> {
    let mut buf = vec![0u8; MAX_COMMAND];
    let n = socket.read(&mut buf).await?;
    let line = String::from_utf8_lossy(&buf[..n]);
    println!("Read: {line}");

    let status = match line.split(',').collect::<Vec<_>>().as_slice() {
        [input, output, mode] => match tokio::fs::copy(input, output).await {
            Ok(_) => {
                println!("mode {mode:?}: {input} -> {output}");
                1
            }
            Err(e) => {
                eprintln!("Could not read image: {input} ({e})");
                0
            }
        },
        _ => 0,
    };

    socket.write_all(&[status, 0]).await?;
    socket.shutdown().await
}

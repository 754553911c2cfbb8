#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::time;
use tokio_tungstenite::tungstenite;

use fifo_bridge::channel::{self, ChannelReader};
use fifo_bridge::config::Config;
use fifo_bridge::AppState;

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A running bridge: real TCP listener, real fifo, real reader thread.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    pub fifo_path: PathBuf,
    // Keeps the fifo's directory alive for the duration of the test.
    _dir: TempDir,
}

/// Start a bridge on an ephemeral port with a fifo in a fresh temp directory.
pub async fn start_server(relay_client_messages: bool) -> TestServer {
    let dir = tempfile::tempdir().expect("tempdir");
    let fifo_path = dir.path().join("bridge.in");

    let config = Config {
        port: 0,
        fifo_path: fifo_path.clone(),
        fifo_retry: Duration::from_millis(50),
        relay_client_messages,
    };
    let state = AppState::new(config);

    channel::provision(&fifo_path).expect("provision fifo");
    ChannelReader::new(fifo_path.clone(), state.config.fifo_retry, state.engine.clone())
        .spawn()
        .expect("spawn reader");

    let app = fifo_bridge::routes::router().with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        addr,
        state,
        fifo_path,
        _dir: dir,
    }
}

/// Open a WebSocket connection to the bridge.
pub async fn connect(addr: SocketAddr) -> WsStream {
    let url = format!("ws://{addr}/");
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws_stream
}

/// Read the next text frame, failing the test after 5 seconds.
pub async fn next_text(ws: &mut WsStream) -> String {
    let msg = time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timeout waiting for message")
        .expect("stream ended")
        .expect("ws read error");

    match msg {
        tungstenite::Message::Text(text) => text.as_str().to_owned(),
        other => panic!("expected text frame, got {other:?}"),
    }
}

/// Assert that nothing arrives on `ws` for a short while.
pub async fn assert_silent(ws: &mut WsStream) {
    if let Ok(msg) = time::timeout(Duration::from_millis(300), ws.next()).await {
        panic!("expected silence, got {msg:?}");
    }
}

/// Poll the registry until it holds exactly `expected` clients.
pub async fn wait_for_clients(state: &AppState, expected: usize) {
    time::timeout(Duration::from_secs(5), async {
        while state.engine.registry().len() != expected {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!(
            "expected {expected} clients, registry has {}",
            state.engine.registry().len()
        )
    });
}

/// Act as one writer session: open the fifo, write `lines`, close it.
pub async fn write_fifo(path: &Path, lines: &[&str]) {
    let path = path.to_path_buf();
    let payload: String = lines.iter().map(|line| format!("{line}\n")).collect();

    let write = tokio::task::spawn_blocking(move || {
        let mut fifo = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .expect("open fifo for writing");
        fifo.write_all(payload.as_bytes()).expect("write fifo");
    });

    time::timeout(Duration::from_secs(5), write)
        .await
        .expect("timeout writing fifo")
        .expect("writer task panicked");
}

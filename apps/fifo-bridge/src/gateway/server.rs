//! WebSocket upgrade handler and per-connection loops.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::AppState;

use super::client::{ClientHandle, ClientId};
use super::events::truncate_for_log;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (ws_tx, mut ws_rx) = socket.split();
    let engine = state.engine.clone();
    let registry = engine.registry();

    let (handle, outbound) = ClientHandle::channel();
    let client_id = registry.next_id();

    // The writer must be draining before the join announcement goes out so
    // the newcomer receives it as well.
    let writer = tokio::spawn(write_outbound(client_id, ws_tx, outbound));

    registry.register(client_id, handle.clone());
    tracing::info!(client_id, clients = registry.len(), "client connected");
    engine.announce_join();

    loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => {
                tracing::info!(client_id, message = %truncate_for_log(text.as_str()), "client said");
                if state.config.relay_client_messages {
                    engine.relay_client(client_id, text.as_str());
                }
            }
            Some(Ok(Message::Binary(data))) => {
                tracing::debug!(client_id, len = data.len(), "ignoring binary frame");
            }
            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(e)) => {
                tracing::debug!(?e, client_id, "ws read error");
                break;
            }
        }
    }

    registry.unregister_handle(client_id, &handle);
    // Dropping the last handle closes the queue; the writer flushes what is
    // left and then answers with a close frame.
    drop(handle);
    if let Err(e) = writer.await {
        tracing::debug!(?e, client_id, "writer task failed");
    }

    tracing::info!(client_id, clients = registry.len(), "client disconnected");
}

/// Drain a client's queue into its socket until either side goes away.
///
/// Returning drops the queue receiver, after which deliveries to this client
/// fail and the broadcast engine unregisters it. Once the queue is closed the
/// socket is closed with a close frame.
async fn write_outbound(
    client_id: ClientId,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<Arc<str>>,
) {
    while let Some(text) = outbound.recv().await {
        if let Err(e) = ws_tx.send(Message::Text(text.as_ref().into())).await {
            tracing::debug!(?e, client_id, "ws write error");
            return;
        }
    }

    if let Err(e) = ws_tx.close().await {
        tracing::debug!(?e, client_id, "ws close error");
    }
}

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

use crate::dispatch::{handle_message, warn_unparseable};
use crate::handlers::NodeHandlers;
use crate::message::{Envelope, MessageKind};
use crate::peer::{PeerHandle, PeerSet};

/// Drives one peer connection end to end: spawns the writer task, sends the
/// initial `version`, then loops reading frames until the socket closes.
/// Used for both accepted and outbound connections — the protocol is
/// symmetric once the transport is established.
pub async fn run_connection<S>(
    ws: WebSocketStream<S>,
    address: String,
    node_id: String,
    chain_height: u64,
    handlers: Arc<dyn NodeHandlers>,
    peers: Arc<PeerSet>,
    now: impl Fn() -> f64 + Send + Sync + 'static,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    let writer_address = address.clone();
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(msg).await.is_err() {
                warn!(peer = %writer_address, "failed to write to peer, closing");
                break;
            }
        }
    });

    let handle = Arc::new(PeerHandle::new(address.clone(), tx, now()));
    peers.insert(handle.clone());

    handle.send(&Envelope::new(
        MessageKind::Version,
        json!({
            "version": crate::PROTOCOL_VERSION,
            "node_id": node_id,
            "chain_height": chain_height,
            "services": ["full_node", "mining"],
        }),
        node_id.clone(),
        now(),
    ));

    info!(peer = %address, "peer connection established");

    while let Some(frame) = read.next().await {
        let frame = match frame {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        match Envelope::parse(&frame) {
            Some(envelope) => {
                handle_message(envelope, &handle, &node_id, handlers.as_ref(), &peers, now()).await
            }
            None => warn_unparseable(&frame, &address),
        }
    }

    peers.remove(&address);
    info!(peer = %address, "peer connection closed");
}

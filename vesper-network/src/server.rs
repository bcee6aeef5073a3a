use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::handlers::NodeHandlers;
use crate::peer::PeerSet;
use crate::transport::run_connection;

/// Accepts inbound peer connections on `host:port` until the process exits.
/// `chain_height`/`now` are closures rather than snapshots so every new
/// connection sees current state.
pub async fn run_server(
    host: String,
    port: u16,
    node_id: String,
    handlers: Arc<dyn NodeHandlers>,
    peers: Arc<PeerSet>,
    chain_height: impl Fn() -> u64 + Send + Sync + Clone + 'static,
    now: impl Fn() -> f64 + Send + Sync + Clone + 'static,
) -> Result<()> {
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding P2P listener on {host}:{port}"))?;
    info!(%host, %port, "P2P listener bound");

    loop {
        let (stream, remote) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                error!(?err, "accept failed");
                continue;
            }
        };
        let address = remote.to_string();
        let node_id = node_id.clone();
        let handlers = handlers.clone();
        let peers = peers.clone();
        let chain_height = chain_height.clone();
        let now = now.clone();

        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws) => {
                    run_connection(ws, address, node_id, chain_height(), handlers, peers, now)
                        .await
                }
                Err(err) => error!(?err, %address, "websocket handshake failed"),
            }
        });
    }
}

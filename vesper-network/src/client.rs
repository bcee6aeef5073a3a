use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::handlers::NodeHandlers;
use crate::peer::PeerSet;
use crate::transport::run_connection;

/// Dials a known peer address (`host:port`) and runs the connection until
/// it closes. Failures are logged and swallowed — the peer-discovery loop
/// is expected to retry on its own schedule, not this call.
pub async fn connect_to_peer(
    address: String,
    node_id: String,
    handlers: Arc<dyn NodeHandlers>,
    peers: Arc<PeerSet>,
    chain_height: u64,
    now: impl Fn() -> f64 + Send + Sync + 'static,
) -> Result<()> {
    let uri = format!("ws://{address}");
    let (ws, _response) = tokio_tungstenite::connect_async(&uri)
        .await
        .with_context(|| format!("connecting to peer {address}"))?;
    run_connection(ws, address, node_id, chain_height, handlers, peers, now).await;
    Ok(())
}

pub async fn connect_and_log_failure(
    address: String,
    node_id: String,
    handlers: Arc<dyn NodeHandlers>,
    peers: Arc<PeerSet>,
    chain_height: u64,
    now: impl Fn() -> f64 + Send + Sync + 'static,
) {
    if let Err(err) = connect_to_peer(address.clone(), node_id, handlers, peers, chain_height, now).await
    {
        warn!(%address, ?err, "failed to connect to peer");
    }
}

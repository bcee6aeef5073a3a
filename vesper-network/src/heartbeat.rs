use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use crate::message::{Envelope, MessageKind};
use crate::peer::PeerSet;

pub const HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const PEER_DEAD_TIMEOUT_SECS: f64 = 120.0;
pub const DISCOVERY_INTERVAL_SECS: u64 = 30;

/// Every 30 s, pings each live peer and drops any with no contact in the
/// last 120 s.
pub async fn run_heartbeat(peers: Arc<PeerSet>, node_id: String, now: impl Fn() -> f64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    loop {
        ticker.tick().await;
        let t = now();
        for peer in peers.all() {
            if peer.is_alive() {
                peer.send(&Envelope::new(
                    MessageKind::Ping,
                    json!({"nonce": t}),
                    node_id.clone(),
                    t,
                ));
            }
        }
        peers.prune_dead(t, PEER_DEAD_TIMEOUT_SECS);
        debug!(live = peers.all().len(), "heartbeat tick");
    }
}

/// Every 30 s, asks each live peer for its peer list.
pub async fn run_discovery(peers: Arc<PeerSet>, node_id: String, now: impl Fn() -> f64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(DISCOVERY_INTERVAL_SECS));
    loop {
        ticker.tick().await;
        let t = now();
        for peer in peers.all() {
            if peer.is_alive() {
                peer.send(&Envelope::new(MessageKind::GetPeers, json!({}), node_id.clone(), t));
            }
        }
    }
}

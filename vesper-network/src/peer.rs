use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::message::Envelope;

/// Peers are marked dead, never pruned by the heartbeat's own hand — the
/// transport task that owns the socket is what actually removes the entry
/// from the `PeerSet` once its write side closes.
pub struct PeerHandle {
    pub address: String,
    pub version: RwLock<Option<String>>,
    pub last_seen: RwLock<f64>,
    pub alive: AtomicBool,
    outbox: mpsc::UnboundedSender<WsMessage>,
}

impl PeerHandle {
    pub fn new(address: String, outbox: mpsc::UnboundedSender<WsMessage>, now: f64) -> Self {
        Self {
            address,
            version: RwLock::new(None),
            last_seen: RwLock::new(now),
            alive: AtomicBool::new(true),
            outbox,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    pub fn touch(&self, now: f64) {
        *self.last_seen.write() = now;
    }

    /// Queues `envelope` for delivery. A send failure marks the peer dead
    /// rather than retrying.
    pub fn send(&self, envelope: &Envelope) {
        if self.outbox.send(WsMessage::Text(envelope.to_frame())).is_err() {
            self.alive.store(false, Ordering::Relaxed);
        }
    }
}

/// All connected peers, keyed by remote address. Owned by the transport
/// layer; consensus and chain-store code never reach into this directly.
#[derive(Default)]
pub struct PeerSet {
    peers: RwLock<HashMap<String, Arc<PeerHandle>>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: Arc<PeerHandle>) {
        self.peers.write().insert(handle.address.clone(), handle);
    }

    pub fn remove(&self, address: &str) {
        self.peers.write().remove(address);
    }

    pub fn get(&self, address: &str) -> Option<Arc<PeerHandle>> {
        self.peers.read().get(address).cloned()
    }

    pub fn all(&self) -> Vec<Arc<PeerHandle>> {
        self.peers.read().values().cloned().collect()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.peers.read().keys().cloned().collect()
    }

    /// Sends `envelope` to every live peer except `exclude`.
    pub fn broadcast_excluding(&self, envelope: &Envelope, exclude: &str) {
        for peer in self.all() {
            if peer.address != exclude && peer.is_alive() {
                peer.send(envelope);
            }
        }
    }

    /// Drops peers with no contact for longer than `timeout_secs`.
    pub fn prune_dead(&self, now: f64, timeout_secs: f64) {
        let dead: Vec<String> = self
            .all()
            .into_iter()
            .filter(|p| !p.is_alive() || now - *p.last_seen.read() > timeout_secs)
            .map(|p| p.address.clone())
            .collect();
        for addr in dead {
            self.remove(&addr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(addr: &str) -> Arc<PeerHandle> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(PeerHandle::new(addr.to_string(), tx, 0.0))
    }

    #[test]
    fn prune_dead_removes_stale_peers() {
        let set = PeerSet::new();
        let p = handle("a");
        p.touch(0.0);
        set.insert(p);
        set.prune_dead(200.0, 120.0);
        assert!(set.get("a").is_none());
    }

    #[test]
    fn prune_dead_keeps_recently_seen_peers() {
        let set = PeerSet::new();
        let p = handle("a");
        p.touch(100.0);
        set.insert(p);
        set.prune_dead(150.0, 120.0);
        assert!(set.get("a").is_some());
    }
}

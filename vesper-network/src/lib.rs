//! Gossip protocol: sixteen JSON message kinds over a persistent WebSocket
//! transport, handshake, flood broadcast, and periodic peer maintenance.

pub mod client;
pub mod dispatch;
pub mod handlers;
pub mod heartbeat;
pub mod message;
pub mod peer;
pub mod server;
pub mod transport;

pub const PROTOCOL_VERSION: &str = "1.0.0";

pub use client::connect_and_log_failure;
pub use handlers::{NodeHandlers, ValidatorInfo};
pub use heartbeat::{run_discovery, run_heartbeat, DISCOVERY_INTERVAL_SECS, PEER_DEAD_TIMEOUT_SECS};
pub use message::{Envelope, MessageKind};
pub use peer::{PeerHandle, PeerSet};
pub use server::run_server;

/// First 16 hex chars of `sha256("host:port")`, the node's gossip identity.
pub fn node_id(host: &str, port: u16) -> String {
    vesper_core::short_id(&format!("{host}:{port}"), 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_sixteen_hex_chars() {
        let id = node_id("0.0.0.0", 8333);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

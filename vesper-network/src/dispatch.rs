use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::handlers::{NodeHandlers, ValidatorInfo};
use crate::message::{Envelope, MessageKind};
use crate::peer::{PeerHandle, PeerSet};

pub const MAX_BLOCK_RANGE: u64 = 100;
pub const MAX_PEERS_SHARED: usize = 50;
pub const MAX_MEMPOOL_SHARED: usize = 100;

/// Applies the handshake and all sixteen message kinds. `now` is the
/// caller's wall-clock reading, threaded through rather than read here so
/// tests can drive deterministic timestamps.
pub async fn handle_message(
    envelope: Envelope,
    peer: &Arc<PeerHandle>,
    node_id: &str,
    handlers: &dyn NodeHandlers,
    peers: &PeerSet,
    now: f64,
) {
    peer.touch(now);
    match envelope.kind {
        MessageKind::Version => {
            let version = envelope
                .data
                .get("version")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            *peer.version.write() = version;
            peer.send(&Envelope::new(
                MessageKind::Verack,
                json!({"accepted": true}),
                node_id,
                now,
            ));
            peer.send(&Envelope::new(
                MessageKind::GetChain,
                json!({}),
                node_id,
                now,
            ));
        }
        MessageKind::Verack => {
            if envelope.data.get("accepted").and_then(|v| v.as_bool()) == Some(true) {
                peer.send(&Envelope::new(
                    MessageKind::GetValidators,
                    json!({}),
                    node_id,
                    now,
                ));
            }
        }
        MessageKind::Ping => {
            let nonce = envelope.data.get("nonce").cloned().unwrap_or(json!(null));
            peer.send(&Envelope::new(
                MessageKind::Pong,
                json!({"nonce": nonce}),
                node_id,
                now,
            ));
        }
        MessageKind::Pong => {
            peer.touch(now);
        }
        MessageKind::GetPeers => {
            let addrs: Vec<String> = peers
                .addresses()
                .into_iter()
                .filter(|a| a != &peer.address)
                .take(MAX_PEERS_SHARED)
                .collect();
            peer.send(&Envelope::new(
                MessageKind::Peers,
                json!({"peers": addrs}),
                node_id,
                now,
            ));
        }
        MessageKind::Peers => {
            // Connecting to newly learned peers is the orchestrator's job;
            // this crate only surfaces what it was told.
            if let Some(list) = envelope.data.get("peers").and_then(|v| v.as_array()) {
                debug!(count = list.len(), "received peer list");
            }
        }
        MessageKind::GetBlocks => {
            let start = envelope
                .data
                .get("start_index")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            let count = envelope
                .data
                .get("count")
                .and_then(|v| v.as_u64())
                .unwrap_or(10)
                .min(MAX_BLOCK_RANGE);
            let blocks = handlers.blocks_range(start, count);
            peer.send(&Envelope::new(
                MessageKind::Blocks,
                json!({"blocks": blocks}),
                node_id,
                now,
            ));
        }
        MessageKind::Blocks => {
            if let Some(list) = envelope.data.get("blocks").cloned() {
                if let Ok(blocks) = serde_json::from_value::<Vec<vesper_core::Block>>(list) {
                    for block in blocks {
                        handlers.receive_block(block);
                    }
                }
            }
        }
        MessageKind::NewBlock => {
            if let Some(data) = envelope.data.get("block").cloned() {
                if let Ok(block) = serde_json::from_value::<vesper_core::Block>(data) {
                    if handlers.receive_block(block.clone()) {
                        let rebroadcast = Envelope::new(
                            MessageKind::NewBlock,
                            json!({"block": block}),
                            node_id,
                            now,
                        );
                        peers.broadcast_excluding(&rebroadcast, &peer.address);
                    }
                }
            }
        }
        MessageKind::NewTransaction => {
            if let Some(data) = envelope.data.get("transaction").cloned() {
                if let Ok(tx) = serde_json::from_value::<vesper_core::Transaction>(data) {
                    if handlers.receive_transaction(tx.clone()) {
                        let rebroadcast = Envelope::new(
                            MessageKind::NewTransaction,
                            json!({"transaction": tx}),
                            node_id,
                            now,
                        );
                        peers.broadcast_excluding(&rebroadcast, &peer.address);
                    }
                }
            }
        }
        MessageKind::GetChain => {
            let chain = handlers.chain_snapshot();
            peer.send(&Envelope::new(
                MessageKind::Chain,
                json!({"chain": chain}),
                node_id,
                now,
            ));
        }
        MessageKind::Chain => {
            if let Some(data) = envelope.data.get("chain").cloned() {
                if let Ok(chain) = serde_json::from_value::<Vec<vesper_core::Block>>(data) {
                    handlers.receive_chain(chain);
                }
            }
        }
        MessageKind::GetMempool => {
            let transactions = handlers.mempool_snapshot(MAX_MEMPOOL_SHARED);
            peer.send(&Envelope::new(
                MessageKind::Mempool,
                json!({"transactions": transactions}),
                node_id,
                now,
            ));
        }
        MessageKind::Mempool => {
            if let Some(data) = envelope.data.get("transactions").cloned() {
                if let Ok(txs) = serde_json::from_value::<Vec<vesper_core::Transaction>>(data) {
                    for tx in txs {
                        handlers.receive_transaction(tx);
                    }
                }
            }
        }
        MessageKind::RegisterValidator => {
            let address = envelope
                .data
                .get("validator")
                .and_then(|v| v.get("address"))
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let stake = envelope
                .data
                .get("validator")
                .and_then(|v| v.get("stake"))
                .and_then(|v| v.as_f64());
            if let (Some(address), Some(stake)) = (address, stake) {
                if handlers.register_validator(address, stake) {
                    peers.broadcast_excluding(&envelope, &peer.address);
                }
            }
        }
        MessageKind::ValidatorList => {
            if let Some(data) = envelope.data.get("validators").cloned() {
                if let Ok(list) = serde_json::from_value::<Vec<ValidatorInfo>>(data) {
                    for info in list {
                        handlers.register_validator_if_absent(info);
                    }
                }
            }
        }
        MessageKind::GetValidators => {
            let validators = handlers.validators_snapshot();
            peer.send(&Envelope::new(
                MessageKind::ValidatorList,
                json!({"validators": validators}),
                node_id,
                now,
            ));
        }
    }
}

pub fn warn_unparseable(raw: &str, peer_address: &str) {
    warn!(peer = peer_address, frame = raw, "dropping unparseable frame");
}

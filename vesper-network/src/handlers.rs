use serde::{Deserialize, Serialize};
use vesper_core::{Block, Transaction};

/// Validator summary carried over the wire by `validator_list`/`get_validators`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub address: String,
    pub stake: f64,
    pub reputation: f64,
    pub blocks_validated: u64,
}

/// What the gossip dispatcher needs from the rest of the node. Implemented
/// by the orchestrator so this crate never owns the chain store, mempool,
/// or validator registry itself.
pub trait NodeHandlers: Send + Sync {
    fn chain_height(&self) -> u64;
    fn chain_snapshot(&self) -> Vec<Block>;
    fn blocks_range(&self, start: u64, count: u64) -> Vec<Block>;
    /// Attempts to adopt `chain` wholesale. Returns whether it was adopted.
    fn receive_chain(&self, chain: Vec<Block>) -> bool;
    /// Attempts to append `block` to the local chain. Returns whether it
    /// was newly accepted (false if rejected or already present).
    fn receive_block(&self, block: Block) -> bool;
    fn mempool_snapshot(&self, count: usize) -> Vec<Transaction>;
    /// Admits `tx` to the local mempool. Returns whether it was newly added.
    fn receive_transaction(&self, tx: Transaction) -> bool;
    fn validators_snapshot(&self) -> Vec<ValidatorInfo>;
    /// Local registration path: adds stake if the address already exists.
    fn register_validator(&self, address: String, stake: f64) -> bool;
    /// Sync path: registers only if the address is not already known.
    fn register_validator_if_absent(&self, info: ValidatorInfo);
}

use std::sync::Arc;

use parking_lot::RwLock;
use vesper_consensus::{Validator, ValidatorRegistry};
use vesper_core::{validate_admission, now_ts, Block, ChainStore, Transaction};
use vesper_mempool::Mempool;
use vesper_network::{NodeHandlers, PeerSet, ValidatorInfo};

/// The central context resolving the cyclic-ownership problem: the chain
/// store, mempool, validator registry, and peer set are siblings here,
/// each behind its own lock, rather than any one owning another. Every
/// cross-cutting operation (admit a transaction, seal a block, gossip a
/// reply) is a method on this type, never reached-into state.
pub struct NodeContext {
    pub node_id: String,
    pub chain: RwLock<ChainStore>,
    pub mempool: RwLock<Mempool>,
    pub validators: RwLock<ValidatorRegistry>,
    pub peers: Arc<PeerSet>,
}

impl NodeContext {
    pub fn new(node_id: String, chain: ChainStore, mempool: Mempool) -> Arc<Self> {
        Arc::new(Self {
            node_id,
            chain: RwLock::new(chain),
            mempool: RwLock::new(mempool),
            validators: RwLock::new(ValidatorRegistry::new()),
            peers: Arc::new(PeerSet::new()),
        })
    }

    /// Shared admission path for transactions arriving from the API or the
    /// gossip layer: type-independent rule check, then mempool insertion.
    pub fn admit_transaction(&self, tx: Transaction) -> bool {
        if validate_admission(&tx, now_ts()).is_err() {
            return false;
        }
        self.mempool.write().add(tx).is_ok()
    }
}

impl NodeHandlers for NodeContext {
    fn chain_height(&self) -> u64 {
        self.chain.read().len()
    }

    fn chain_snapshot(&self) -> Vec<Block> {
        self.chain.read().blocks().to_vec()
    }

    fn blocks_range(&self, start: u64, count: u64) -> Vec<Block> {
        let chain = self.chain.read();
        let end = (start + count).min(chain.len());
        (start..end)
            .filter_map(|i| chain.block_at(i).cloned())
            .collect()
    }

    fn receive_chain(&self, chain: Vec<Block>) -> bool {
        self.chain.write().replace_chain(chain)
    }

    fn receive_block(&self, block: Block) -> bool {
        match self.chain.write().append_block(block) {
            Ok(included) => {
                self.mempool.write().evict(&included);
                true
            }
            Err(_) => false,
        }
    }

    fn mempool_snapshot(&self, count: usize) -> Vec<Transaction> {
        self.mempool.read().take(count)
    }

    fn receive_transaction(&self, tx: Transaction) -> bool {
        self.admit_transaction(tx)
    }

    fn validators_snapshot(&self) -> Vec<ValidatorInfo> {
        self.validators
            .read()
            .active_validators()
            .map(|v| ValidatorInfo {
                address: v.address.clone(),
                stake: v.stake,
                reputation: v.reputation,
                blocks_validated: v.blocks_validated,
            })
            .collect()
    }

    fn register_validator(&self, address: String, stake: f64) -> bool {
        self.validators.write().register(&address, stake)
    }

    fn register_validator_if_absent(&self, info: ValidatorInfo) {
        self.validators.write().register_if_absent(Validator {
            address: info.address,
            stake: info.stake,
            reputation: info.reputation,
            blocks_validated: info.blocks_validated,
            last_validation_time: 0.0,
            is_active: true,
        });
    }
}

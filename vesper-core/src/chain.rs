use serde_json::Map;
use tracing::debug;

use crate::block::{merkle_root, Block};
use crate::error::CoreError;
use crate::transaction::{validate_admission, Transaction, TxType};

/// Leading hex zeros required of a freshly-appended block's `block_hash`.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Maximum number of transactions pulled into a single block.
pub const MAX_BLOCK_TRANSACTIONS: usize = 100;

/// An append-only sequence of sealed blocks, bootstrapped with a synthetic
/// genesis block. `difficulty` is mutable (retargeted by the consensus
/// engine) and read by every subsequent `append_block`/`validate_chain`
/// call — a retarget therefore changes how past blocks are judged by
/// `validate_chain`. That is a preserved hazard, not a bug.
#[derive(Debug, Clone)]
pub struct ChainStore {
    blocks: Vec<Block>,
    pub difficulty: u32,
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }
}

impl ChainStore {
    pub fn new(difficulty: u32) -> Self {
        let genesis = mine_genesis(difficulty);
        Self {
            blocks: vec![genesis],
            difficulty,
        }
    }

    pub fn len(&self) -> u64 {
        self.blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always has a genesis block")
    }

    pub fn block_at(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Builds an unsealed block skeleton from up to the first 100 mempool
    /// entries. The caller (consensus engine) fills `validator`, weights,
    /// grinds `nonce`, and computes `block_hash`.
    pub fn create_block(&self, producer: &str, mempool_txs: &[Transaction]) -> Option<Block> {
        if mempool_txs.is_empty() {
            return None;
        }
        let transactions: Vec<Transaction> = mempool_txs
            .iter()
            .take(MAX_BLOCK_TRANSACTIONS)
            .cloned()
            .collect();
        let root = merkle_root(&transactions);
        Some(Block {
            index: self.len(),
            timestamp: 0.0,
            transactions,
            previous_hash: self.tip().block_hash.clone(),
            nonce: 0,
            difficulty: self.difficulty,
            merkle_root: root,
            validator: Some(producer.to_string()),
            stake_weight: 0.7,
            work_weight: 0.3,
            block_hash: String::new(),
        })
    }

    /// Appends a fully sealed block. Does not recompute/compare `block_hash`
    /// against a fresh hash of the header — only the difficulty predicate on
    /// the hash the block already carries is checked here; `validate_chain`
    /// is the only place that recomputes hashes over the whole chain.
    pub fn append_block(&mut self, block: Block) -> Result<Vec<String>, CoreError> {
        let expected_index = self.len();
        if block.index != expected_index {
            return Err(CoreError::WrongIndex {
                expected: expected_index,
                found: block.index,
            });
        }
        if block.previous_hash != self.tip().block_hash {
            return Err(CoreError::BrokenLink);
        }
        if merkle_root(&block.transactions) != block.merkle_root {
            return Err(CoreError::MerkleMismatch);
        }
        if !block.meets_difficulty(self.difficulty) {
            return Err(CoreError::InsufficientDifficulty);
        }
        let now = crate::now_ts();
        for tx in &block.transactions {
            validate_admission(tx, now)
                .map_err(|e| CoreError::InvalidTransaction(e.to_string()))?;
        }
        let included: Vec<String> = block.transactions.iter().map(|tx| tx.tx_hash.clone()).collect();
        debug!(index = block.index, tx_count = included.len(), "appended block");
        self.blocks.push(block);
        Ok(included)
    }

    /// Walks the whole chain re-checking link, recomputed hash, and the
    /// difficulty predicate against the *current* difficulty — including
    /// for blocks sealed under an earlier difficulty.
    pub fn validate_chain(&self) -> bool {
        for i in 1..self.blocks.len() {
            let block = &self.blocks[i];
            let previous = &self.blocks[i - 1];
            if block.previous_hash != previous.block_hash {
                return false;
            }
            if merkle_root(&block.transactions) != block.merkle_root {
                return false;
            }
            if block.compute_hash() != block.block_hash {
                return false;
            }
            if !block.meets_difficulty(self.difficulty) {
                return false;
            }
        }
        true
    }

    /// Full-history scan: subtracts outgoing, adds incoming. Fees are not
    /// deducted here.
    pub fn balance_of(&self, address: &str) -> f64 {
        let mut balance = 0.0;
        for block in &self.blocks {
            for tx in &block.transactions {
                if tx.sender == address {
                    balance -= tx.amount;
                }
                if tx.recipient == address {
                    balance += tx.amount;
                }
            }
        }
        balance
    }

    /// Replaces the local chain wholesale if `candidate` is strictly longer
    /// and passes link+hash validation. Does not check difficulty nor
    /// transaction admissibility against the candidate chain — only that
    /// its internal links and hashes are consistent. This is a known
    /// attack surface, preserved deliberately.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        if candidate.len() <= self.blocks.len() {
            return false;
        }
        if candidate.first().map(|b| b.index) != Some(0) {
            return false;
        }
        for i in 1..candidate.len() {
            if candidate[i].previous_hash != candidate[i - 1].block_hash {
                return false;
            }
            if merkle_root(&candidate[i].transactions) != candidate[i].merkle_root {
                return false;
            }
            if candidate[i].compute_hash() != candidate[i].block_hash {
                return false;
            }
        }
        let new_len = candidate.len();
        self.blocks = candidate;
        debug!(new_len, "adopted longer chain from peer");
        true
    }
}

fn mine_genesis(difficulty: u32) -> Block {
    let genesis_tx = Transaction::new(TxType::Standard, "genesis", "genesis", 0.0, 0.0, Map::new(), None);
    let root = merkle_root(std::slice::from_ref(&genesis_tx));
    let mut block = Block {
        index: 0,
        timestamp: 0.0,
        transactions: vec![genesis_tx],
        previous_hash: "0".to_string(),
        nonce: 0,
        difficulty,
        merkle_root: root,
        validator: None,
        stake_weight: 0.0,
        work_weight: 0.0,
        block_hash: String::new(),
    };
    loop {
        block.block_hash = block.compute_hash();
        if block.meets_difficulty(difficulty) {
            return block;
        }
        block.nonce += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_tx(sender: &str, recipient: &str, amount: f64, fee: f64) -> Transaction {
        let mut meta = Map::new();
        meta.insert("fee".into(), serde_json::Value::from(fee));
        Transaction::new(TxType::Standard, sender, recipient, amount, 0.0, meta, None)
    }

    fn seal(mut block: Block, difficulty: u32) -> Block {
        loop {
            block.block_hash = block.compute_hash();
            if block.meets_difficulty(difficulty) {
                return block;
            }
            block.nonce += 1;
        }
    }

    #[test]
    fn genesis_has_synthetic_transaction_and_zero_previous_hash() {
        let chain = ChainStore::default();
        assert_eq!(chain.len(), 1);
        let genesis = chain.tip();
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.transactions.len(), 1);
        assert_eq!(genesis.transactions[0].sender, "genesis");
        assert!(genesis.meets_difficulty(DEFAULT_DIFFICULTY));
    }

    #[test]
    fn single_transfer_updates_balances_and_clears_mempool() {
        let mut chain = ChainStore::new(1);
        let tx = standard_tx("alice", "bob", 10.0, 0.001);
        let skeleton = chain.create_block("v", &[tx]).unwrap();
        let sealed = seal(skeleton, chain.difficulty);
        let included = chain.append_block(sealed).unwrap();
        assert_eq!(included.len(), 1);
        assert_eq!(chain.balance_of("alice"), -10.0);
        assert_eq!(chain.balance_of("bob"), 10.0);
    }

    #[test]
    fn append_rejects_wrong_index() {
        let mut chain = ChainStore::new(1);
        let tx = standard_tx("alice", "bob", 1.0, 0.0);
        let mut skeleton = chain.create_block("v", &[tx]).unwrap();
        skeleton.index = 5;
        let sealed = seal(skeleton, chain.difficulty);
        assert_eq!(
            chain.append_block(sealed),
            Err(CoreError::WrongIndex { expected: 1, found: 5 })
        );
    }

    #[test]
    fn append_rejects_broken_link() {
        let mut chain = ChainStore::new(1);
        let tx = standard_tx("alice", "bob", 1.0, 0.0);
        let mut skeleton = chain.create_block("v", &[tx]).unwrap();
        skeleton.previous_hash = "deadbeef".to_string();
        let sealed = seal(skeleton, chain.difficulty);
        assert_eq!(chain.append_block(sealed), Err(CoreError::BrokenLink));
    }

    #[test]
    fn validate_chain_uses_current_difficulty_retroactively() {
        let mut chain = ChainStore::new(1);
        let tx = standard_tx("alice", "bob", 1.0, 0.0);
        let skeleton = chain.create_block("v", &[tx]).unwrap();
        let sealed = seal(skeleton, 1);
        chain.append_block(sealed).unwrap();
        assert!(chain.validate_chain());
        chain.difficulty = 64;
        assert!(!chain.validate_chain());
    }

    #[test]
    fn replace_chain_requires_strictly_longer_and_linked() {
        let mut chain = ChainStore::new(1);
        let short = chain.blocks().to_vec();
        assert!(!chain.replace_chain(short));

        let mut candidate = chain.blocks().to_vec();
        let tx = standard_tx("a", "b", 1.0, 0.0);
        let skeleton = chain.create_block("v", &[tx]).unwrap();
        let sealed = seal(skeleton, chain.difficulty);
        candidate.push(sealed);
        assert!(chain.replace_chain(candidate));
        assert_eq!(chain.len(), 2);
    }
}

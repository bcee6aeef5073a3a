use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::hash::sha256_hex;
use crate::transaction::Transaction;

/// A sealed block. `merkle_root` and `block_hash` are derived fields kept in
/// sync by whoever constructs the block (genesis bootstrap, `create_block` +
/// sealing, or deserialization off the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub merkle_root: String,
    pub validator: Option<String>,
    pub stake_weight: f64,
    pub work_weight: f64,
    pub block_hash: String,
}

impl Block {
    /// SHA-256 over the canonical JSON header (transactions are represented
    /// only via `merkle_root`, never hashed directly into the block header).
    pub fn compute_hash(&self) -> String {
        let mut envelope = Map::new();
        envelope.insert("index".to_string(), Value::from(self.index));
        envelope.insert("timestamp".to_string(), number(self.timestamp));
        envelope.insert(
            "merkle_root".to_string(),
            Value::String(self.merkle_root.clone()),
        );
        envelope.insert(
            "previous_hash".to_string(),
            Value::String(self.previous_hash.clone()),
        );
        envelope.insert("nonce".to_string(), Value::from(self.nonce));
        envelope.insert("difficulty".to_string(), Value::from(self.difficulty));
        envelope.insert(
            "validator".to_string(),
            match &self.validator {
                Some(v) => Value::String(v.clone()),
                None => Value::Null,
            },
        );
        envelope.insert("stake_weight".to_string(), number(self.stake_weight));
        envelope.insert("work_weight".to_string(), number(self.work_weight));
        let bytes =
            serde_json::to_vec(&Value::Object(envelope)).expect("canonical json never fails");
        sha256_hex(&bytes)
    }

    /// Count of leading hex zeros in `block_hash`.
    pub fn leading_zero_count(&self) -> u32 {
        self.block_hash.chars().take_while(|&c| c == '0').count() as u32
    }

    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.leading_zero_count() >= difficulty
    }
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Binary Merkle root over transaction hashes, duplicating the last leaf at
/// each level when the count is odd. Empty input hashes to `sha256("")`.
pub fn merkle_root(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return sha256_hex(b"");
    }
    let mut level: Vec<String> = transactions.iter().map(|tx| tx.tx_hash.clone()).collect();
    while level.len() > 1 {
        if level.len() % 2 != 0 {
            let last = level.last().expect("non-empty").clone();
            level.push(last);
        }
        level = level
            .chunks(2)
            .map(|pair| sha256_hex(format!("{}{}", pair[0], pair[1]).as_bytes()))
            .collect();
    }
    level.remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxType;

    fn tx(sender: &str, recipient: &str, amount: f64) -> Transaction {
        Transaction::new(
            TxType::Standard,
            sender,
            recipient,
            amount,
            0.0,
            Map::new(),
            None,
        )
    }

    #[test]
    fn empty_merkle_root_is_sha256_of_empty_string() {
        assert_eq!(merkle_root(&[]), sha256_hex(b""));
    }

    #[test]
    fn single_tx_merkle_root_is_its_hash() {
        let t = tx("a", "b", 1.0);
        assert_eq!(merkle_root(&[t.clone()]), t.tx_hash);
    }

    #[test]
    fn odd_count_duplicates_last_leaf() {
        let t1 = tx("a", "b", 1.0);
        let t2 = tx("b", "c", 2.0);
        let t3 = tx("c", "d", 3.0);
        let three = merkle_root(&[t1.clone(), t2.clone(), t3.clone()]);
        let four = merkle_root(&[t1, t2, t3.clone(), t3]);
        assert_eq!(three, four);
    }

    #[test]
    fn difficulty_predicate_counts_leading_zeros() {
        let mut block = sample_block();
        block.block_hash = "0000ab".to_string();
        assert!(block.meets_difficulty(4));
        assert!(!block.meets_difficulty(5));
    }

    fn sample_block() -> Block {
        Block {
            index: 0,
            timestamp: 0.0,
            transactions: vec![],
            previous_hash: "0".into(),
            nonce: 0,
            difficulty: 4,
            merkle_root: sha256_hex(b""),
            validator: None,
            stake_weight: 0.0,
            work_weight: 0.0,
            block_hash: String::new(),
        }
    }
}

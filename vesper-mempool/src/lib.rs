//! Pending-transaction pool: dedup by `tx_hash`, fee-descending order,
//! capacity bound.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;
use vesper_core::Transaction;

pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MempoolError {
    #[error("mempool is at capacity")]
    AtCapacity,
    #[error("transaction already present")]
    Duplicate,
}

/// Admitted, not-yet-included transactions. `order` holds `tx_hash`es
/// sorted by descending `metadata.fee` (ties broken by insertion order);
/// `by_hash` is the lookup table. The two are kept in lockstep by every
/// mutating method — there is no lazy re-sort.
#[derive(Debug, Default)]
pub struct Mempool {
    by_hash: HashMap<String, Transaction>,
    order: Vec<String>,
    capacity: usize,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            by_hash: HashMap::new(),
            order: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, tx_hash: &str) -> bool {
        self.by_hash.contains_key(tx_hash)
    }

    /// Admits `tx`, re-sorting the pool by descending fee afterward. Fails
    /// if the pool is full or the hash is already present.
    pub fn add(&mut self, tx: Transaction) -> Result<(), MempoolError> {
        if self.order.len() >= self.capacity {
            debug!(capacity = self.capacity, "mempool full, rejecting transaction");
            return Err(MempoolError::AtCapacity);
        }
        if self.by_hash.contains_key(&tx.tx_hash) {
            return Err(MempoolError::Duplicate);
        }
        self.order.push(tx.tx_hash.clone());
        self.by_hash.insert(tx.tx_hash.clone(), tx);
        self.resort();
        Ok(())
    }

    pub fn remove(&mut self, tx_hash: &str) -> Option<Transaction> {
        let tx = self.by_hash.remove(tx_hash)?;
        self.order.retain(|h| h != tx_hash);
        Some(tx)
    }

    /// First `n` entries in fee-descending order, without removing them.
    pub fn take(&self, n: usize) -> Vec<Transaction> {
        self.order
            .iter()
            .take(n)
            .filter_map(|h| self.by_hash.get(h).cloned())
            .collect()
    }

    /// Removes every listed hash, ignoring hashes that are absent.
    pub fn evict(&mut self, tx_hashes: &[String]) {
        for hash in tx_hashes {
            self.remove(hash);
        }
        debug!(count = tx_hashes.len(), remaining = self.len(), "evicted included transactions");
    }

    fn fee_of_in(by_hash: &HashMap<String, Transaction>, tx_hash: &str) -> f64 {
        by_hash
            .get(tx_hash)
            .and_then(|tx| tx.metadata.get("fee"))
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(0.0)
    }

    /// Stable sort by descending fee preserves insertion order among ties.
    fn resort(&mut self) {
        let by_hash = &self.by_hash;
        self.order
            .sort_by(|a, b| Self::fee_of_in(by_hash, b).partial_cmp(&Self::fee_of_in(by_hash, a)).unwrap());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};
    use vesper_core::TxType;

    fn tx_with_fee(sender: &str, fee: f64) -> Transaction {
        let mut meta = Map::new();
        meta.insert("fee".into(), Value::from(fee));
        Transaction::new(TxType::Standard, sender, "bob", 1.0, 0.0, meta, None)
    }

    #[test]
    fn duplicate_tx_hash_rejected() {
        let mut pool = Mempool::new(DEFAULT_CAPACITY);
        let tx = tx_with_fee("alice", 0.01);
        pool.add(tx.clone()).unwrap();
        assert_eq!(pool.add(tx), Err(MempoolError::Duplicate));
    }

    #[test]
    fn capacity_is_enforced() {
        let mut pool = Mempool::new(1);
        pool.add(tx_with_fee("a", 0.0)).unwrap();
        assert_eq!(pool.add(tx_with_fee("b", 0.0)), Err(MempoolError::AtCapacity));
    }

    #[test]
    fn take_orders_by_descending_fee() {
        let mut pool = Mempool::new(DEFAULT_CAPACITY);
        pool.add(tx_with_fee("a", 0.01)).unwrap();
        pool.add(tx_with_fee("b", 0.005)).unwrap();
        pool.add(tx_with_fee("c", 0.02)).unwrap();
        let fees: Vec<f64> = pool
            .take(3)
            .iter()
            .map(|tx| tx.metadata.get("fee").unwrap().as_f64().unwrap())
            .collect();
        assert_eq!(fees, vec![0.02, 0.01, 0.005]);
    }

    #[test]
    fn take_does_not_remove() {
        let mut pool = Mempool::new(DEFAULT_CAPACITY);
        pool.add(tx_with_fee("a", 0.01)).unwrap();
        let _ = pool.take(10);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn evict_removes_listed_hashes_only() {
        let mut pool = Mempool::new(DEFAULT_CAPACITY);
        let tx1 = tx_with_fee("a", 0.01);
        let tx2 = tx_with_fee("b", 0.02);
        pool.add(tx1.clone()).unwrap();
        pool.add(tx2.clone()).unwrap();
        pool.evict(&[tx1.tx_hash.clone()]);
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&tx2.tx_hash));
    }
}

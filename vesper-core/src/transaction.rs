use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::hash::sha256_hex;

/// Metadata is capped at this many bytes once canonically serialized.
pub const MAX_METADATA_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    Standard,
    MultiSig,
    TimeLocked,
    AtomicSwap,
    DataStorage,
    SmartContract,
}

impl TxType {
    /// The lowercase wire name, as it appears in `tx_hash` preimages and JSON.
    pub fn wire_name(&self) -> String {
        match serde_json::to_value(self) {
            Ok(Value::String(s)) => s,
            _ => unreachable!("TxType always serializes to a string"),
        }
    }
}

/// A signed value transfer (or one of its richer variants). `tx_hash` is a
/// pure function of every other field and is recomputed whenever one of them
/// changes via [`Transaction::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_hash: String,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub timestamp: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl Transaction {
    pub fn new(
        tx_type: TxType,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        timestamp: f64,
        metadata: Map<String, Value>,
        signature: Option<String>,
    ) -> Self {
        let mut tx = Self {
            tx_hash: String::new(),
            tx_type,
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp,
            metadata,
            signature,
        };
        tx.tx_hash = tx.compute_hash();
        tx
    }

    /// SHA-256 over the canonical (sorted-key) JSON envelope of this
    /// transaction's non-derived fields. Relies on `serde_json::Map` sorting
    /// keys on insertion, which it does as long as the `preserve_order`
    /// feature is not enabled anywhere in the dependency graph.
    pub fn compute_hash(&self) -> String {
        let mut envelope = Map::new();
        envelope.insert("type".to_string(), Value::String(self.tx_type.wire_name()));
        envelope.insert("sender".to_string(), Value::String(self.sender.clone()));
        envelope.insert(
            "recipient".to_string(),
            Value::String(self.recipient.clone()),
        );
        envelope.insert("amount".to_string(), number(self.amount));
        envelope.insert("timestamp".to_string(), number(self.timestamp));
        envelope.insert("metadata".to_string(), Value::Object(self.metadata.clone()));
        let bytes =
            serde_json::to_vec(&Value::Object(envelope)).expect("canonical json never fails");
        sha256_hex(&bytes)
    }

    /// Size in bytes of `metadata` once canonically serialized.
    pub fn metadata_len(&self) -> usize {
        serde_json::to_vec(&Value::Object(self.metadata.clone()))
            .map(|bytes| bytes.len())
            .unwrap_or(usize::MAX)
    }
}

fn number(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Type-independent admission rules shared by the chain store, the mempool,
/// and the P2P sync paths. Deliberately does not check sender balance, so
/// overdrafts are possible — balances are only ever read, never enforced
/// at admission time.
pub fn validate_admission(tx: &Transaction, now: f64) -> Result<(), CoreError> {
    if tx.amount < 0.0 {
        return Err(CoreError::NegativeAmount);
    }
    if tx.metadata_len() > MAX_METADATA_BYTES {
        return Err(CoreError::MetadataTooLarge);
    }
    if tx.tx_type == TxType::TimeLocked {
        let unlock_time = tx
            .metadata
            .get("unlock_time")
            .and_then(Value::as_f64)
            .ok_or(CoreError::MissingUnlockTime)?;
        if unlock_time <= now {
            return Err(CoreError::TimeLockInPast);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_pure_function_of_envelope() {
        let mut meta = Map::new();
        meta.insert("fee".into(), Value::from(0.01));
        let a = Transaction::new(TxType::Standard, "alice", "bob", 10.0, 100.0, meta.clone(), None);
        let b = Transaction::new(TxType::Standard, "alice", "bob", 10.0, 100.0, meta, None);
        assert_eq!(a.tx_hash, b.tx_hash);
    }

    #[test]
    fn hash_changes_with_metadata() {
        let tx1 = Transaction::new(TxType::Standard, "alice", "bob", 10.0, 100.0, Map::new(), None);
        let mut meta = Map::new();
        meta.insert("fee".into(), Value::from(0.02));
        let tx2 = Transaction::new(TxType::Standard, "alice", "bob", 10.0, 100.0, meta, None);
        assert_ne!(tx1.tx_hash, tx2.tx_hash);
    }

    #[test]
    fn negative_amount_rejected() {
        let tx = Transaction::new(TxType::Standard, "alice", "bob", -1.0, 0.0, Map::new(), None);
        assert!(validate_admission(&tx, 0.0).is_err());
    }

    #[test]
    fn time_locked_requires_future_unlock() {
        let mut meta = Map::new();
        meta.insert("unlock_time".into(), Value::from(3600.0));
        let tx = Transaction::new(TxType::TimeLocked, "alice", "bob", 50.0, 0.0, meta, None);
        assert!(validate_admission(&tx, 0.0).is_ok());

        let mut meta_past = Map::new();
        meta_past.insert("unlock_time".into(), Value::from(-1.0));
        let tx_past = Transaction::new(TxType::TimeLocked, "alice", "bob", 50.0, 0.0, meta_past, None);
        assert!(validate_admission(&tx_past, 0.0).is_err());
    }

    #[test]
    fn metadata_size_limit_enforced() {
        let mut meta = Map::new();
        meta.insert("blob".into(), Value::String("x".repeat(MAX_METADATA_BYTES)));
        let tx = Transaction::new(TxType::Standard, "alice", "bob", 1.0, 0.0, meta, None);
        assert!(validate_admission(&tx, 0.0).is_err());
    }

    #[test]
    fn wire_name_is_snake_case() {
        assert_eq!(TxType::MultiSig.wire_name(), "multi_sig");
        assert_eq!(TxType::AtomicSwap.wire_name(), "atomic_swap");
    }
}

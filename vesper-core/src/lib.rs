pub mod block;
pub mod chain;
pub mod error;
pub mod hash;
pub mod transaction;

pub use block::{merkle_root, Block};
pub use chain::{ChainStore, DEFAULT_DIFFICULTY, MAX_BLOCK_TRANSACTIONS};
pub use error::CoreError;
pub use hash::{sha256_hex, short_id};
pub use transaction::{validate_admission, Transaction, TxType, MAX_METADATA_BYTES};

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock seconds since epoch, matching the floating-point timestamps
/// used throughout hashing and admission checks.
pub fn now_ts() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after the unix epoch")
        .as_secs_f64()
}

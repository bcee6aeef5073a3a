use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("transaction amount is negative")]
    NegativeAmount,
    #[error("transaction metadata exceeds the size limit")]
    MetadataTooLarge,
    #[error("time-locked transaction is missing unlock_time metadata")]
    MissingUnlockTime,
    #[error("time-locked transaction's unlock_time is not in the future")]
    TimeLockInPast,
    #[error("transaction rejected: {0}")]
    InvalidTransaction(String),
    #[error("block index {found} does not follow expected index {expected}")]
    WrongIndex { expected: u64, found: u64 },
    #[error("block previous_hash does not match the tip hash")]
    BrokenLink,
    #[error("block merkle_root does not match its transactions")]
    MerkleMismatch,
    #[error("block hash does not meet the required difficulty")]
    InsufficientDifficulty,
}

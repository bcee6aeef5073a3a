//! Hybrid PoS/PoW consensus: validator registry, deterministic round-robin
//! producer election, relaxed-difficulty PoW seal with a stake/work hybrid
//! score, reward accounting, slashing, and difficulty retargeting.

pub mod registry;
pub mod reward;
pub mod seal;

use tracing::info;

pub use registry::{SlashReason, Validator, ValidatorRegistry, MINIMUM_STAKE};
pub use reward::calculate_rewards;
pub use seal::{seal_block, select_producer, HybridScore, SealError, DEFAULT_SEAL_TIMEOUT};

/// Runs every `DIFFICULTY_ADJUSTMENT_INTERVAL` blocks: compares elapsed wall
/// time for the last window against the expected time and nudges difficulty.
pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 100;
pub const TARGET_BLOCK_TIME_SECS: f64 = 2.0;

/// Adjusts `difficulty` in place if `chain_length` lands on a retarget
/// boundary. `window_start_timestamp`/`tip_timestamp` bound the window.
pub fn adjust_difficulty(
    difficulty: &mut u32,
    chain_length: u64,
    window_start_timestamp: f64,
    tip_timestamp: f64,
) {
    if chain_length == 0 || chain_length % DIFFICULTY_ADJUSTMENT_INTERVAL != 0 {
        return;
    }
    let elapsed = tip_timestamp - window_start_timestamp;
    let expected = DIFFICULTY_ADJUSTMENT_INTERVAL as f64 * TARGET_BLOCK_TIME_SECS;
    if elapsed < expected * 0.5 {
        *difficulty += 1;
        info!(new_difficulty = *difficulty, elapsed, "blocks arriving fast, raising difficulty");
    } else if elapsed > expected * 2.0 {
        *difficulty = (*difficulty - 1).max(1);
        info!(new_difficulty = *difficulty, elapsed, "blocks arriving slow, lowering difficulty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_blocks_increase_difficulty() {
        let mut difficulty = 4;
        adjust_difficulty(&mut difficulty, 100, 0.0, 10.0);
        assert_eq!(difficulty, 5);
    }

    #[test]
    fn slow_blocks_decrease_difficulty_with_floor() {
        let mut difficulty = 1;
        adjust_difficulty(&mut difficulty, 100, 0.0, 10_000.0);
        assert_eq!(difficulty, 1);
    }

    #[test]
    fn off_boundary_height_is_a_no_op() {
        let mut difficulty = 4;
        adjust_difficulty(&mut difficulty, 101, 0.0, 0.001);
        assert_eq!(difficulty, 4);
    }
}

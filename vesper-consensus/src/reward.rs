use std::collections::HashMap;

use vesper_core::Block;

use crate::registry::ValidatorRegistry;

const BASE_REWARD: f64 = 50.0;
const HALVING_INTERVAL: u64 = 210_000;
const PRODUCER_SHARE: f64 = 0.7;
const PARTICIPATION_SHARE: f64 = 0.3;
const PARTICIPATION_WINDOW_SECS: f64 = 300.0;

/// Block reward plus summed transaction fees, split 70% to the producer and
/// 30% evenly among participating validators (active, and last validated
/// within the participation window of this block's timestamp). Not
/// persisted as on-chain state — returned for logging and metrics only.
pub fn calculate_rewards(
    block: &Block,
    registry: &ValidatorRegistry,
    chain_length: u64,
) -> HashMap<String, f64> {
    let mut rewards = HashMap::new();
    let Some(producer) = &block.validator else {
        return rewards;
    };

    let halvings = chain_length / HALVING_INTERVAL;
    let block_reward = BASE_REWARD / 2f64.powi(halvings as i32);
    let fees: f64 = block
        .transactions
        .iter()
        .filter_map(|tx| tx.metadata.get("fee"))
        .filter_map(serde_json::Value::as_f64)
        .sum();
    let total = block_reward + fees;

    rewards.insert(producer.clone(), total * PRODUCER_SHARE);

    let participants: Vec<String> = registry
        .active_validators()
        .filter(|v| (v.last_validation_time - block.timestamp).abs() < PARTICIPATION_WINDOW_SECS)
        .map(|v| v.address.clone())
        .collect();
    if !participants.is_empty() {
        let share = total * PARTICIPATION_SHARE / participants.len() as f64;
        for address in participants {
            *rewards.entry(address).or_insert(0.0) += share;
        }
    }

    rewards
}

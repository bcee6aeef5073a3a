use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use vesper_consensus::{seal_block, select_producer, DEFAULT_SEAL_TIMEOUT};
use vesper_core::now_ts;
use vesper_network::{Envelope, MessageKind, NodeHandlers};

use crate::node_context::NodeContext;

/// Every 2 s, if the mempool is non-empty, checks whether this node is the
/// elected producer for the next height and — only then — assembles,
/// seals, and appends a block, broadcasting it to peers on success. Must
/// never seal for a height it was not elected for; that is what makes the
/// round-robin deterministic across nodes. The PoW grind itself is
/// CPU-bound, so it runs on a blocking worker thread rather than inline
/// on the async task.
pub async fn run_mining_loop(ctx: Arc<NodeContext>, validator_address: String) {
    let mut ticker = tokio::time::interval(Duration::from_secs(2));
    loop {
        ticker.tick().await;

        if ctx.mempool.read().is_empty() {
            continue;
        }

        let height = ctx.chain.read().len();
        let producer = select_producer(&ctx.validators.read(), height);
        let Ok(producer) = producer else {
            continue;
        };
        if producer != validator_address {
            continue;
        }

        let stake = match ctx.validators.read().get(&validator_address) {
            Some(v) => v.stake,
            None => continue,
        };

        let pending = ctx.mempool.read().take(vesper_core::MAX_BLOCK_TRANSACTIONS);
        let skeleton = ctx.chain.read().create_block(&validator_address, &pending);
        let Some(mut skeleton) = skeleton else {
            continue;
        };
        skeleton.timestamp = now_ts();

        let difficulty = ctx.chain.read().difficulty;
        let sealed = tokio::task::spawn_blocking(move || {
            seal_block(skeleton, stake, difficulty, DEFAULT_SEAL_TIMEOUT)
        })
        .await;

        let (block, _score) = match sealed {
            Ok(Ok(pair)) => pair,
            Ok(Err(err)) => {
                warn!(?err, "sealing attempt abandoned");
                continue;
            }
            Err(err) => {
                warn!(?err, "sealing task panicked");
                continue;
            }
        };

        let index = block.index;
        if ctx.receive_block(block.clone()) {
            info!(index, "mined block");
            ctx.validators.write().record_validation(&validator_address, now_ts());
            let rewards = vesper_consensus::calculate_rewards(
                &block,
                &ctx.validators.read(),
                ctx.chain.read().len(),
            );
            info!(?rewards, "block rewards computed");

            {
                let mut chain = ctx.chain.write();
                let length = chain.len();
                let tip_timestamp = chain.tip().timestamp;
                if length >= vesper_consensus::DIFFICULTY_ADJUSTMENT_INTERVAL {
                    let window_start = chain
                        .block_at(length - vesper_consensus::DIFFICULTY_ADJUSTMENT_INTERVAL)
                        .map(|b| b.timestamp)
                        .unwrap_or(tip_timestamp);
                    vesper_consensus::adjust_difficulty(
                        &mut chain.difficulty,
                        length,
                        window_start,
                        tip_timestamp,
                    );
                }
            }

            let envelope = Envelope::new(
                MessageKind::NewBlock,
                serde_json::json!({"block": block}),
                ctx.node_id.clone(),
                now_ts(),
            );
            ctx.peers.broadcast_excluding(&envelope, "");
        }
    }
}

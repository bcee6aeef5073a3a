pub mod config;
pub mod logging;
pub mod mining;
pub mod node_context;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use vesper_core::ChainStore;
use vesper_mempool::Mempool;
use vesper_network::{
    connect_and_log_failure, node_id, run_discovery, run_heartbeat, run_server, Envelope,
    MessageKind,
};

pub use config::NodeConfig;
pub use node_context::NodeContext;

const VALIDATOR_STAKE_ON_START: f64 = 10_000.0;

/// Boots the chain store, mempool, and P2P listener, dials the configured
/// initial peers, and — when configured as a validator — registers and
/// starts the mining loop. Runs until the process is killed.
pub async fn run_node(cfg: NodeConfig) -> Result<()> {
    logging::init();
    info!(host = %cfg.host, port = cfg.port, "starting node");

    let id = node_id(&cfg.host, cfg.port);
    let ctx = NodeContext::new(id.clone(), ChainStore::default(), Mempool::new(vesper_mempool::DEFAULT_CAPACITY));

    let peers = ctx.peers.clone();
    let handlers: Arc<dyn vesper_network::NodeHandlers> = ctx.clone();
    let server_handlers = handlers.clone();
    let server_peers = peers.clone();
    let server_node_id = id.clone();
    let server_host = cfg.host.clone();
    let server_port = cfg.port;
    let server_ctx = ctx.clone();
    tokio::spawn(async move {
        if let Err(err) = run_server(
            server_host,
            server_port,
            server_node_id,
            server_handlers,
            server_peers,
            move || server_ctx.chain.read().len(),
            vesper_core::now_ts,
        )
        .await
        {
            tracing::error!(?err, "P2P server exited");
        }
    });

    for peer in cfg.initial_peers.clone() {
        let handlers = handlers.clone();
        let peers = peers.clone();
        let id = id.clone();
        let height = ctx.chain.read().len();
        tokio::spawn(connect_and_log_failure(peer, id, handlers, peers, height, vesper_core::now_ts));
    }

    tokio::spawn(run_heartbeat(peers.clone(), id.clone(), vesper_core::now_ts));
    tokio::spawn(run_discovery(peers.clone(), id.clone(), vesper_core::now_ts));

    if cfg.mining_enabled {
        if let Some(address) = cfg.validator_address.clone() {
            if ctx.validators.write().register(&address, VALIDATOR_STAKE_ON_START) {
                info!(%address, "registered as validator, starting mining loop");
                let envelope = Envelope::new(
                    MessageKind::RegisterValidator,
                    serde_json::json!({"validator": {"address": address, "stake": VALIDATOR_STAKE_ON_START}}),
                    id.clone(),
                    vesper_core::now_ts(),
                );
                ctx.peers.broadcast_excluding(&envelope, "");
                tokio::spawn(mining::run_mining_loop(ctx.clone(), address));
            } else {
                tracing::warn!(%address, "failed to register as validator");
            }
        } else {
            tracing::warn!("mining_enabled but no validator_address configured");
        }
    }

    std::future::pending::<()>().await;
    Ok(())
}

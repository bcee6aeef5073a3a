use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vesper_node::{run_node, NodeConfig};

#[derive(Parser)]
#[command(name = "vesper", version, about = "hybrid PoS/PoW node CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        #[arg(long, default_value = "config/vesper.toml")]
        config: PathBuf,
    },
    /// Node operations
    Node {
        #[command(subcommand)]
        cmd: NodeCmd,
    },
}

#[derive(Subcommand)]
enum NodeCmd {
    /// Start the node with the given config
    Start {
        #[arg(long, default_value = "config/vesper.toml")]
        config: PathBuf,
    },
    /// Print the node's identity and configured defaults
    Status {
        #[arg(long, default_value = "config/vesper.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init { config } => init_config(&config)?,
        Commands::Node { cmd } => match cmd {
            NodeCmd::Start { config } => {
                let cfg = NodeConfig::load(Some(&config))?;
                let rt = tokio::runtime::Runtime::new()?;
                rt.block_on(run_node(cfg))?;
            }
            NodeCmd::Status { config } => {
                let cfg = NodeConfig::load(Some(&config))?;
                let id = vesper_core::short_id(&format!("{}:{}", cfg.host, cfg.port), 16);
                println!("node_id: {id}");
                println!("listening on: {}:{}", cfg.host, cfg.port);
                println!("mining_enabled: {}", cfg.mining_enabled);
            }
        },
    }
    Ok(())
}

fn init_config(path: &PathBuf) -> Result<()> {
    if path.exists() {
        println!("config already exists at {path:?}");
        return Ok(());
    }
    let cfg = NodeConfig::default();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(&cfg)?)?;
    println!("wrote config to {path:?}");
    Ok(())
}
